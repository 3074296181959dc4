use opsight_core::TenantId;

use crate::error::AnalyticsError;

/// A tenant-scoped analytics computation.
///
/// Jobs receive an immutable input snapshot from callers (runners, CLI) and
/// stay storage-agnostic.
pub trait AnalyticsJob: Send + Sync + 'static {
    type Input: Send + Sync + 'static;
    type Output: Send + 'static;

    /// The tenant this job belongs to.
    fn tenant_id(&self) -> TenantId;

    /// The input snapshot the job computes over.
    fn input(&self) -> &Self::Input;

    /// Execute the computation.
    ///
    /// Must be a pure function of `input()`: no clock, no randomness, no IO.
    fn run(&self) -> Result<Self::Output, AnalyticsError>;
}
