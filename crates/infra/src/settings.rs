//! Configuration loading.
//!
//! Sources, lowest precedence first:
//! 1. `EngineConfig::default()`
//! 2. JSON file named by `OPSIGHT_CONFIG` (partial documents allowed)
//! 3. `OPSIGHT_HORIZON_DAYS`, `OPSIGHT_GROWTH_RATE_PCT`, `OPSIGHT_RUN_INTERVAL_SECS`
//!
//! The result is validated: a non-positive horizon or growth rate is an
//! error, not a silent fallback.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use tracing::{info, warn};

use opsight_core::EngineConfig;

use crate::error::InfraError;

pub const CONFIG_PATH_VAR: &str = "OPSIGHT_CONFIG";
pub const HORIZON_DAYS_VAR: &str = "OPSIGHT_HORIZON_DAYS";
pub const GROWTH_RATE_VAR: &str = "OPSIGHT_GROWTH_RATE_PCT";
pub const RUN_INTERVAL_VAR: &str = "OPSIGHT_RUN_INTERVAL_SECS";

const DEFAULT_RUN_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub engine: EngineConfig,
    /// Cadence of the scheduled runner.
    pub run_interval: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            run_interval: DEFAULT_RUN_INTERVAL,
        }
    }
}

impl Settings {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, InfraError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` in place of the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, InfraError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(path) = lookup(CONFIG_PATH_VAR) {
            settings.engine = load_engine_config(Path::new(&path))?;
            info!(path = %path, "loaded engine config file");
        }

        if let Some(days) = parse_override::<u32>(&lookup, HORIZON_DAYS_VAR) {
            settings.engine.forecast.default_horizon_days = days;
        }
        if let Some(rate) = parse_override::<f64>(&lookup, GROWTH_RATE_VAR) {
            settings.engine.capacity.default_growth_rate_pct = rate;
        }
        if let Some(secs) = parse_override::<u64>(&lookup, RUN_INTERVAL_VAR) {
            if secs == 0 {
                warn!(var = RUN_INTERVAL_VAR, "run interval must be > 0; keeping default");
            } else {
                settings.run_interval = Duration::from_secs(secs);
            }
        }

        settings.engine.validate()?;
        Ok(settings)
    }
}

/// Read a (possibly partial) `EngineConfig` JSON document.
pub fn load_engine_config(path: &Path) -> Result<EngineConfig, InfraError> {
    let raw = std::fs::read_to_string(path).map_err(|source| InfraError::Io {
        path: PathBuf::from(path),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| InfraError::Json {
        path: PathBuf::from(path),
        source,
    })
}

fn parse_override<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, var: &str) -> Option<T> {
    let raw = lookup(var)?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(var, value = %raw, "ignoring unparseable override; keeping default");
            None
        }
    }
}
