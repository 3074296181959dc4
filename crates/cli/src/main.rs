//! `opsight report <metrics.json>` prints the full engine report as JSON.
//! `opsight summary <metrics.json>` prints only the headline summary.
//!
//! Configuration comes from the environment (see `opsight_infra::settings`);
//! `OPSIGHT_TENANT_ID` pins the tenant, otherwise a fresh one is generated.

use std::path::PathBuf;

use anyhow::{Context, bail};

use opsight_core::TenantId;
use opsight_infra::{Settings, generate_report, load_document};

const USAGE: &str = "usage: opsight <report|summary> <metrics.json>";

enum Command {
    Report(PathBuf),
    Summary(PathBuf),
}

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<Command> {
    let (Some(cmd), Some(path)) = (args.next(), args.next()) else {
        bail!(USAGE);
    };
    match cmd.as_str() {
        "report" => Ok(Command::Report(path.into())),
        "summary" => Ok(Command::Summary(path.into())),
        other => bail!("unknown command `{other}`; {USAGE}"),
    }
}

fn tenant_from_env() -> anyhow::Result<TenantId> {
    match std::env::var("OPSIGHT_TENANT_ID") {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("OPSIGHT_TENANT_ID is not a valid tenant id: {raw}")),
        Err(_) => {
            let id = TenantId::new();
            tracing::warn!(tenant = %id, "OPSIGHT_TENANT_ID not set; using a generated tenant id");
            Ok(id)
        }
    }
}

fn main() -> anyhow::Result<()> {
    opsight_observability::init();

    let command = parse_args(std::env::args().skip(1))?;
    let settings = Settings::from_env().context("failed to load settings")?;
    let tenant = tenant_from_env()?;

    let path = match &command {
        Command::Report(p) | Command::Summary(p) => p,
    };
    let doc = load_document(path).context("failed to load metrics document")?;
    let report = generate_report(tenant, doc, &settings.engine).context("engine run failed")?;

    let out = match command {
        Command::Report(_) => serde_json::to_string_pretty(&report)?,
        Command::Summary(_) => serde_json::to_string_pretty(&report.summary())?,
    };
    println!("{out}");

    tracing::info!(tenant = %tenant, health = ?report.insights.overall_health, "done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> impl Iterator<Item = String> {
        items.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn parses_known_commands() {
        assert!(matches!(parse_args(args(&["report", "m.json"])), Ok(Command::Report(_))));
        assert!(matches!(parse_args(args(&["summary", "m.json"])), Ok(Command::Summary(_))));
    }

    #[test]
    fn rejects_missing_path_and_unknown_command() {
        assert!(parse_args(args(&["report"])).is_err());
        assert!(parse_args(args(&["explode", "m.json"])).is_err());
    }
}
