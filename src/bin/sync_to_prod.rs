use std::path::PathBuf;

use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use scout_terminal::config::{self, AppConfig, Environment};
use scout_terminal::sync;

/// Failures are logged and the process still exits normally.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    config::load_env();
    let cfg = match AppConfig::from_env() {
        Ok(cfg) => Some(cfg),
        Err(err) => {
            error!(err = %format!("{err:#}"), "invalid configuration");
            None
        }
    };
    let source_path = path_arg("--source")
        .or_else(|| cfg.as_ref().map(|cfg| cfg.db(Environment::Dev).path.clone()));
    let target_path = path_arg("--target")
        .or_else(|| cfg.as_ref().map(|cfg| cfg.db(Environment::Prod).path.clone()));
    let (Some(source_path), Some(target_path)) = (source_path, target_path) else {
        error!("no source or target database path, nothing synced");
        return Ok(());
    };

    let outcome = sync::run(&source_path, &target_path);
    info!(ok = outcome.is_some(), "connections closed");
    Ok(())
}

fn path_arg(flag: &str) -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix(&prefix) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}
