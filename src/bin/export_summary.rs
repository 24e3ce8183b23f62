use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use tracing_subscriber::EnvFilter;

use scout_terminal::config::{self, AppConfig};
use scout_terminal::{db, export};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    config::load_env();
    let cfg = AppConfig::from_env()?;
    let db_path = cfg.active_db().path.clone();
    let out = parse_out_arg().unwrap_or_else(|| {
        let file = format!("scouting_summary_{}.xlsx", Local::now().format("%Y%m%d"));
        db_path
            .parent()
            .map(|dir| dir.join(&file))
            .unwrap_or_else(|| PathBuf::from(&file))
    });

    let conn = db::open_db(&db_path)
        .with_context(|| format!("open database {}", db_path.display()))?;
    let report = export::export_summary(&conn, &out)?;

    println!("Summary export complete");
    println!("DB: {}", db_path.display());
    println!("Players: {}", report.players);
    println!("Reports: {}", report.reports);
    println!("File: {}", out.display());
    Ok(())
}

fn parse_out_arg() -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix("--out=") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == "--out" {
            if let Some(next) = args.get(idx + 1).filter(|n| !n.trim().is_empty()) {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}
