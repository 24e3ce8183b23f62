use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

use scout_terminal::config::{self, AppConfig};
use scout_terminal::football_api::{
    FootballDataClient, SUPPORTED_COMPETITIONS, competition_by_id, competition_by_name,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    config::load_env();
    let cfg = AppConfig::from_env()?;
    let client = FootballDataClient::from_config(&cfg.football);

    println!("API base: {}", cfg.football.base_url);
    println!(
        "API key: {}",
        if client.has_key() { "configured" } else { "missing" }
    );

    let team = string_arg("--team").unwrap_or_else(|| "Barcelona".to_string());
    let competition_arg = string_arg("--competition").unwrap_or_else(|| "LaLiga".to_string());
    let competition = competition_by_name(&competition_arg)
        .or_else(|| competition_by_id(&competition_arg))
        .ok_or_else(|| {
            let known = SUPPORTED_COMPETITIONS
                .iter()
                .map(|c| c.name)
                .collect::<Vec<_>>()
                .join(", ");
            anyhow!("unknown competition {competition_arg:?}; expected one of: {known}")
        })?;

    match client.resolve_team(&team, competition.id) {
        Ok(Some(found)) => {
            println!("Team: {} (id {})", found.name, found.id);
            match client.recent_matches(found.id, 1) {
                Ok(matches) => match matches.first() {
                    Some(m) => println!(
                        "Latest: {} vs {} on {} ({})",
                        m.home_team,
                        m.away_team,
                        m.match_date(),
                        m.league_name()
                    ),
                    None => println!("Latest: no finished matches"),
                },
                Err(err) => println!("Latest: lookup failed: {err}"),
            }
        }
        Ok(None) => println!("Team: no match for {team:?} in {}", competition.name),
        Err(err) => println!("Team: lookup failed: {err}"),
    }
    Ok(())
}

fn string_arg(flag: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            if !value.trim().is_empty() {
                return Some(value.trim().to_string());
            }
        }
        if arg == flag {
            if let Some(next) = args.get(idx + 1).filter(|n| !n.trim().is_empty()) {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}
