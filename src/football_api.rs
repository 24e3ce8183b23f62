use std::time::Duration;

use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::FootballApiConfig;

const REQUEST_TIMEOUT_SECS: u64 = 10;
const AUTH_HEADER: &str = "X-Auth-Token";

static CLIENT: OnceCell<Client> = OnceCell::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Competition {
    pub name: &'static str,
    pub id: &'static str,
}

/// Competitions covered by the football-data.org free tier.
pub const SUPPORTED_COMPETITIONS: &[Competition] = &[
    Competition { name: "Premier League", id: "2021" },
    Competition { name: "LaLiga", id: "2014" },
    Competition { name: "Serie A", id: "2019" },
    Competition { name: "Bundesliga", id: "2002" },
    Competition { name: "Ligue 1", id: "2015" },
    Competition { name: "Champions League", id: "2001" },
];

pub fn competition_by_name(name: &str) -> Option<&'static Competition> {
    SUPPORTED_COMPETITIONS
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(name.trim()))
}

pub fn competition_by_id(id: &str) -> Option<&'static Competition> {
    SUPPORTED_COMPETITIONS.iter().find(|c| c.id == id.trim())
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("FOOTBALL_API_KEY is not configured")]
    MissingKey,
    #[error("could not reach the match API: {0}")]
    Transport(String),
    #[error("match API returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected match API payload: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiTeam {
    pub id: u64,
    pub name: String,
    pub short_name: Option<String>,
    pub tla: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiMatch {
    pub id: u64,
    pub utc_date: String,
    pub status: String,
    pub venue: Option<String>,
    pub competition_name: Option<String>,
    pub competition_area: Option<String>,
    pub area_name: Option<String>,
    pub home_team: String,
    pub away_team: String,
    pub home_goals: Option<i64>,
    pub away_goals: Option<i64>,
}

impl ApiMatch {
    /// Date part of `utcDate` taken literally (`YYYY-MM-DD`).
    pub fn match_date(&self) -> &str {
        self.utc_date.get(..10).unwrap_or(&self.utc_date)
    }

    pub fn league_name(&self) -> &str {
        self.competition_name
            .as_deref()
            .unwrap_or("Unknown competition")
    }

    pub fn league_country(&self) -> &str {
        self.competition_area
            .as_deref()
            .or(self.area_name.as_deref())
            .unwrap_or("Unknown")
    }

    pub fn score_line(&self) -> Option<String> {
        let (Some(h), Some(a)) = (self.home_goals, self.away_goals) else {
            return None;
        };
        Some(format!("{h}-{a}"))
    }
}

#[derive(Debug, Clone)]
pub struct FootballDataClient {
    base_url: String,
    api_key: Option<String>,
}

impl FootballDataClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    pub fn from_config(cfg: &FootballApiConfig) -> Self {
        Self::new(cfg.base_url.clone(), cfg.api_key.clone())
    }

    pub fn has_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn get(&self, path: &str) -> Result<String, ApiError> {
        let Some(key) = self.api_key.as_deref() else {
            return Err(ApiError::MissingKey);
        };
        let client = http_client()?;
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "match api request");
        let resp = client
            .get(&url)
            .header(AUTH_HEADER, key)
            .send()
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        let status = resp.status();
        let body = resp
            .text()
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        if status.as_u16() != 200 {
            warn!(status = status.as_u16(), %url, "match api error");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    pub fn competition_teams(&self, competition_id: &str) -> Result<Vec<ApiTeam>, ApiError> {
        let body = self.get(&format!("/competitions/{}/teams", competition_id.trim()))?;
        parse_teams_json(&body)
    }

    /// First team of the competition whose name contains `name`, ignoring case.
    pub fn resolve_team(
        &self,
        name: &str,
        competition_id: &str,
    ) -> Result<Option<ApiTeam>, ApiError> {
        let teams = self.competition_teams(competition_id)?;
        Ok(find_team(&teams, name).cloned())
    }

    /// Finished matches in upstream order (most recent first); no local sorting.
    pub fn recent_matches(&self, team_id: u64, limit: u32) -> Result<Vec<ApiMatch>, ApiError> {
        let body = self.get(&format!(
            "/teams/{team_id}/matches?status=FINISHED&limit={limit}"
        ))?;
        let mut matches = parse_matches_json(&body)?;
        matches.truncate(limit as usize);
        Ok(matches)
    }
}

fn http_client() -> Result<&'static Client, ApiError> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(concat!("scout_terminal/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| ApiError::Transport(format!("failed to build http client: {err}")))
    })
}

pub fn find_team<'a>(teams: &'a [ApiTeam], name: &str) -> Option<&'a ApiTeam> {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    teams
        .iter()
        .find(|t| t.name.to_lowercase().contains(&needle))
}

fn parse_root(raw: &str) -> Result<Value, ApiError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Value::Null);
    }
    serde_json::from_str(trimmed).map_err(|err| ApiError::Decode(err.to_string()))
}

pub fn parse_teams_json(raw: &str) -> Result<Vec<ApiTeam>, ApiError> {
    let v = parse_root(raw)?;
    let Some(arr) = v.get("teams").and_then(|x| x.as_array()) else {
        return Ok(Vec::new());
    };
    Ok(arr.iter().filter_map(parse_team).collect())
}

fn parse_team(v: &Value) -> Option<ApiTeam> {
    let id = v.get("id")?.as_u64()?;
    let name = v.get("name")?.as_str()?.to_string();
    Some(ApiTeam {
        id,
        name,
        short_name: str_field(v, "shortName"),
        tla: str_field(v, "tla"),
    })
}

pub fn parse_matches_json(raw: &str) -> Result<Vec<ApiMatch>, ApiError> {
    let v = parse_root(raw)?;
    let Some(arr) = v.get("matches").and_then(|x| x.as_array()) else {
        return Ok(Vec::new());
    };
    Ok(arr.iter().filter_map(parse_match).collect())
}

fn parse_match(v: &Value) -> Option<ApiMatch> {
    let id = v.get("id")?.as_u64()?;
    let utc_date = v.get("utcDate")?.as_str()?.to_string();
    let home_team = v.get("homeTeam")?.get("name")?.as_str()?.to_string();
    let away_team = v.get("awayTeam")?.get("name")?.as_str()?.to_string();

    let competition = v.get("competition");
    let full_time = v.get("score").and_then(|s| s.get("fullTime"));

    Some(ApiMatch {
        id,
        utc_date,
        status: str_field(v, "status").unwrap_or_default(),
        venue: str_field(v, "venue"),
        competition_name: competition.and_then(|c| str_field(c, "name")),
        competition_area: competition
            .and_then(|c| c.get("area"))
            .and_then(|a| str_field(a, "name")),
        area_name: v.get("area").and_then(|a| str_field(a, "name")),
        home_team,
        away_team,
        home_goals: full_time.and_then(|s| s.get("home")).and_then(|x| x.as_i64()),
        away_goals: full_time.and_then(|s| s.get("away")).and_then(|x| x.as_i64()),
    })
}

fn str_field(v: &Value, key: &str) -> Option<String> {
    v.get(key)
        .and_then(|x| x.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(id: u64, name: &str) -> ApiTeam {
        ApiTeam {
            id,
            name: name.to_string(),
            short_name: None,
            tla: None,
        }
    }

    #[test]
    fn find_team_is_case_insensitive_substring_first_match() {
        let teams = vec![
            team(1, "Manchester United FC"),
            team(2, "Manchester City FC"),
            team(3, "Liverpool FC"),
        ];
        assert_eq!(find_team(&teams, "LIVER").map(|t| t.id), Some(3));
        assert_eq!(find_team(&teams, "manchester").map(|t| t.id), Some(1));
        assert!(find_team(&teams, "Arsenal").is_none());
        assert!(find_team(&teams, "  ").is_none());
    }

    #[test]
    fn competitions_resolve_by_name_and_id() {
        assert_eq!(SUPPORTED_COMPETITIONS.len(), 6);
        assert_eq!(competition_by_name("laliga").map(|c| c.id), Some("2014"));
        assert_eq!(competition_by_id("2001").map(|c| c.name), Some("Champions League"));
        assert!(competition_by_id("9999").is_none());
    }

    #[test]
    fn match_fallbacks() {
        let m = ApiMatch {
            id: 1,
            utc_date: "2024-05-19T15:00:00Z".to_string(),
            status: "FINISHED".to_string(),
            venue: None,
            competition_name: None,
            competition_area: None,
            area_name: Some("England".to_string()),
            home_team: "A".to_string(),
            away_team: "B".to_string(),
            home_goals: None,
            away_goals: Some(1),
        };
        assert_eq!(m.match_date(), "2024-05-19");
        assert_eq!(m.league_name(), "Unknown competition");
        assert_eq!(m.league_country(), "England");
        assert!(m.score_line().is_none());
    }

    #[test]
    fn missing_key_short_circuits() {
        let client = FootballDataClient::new("http://127.0.0.1:9", None);
        assert!(!client.has_key());
        assert_eq!(client.resolve_team("Liverpool", "2021"), Err(ApiError::MissingKey));
        assert_eq!(client.recent_matches(64, 5), Err(ApiError::MissingKey));
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        assert!(matches!(parse_teams_json("{oops"), Err(ApiError::Decode(_))));
        assert!(parse_matches_json("null").unwrap().is_empty());
    }
}
