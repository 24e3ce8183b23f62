use chrono::NaiveDate;
use rusqlite::Connection;
use thiserror::Error;
use tracing::info;

use crate::error::ScoutError;
use crate::football_api::{ApiError, ApiMatch, ApiTeam, FootballDataClient};
use crate::records::{MatchContext, NewReport};
use crate::repo;

pub const AUTO_SCOUT_NAME: &str = "Automatic API scouting";
pub const AUTO_RATING: f64 = 6.5;
pub const RECENT_MATCH_LIMIT: u32 = 5;
pub const SOURCE_LABEL: &str = "football-data.org";

/// Source of real match context. `FootballDataClient` is the production implementation.
pub trait MatchFeed {
    fn resolve_team(&self, name: &str, competition_id: &str) -> Result<Option<ApiTeam>, ApiError>;
    fn recent_matches(&self, team_id: u64, limit: u32) -> Result<Vec<ApiMatch>, ApiError>;
}

impl MatchFeed for FootballDataClient {
    fn resolve_team(&self, name: &str, competition_id: &str) -> Result<Option<ApiTeam>, ApiError> {
        FootballDataClient::resolve_team(self, name, competition_id)
    }

    fn recent_matches(&self, team_id: u64, limit: u32) -> Result<Vec<ApiMatch>, ApiError> {
        FootballDataClient::recent_matches(self, team_id, limit)
    }
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("player {0} does not exist")]
    PlayerNotFound(i64),
    #[error("no team matching {team:?} in competition {competition}")]
    TeamNotFound { team: String, competition: String },
    #[error("team lookup failed: {0}")]
    TeamLookup(ApiError),
    #[error("match lookup failed: {0}")]
    MatchLookup(ApiError),
    #[error("no recent finished matches for {0}")]
    NoRecentMatches(String),
    #[error("match date {0:?} is not a valid date")]
    BadMatchDate(String),
    #[error(transparent)]
    Store(#[from] ScoutError),
}

impl From<rusqlite::Error> for ReportError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Store(ScoutError::Db(err))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedReport {
    pub report_id: i64,
    pub match_id: i64,
    pub league_id: i64,
    pub home_team: String,
    pub away_team: String,
    pub match_date: NaiveDate,
}

impl GeneratedReport {
    pub fn message(&self) -> String {
        format!(
            "Report generated from the real match {} vs {} on {}",
            self.home_team, self.away_team, self.match_date
        )
    }
}

/// Builds the automatic report text for a fetched match.
pub fn auto_report(m: &ApiMatch, report_date: NaiveDate) -> NewReport {
    let fixture = format!("{} vs {}", m.home_team, m.away_team);
    let score = m
        .score_line()
        .map(|s| format!(", final score {s}"))
        .unwrap_or_default();
    NewReport {
        report_date,
        scout_name: Some(AUTO_SCOUT_NAME.to_string()),
        overall_rating: AUTO_RATING,
        strengths: Some(format!(
            "Assessed in a real match context ({fixture}). Good positioning."
        )),
        weaknesses: Some("Limited attacking impact in the observed context.".to_string()),
        recommended_role: Some("Keep under follow-up in current role.".to_string()),
        notes: Some(format!(
            "Match taken from {SOURCE_LABEL}: {fixture} ({}){score}.",
            m.match_date()
        )),
    }
}

/// Resolves the team, takes its latest finished match, and stores league, teams, match and an
/// automatic report for `player_id`. Every write happens in one transaction.
pub fn generate_contextual_report(
    conn: &mut Connection,
    feed: &dyn MatchFeed,
    player_id: i64,
    team_name: &str,
    competition_id: &str,
    today: NaiveDate,
) -> Result<GeneratedReport, ReportError> {
    if repo::player_by_id(conn, player_id)?.is_none() {
        return Err(ReportError::PlayerNotFound(player_id));
    }

    let team = match feed.resolve_team(team_name, competition_id) {
        Ok(Some(team)) => team,
        Ok(None) => {
            return Err(ReportError::TeamNotFound {
                team: team_name.to_string(),
                competition: competition_id.to_string(),
            });
        }
        Err(err) => return Err(ReportError::TeamLookup(err)),
    };

    let matches = feed
        .recent_matches(team.id, RECENT_MATCH_LIMIT)
        .map_err(ReportError::MatchLookup)?;
    let Some(latest) = matches.first() else {
        return Err(ReportError::NoRecentMatches(team.name));
    };

    let match_date = NaiveDate::parse_from_str(latest.match_date(), "%Y-%m-%d")
        .map_err(|_| ReportError::BadMatchDate(latest.utc_date.clone()))?;
    let ctx = MatchContext {
        match_date,
        league_name: latest.league_name().to_string(),
        league_country: latest.league_country().to_string(),
        venue: latest.venue.clone(),
        home_team: latest.home_team.clone(),
        away_team: latest.away_team.clone(),
    };

    let tx = conn.transaction()?;
    let repo::CreatedMatch {
        match_id,
        league_id,
    } = repo::create_match_from_context(&tx, &ctx)?;
    let report_id = repo::insert_scouting_report(&tx, player_id, &auto_report(latest, today))?;
    tx.commit()?;

    info!(
        player_id,
        match_id,
        report_id,
        fixture = %format!("{} vs {}", ctx.home_team, ctx.away_team),
        "contextual report generated"
    );

    Ok(GeneratedReport {
        report_id,
        match_id,
        league_id,
        home_team: ctx.home_team,
        away_team: ctx.away_team,
        match_date,
    })
}
