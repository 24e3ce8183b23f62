use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreferredFoot {
    Right,
    Left,
    Both,
}

impl PreferredFoot {
    pub const ALL: [PreferredFoot; 3] = [Self::Right, Self::Left, Self::Both];
    pub const LABELS: &'static [&'static str] = &["Right", "Left", "Both"];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Right => "Right",
            Self::Left => "Left",
            Self::Both => "Both",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|foot| foot.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub player_id: i64,
    pub full_name: String,
    pub birth_date: NaiveDate,
    pub nationality: String,
    pub height_cm: Option<i64>,
    pub weight_kg: Option<i64>,
    pub position: Option<String>,
    pub preferred_foot: Option<String>,
}

impl Player {
    /// "Name (Nationality, YYYY-MM-DD)", used wherever a player is picked from a list.
    pub fn label(&self) -> String {
        format!(
            "{} ({}, {})",
            self.full_name, self.nationality, self.birth_date
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPlayer {
    pub full_name: String,
    pub birth_date: NaiveDate,
    pub nationality: String,
    pub height_cm: Option<i64>,
    pub weight_kg: Option<i64>,
    pub position: Option<String>,
    pub preferred_foot: Option<PreferredFoot>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerUpdate {
    pub nationality: String,
    pub height_cm: Option<i64>,
    pub weight_kg: Option<i64>,
    pub position: Option<String>,
    pub preferred_foot: Option<PreferredFoot>,
}

/// Where and between whom a stat line was recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchContext {
    pub match_date: NaiveDate,
    pub league_name: String,
    pub league_country: String,
    pub venue: Option<String>,
    pub home_team: String,
    pub away_team: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatLine {
    pub minutes_played: i64,
    pub goals: i64,
    pub assists: i64,
    pub shots: i64,
    pub passes: i64,
    pub tackles: i64,
    pub yellow_cards: i64,
    pub red_cards: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
    pub report_date: NaiveDate,
    pub scout_name: Option<String>,
    pub overall_rating: f64,
    pub strengths: Option<String>,
    pub weaknesses: Option<String>,
    pub recommended_role: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoutingReport {
    pub report_id: i64,
    pub player_id: i64,
    pub report_date: NaiveDate,
    pub scout_name: Option<String>,
    pub overall_rating: f64,
    pub strengths: Option<String>,
    pub weaknesses: Option<String>,
    pub recommended_role: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct League {
    pub league_id: i64,
    pub name: String,
    pub country: String,
    pub level: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub team_id: i64,
    pub name: String,
    pub league_id: i64,
}
