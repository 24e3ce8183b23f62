use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::error::Result;

pub const SUMMARY_VIEW: &str = "player_scouting_summary";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrativeTier {
    Immediate,
    Promising,
    Developing,
    Limited,
}

impl NarrativeTier {
    pub const IMMEDIATE_MIN: f64 = 8.0;
    pub const PROMISING_MIN: f64 = 7.0;
    pub const DEVELOPING_MIN: f64 = 6.0;

    /// Buckets the best report rating; a player without reports is `Limited`.
    pub fn for_rating(max_rating: Option<f64>) -> Self {
        match max_rating {
            Some(r) if r >= Self::IMMEDIATE_MIN => Self::Immediate,
            Some(r) if r >= Self::PROMISING_MIN => Self::Promising,
            Some(r) if r >= Self::DEVELOPING_MIN => Self::Developing,
            _ => Self::Limited,
        }
    }

    pub fn text(self) -> &'static str {
        match self {
            Self::Immediate => {
                "Immediate-impact player. High statistical output and outstanding qualitative assessment. Profiles as a competitive starter in demanding leagues."
            }
            Self::Promising => {
                "Player with good performance and upside. Combines solid numbers with a positive assessment. Can grow into a leading role."
            }
            Self::Developing => {
                "Player with interesting attributes but clear areas to develop. Potential to grow depending on tactical context."
            }
            Self::Limited => {
                "Profile with limited output on current metrics. Needs follow-up to assess growth."
            }
        }
    }

    pub fn from_text(text: &str) -> Option<Self> {
        [
            Self::Immediate,
            Self::Promising,
            Self::Developing,
            Self::Limited,
        ]
        .into_iter()
        .find(|tier| tier.text() == text)
    }
}

/// SELECT body of the summary view. Tier texts and thresholds come from [`NarrativeTier`].
pub fn summary_view_query() -> String {
    format!(
        r#"
        SELECT
            p.player_id AS player_id,
            p.full_name AS full_name,
            p.position AS position,
            p.nationality AS nationality,
            (CAST(strftime('%Y', 'now') AS INTEGER) - CAST(strftime('%Y', p.birth_date) AS INTEGER))
                - (strftime('%m-%d', 'now') < strftime('%m-%d', p.birth_date)) AS age,
            r.scout_rating AS scout_rating,
            s.minutes_played AS minutes_played,
            s.goals AS goals,
            s.assists AS assists,
            ROUND(CAST(s.goals AS REAL) / NULLIF(s.minutes_played, 0) * 90, 2) AS goals_per_90,
            ROUND(CAST(s.assists AS REAL) / NULLIF(s.minutes_played, 0) * 90, 2) AS assists_per_90,
            (SELECT GROUP_CONCAT(strengths, '; ') FROM (
                SELECT DISTINCT strengths FROM scouting_reports
                WHERE player_id = p.player_id AND strengths IS NOT NULL AND strengths <> ''
                ORDER BY strengths
            )) AS strengths_summary,
            (SELECT GROUP_CONCAT(weaknesses, '; ') FROM (
                SELECT DISTINCT weaknesses FROM scouting_reports
                WHERE player_id = p.player_id AND weaknesses IS NOT NULL AND weaknesses <> ''
                ORDER BY weaknesses
            )) AS weaknesses_summary,
            CASE
                WHEN r.scout_rating >= {immediate_min:.1} THEN '{immediate}'
                WHEN r.scout_rating >= {promising_min:.1} THEN '{promising}'
                WHEN r.scout_rating >= {developing_min:.1} THEN '{developing}'
                ELSE '{limited}'
            END AS narrative
        FROM players p
        LEFT JOIN (
            SELECT player_id,
                   SUM(minutes_played) AS minutes_played,
                   SUM(goals) AS goals,
                   SUM(assists) AS assists
            FROM stats
            GROUP BY player_id
        ) s ON s.player_id = p.player_id
        LEFT JOIN (
            SELECT player_id, MAX(overall_rating) AS scout_rating
            FROM scouting_reports
            GROUP BY player_id
        ) r ON r.player_id = p.player_id
        "#,
        immediate_min = NarrativeTier::IMMEDIATE_MIN,
        promising_min = NarrativeTier::PROMISING_MIN,
        developing_min = NarrativeTier::DEVELOPING_MIN,
        immediate = sql_text(NarrativeTier::Immediate.text()),
        promising = sql_text(NarrativeTier::Promising.text()),
        developing = sql_text(NarrativeTier::Developing.text()),
        limited = sql_text(NarrativeTier::Limited.text()),
    )
}

fn sql_text(raw: &str) -> String {
    raw.replace('\'', "''")
}

/// Drops and recreates the view so its definition always matches this build.
pub fn rebuild_summary_view(conn: &Connection) -> Result<()> {
    conn.execute_batch(&format!(
        "DROP VIEW IF EXISTS {SUMMARY_VIEW};
         CREATE VIEW {SUMMARY_VIEW} AS {};",
        summary_view_query()
    ))?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSummary {
    pub player_id: i64,
    pub full_name: String,
    pub position: Option<String>,
    pub nationality: String,
    pub age: Option<i64>,
    pub scout_rating: Option<f64>,
    pub minutes_played: Option<i64>,
    pub goals: Option<i64>,
    pub assists: Option<i64>,
    pub goals_per_90: Option<f64>,
    pub assists_per_90: Option<f64>,
    pub strengths_summary: Option<String>,
    pub weaknesses_summary: Option<String>,
    pub narrative: String,
}

impl PlayerSummary {
    pub fn tier(&self) -> NarrativeTier {
        NarrativeTier::for_rating(self.scout_rating)
    }
}

const SUMMARY_COLUMNS: &str = "player_id, full_name, position, nationality, age, scout_rating, minutes_played, goals, assists, goals_per_90, assists_per_90, strengths_summary, weaknesses_summary, narrative";

fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<PlayerSummary> {
    Ok(PlayerSummary {
        player_id: row.get(0)?,
        full_name: row.get(1)?,
        position: row.get(2)?,
        nationality: row.get(3)?,
        age: row.get(4)?,
        scout_rating: row.get(5)?,
        minutes_played: row.get(6)?,
        goals: row.get(7)?,
        assists: row.get(8)?,
        goals_per_90: row.get(9)?,
        assists_per_90: row.get(10)?,
        strengths_summary: row.get(11)?,
        weaknesses_summary: row.get(12)?,
        narrative: row.get(13)?,
    })
}

pub fn load_summary(conn: &Connection) -> Result<Vec<PlayerSummary>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SUMMARY_COLUMNS} FROM {SUMMARY_VIEW}
         ORDER BY scout_rating IS NULL, scout_rating DESC, full_name COLLATE NOCASE"
    ))?;
    let rows = stmt.query_map([], summary_from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn load_player_summary(conn: &Connection, player_id: i64) -> Result<Option<PlayerSummary>> {
    let row = conn
        .query_row(
            &format!("SELECT {SUMMARY_COLUMNS} FROM {SUMMARY_VIEW} WHERE player_id = ?1"),
            params![player_id],
            summary_from_row,
        )
        .optional()?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_use_half_open_ranges() {
        assert_eq!(NarrativeTier::for_rating(Some(8.0)), NarrativeTier::Immediate);
        assert_eq!(NarrativeTier::for_rating(Some(7.99)), NarrativeTier::Promising);
        assert_eq!(NarrativeTier::for_rating(Some(7.0)), NarrativeTier::Promising);
        assert_eq!(NarrativeTier::for_rating(Some(6.95)), NarrativeTier::Developing);
        assert_eq!(NarrativeTier::for_rating(Some(5.99)), NarrativeTier::Limited);
        assert_eq!(NarrativeTier::for_rating(None), NarrativeTier::Limited);
    }

    #[test]
    fn tier_text_round_trips() {
        for tier in [
            NarrativeTier::Immediate,
            NarrativeTier::Promising,
            NarrativeTier::Developing,
            NarrativeTier::Limited,
        ] {
            assert_eq!(NarrativeTier::from_text(tier.text()), Some(tier));
        }
    }

    #[test]
    fn rebuild_replaces_a_stale_view() {
        let conn = crate::db::open_memory_db().unwrap();
        conn.execute_batch(&format!(
            "DROP VIEW {SUMMARY_VIEW}; CREATE VIEW {SUMMARY_VIEW} AS SELECT 1 AS stale;"
        ))
        .unwrap();
        rebuild_summary_view(&conn).unwrap();
        assert!(load_summary(&conn).unwrap().is_empty());
    }
}
