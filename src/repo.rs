use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::debug;

use crate::error::{ConflictKind, Result, ScoutError, is_unique_violation};
use crate::records::{
    League, MatchContext, NewPlayer, NewReport, Player, PlayerUpdate, ScoutingReport, StatLine,
    Team,
};

const PLAYER_COLUMNS: &str = "player_id, full_name, birth_date, nationality, height_cm, weight_kg, position, preferred_foot";

fn player_from_row(row: &Row<'_>) -> rusqlite::Result<Player> {
    Ok(Player {
        player_id: row.get(0)?,
        full_name: row.get(1)?,
        birth_date: row.get(2)?,
        nationality: row.get(3)?,
        height_cm: row.get(4)?,
        weight_kg: row.get(5)?,
        position: row.get(6)?,
        preferred_foot: row.get(7)?,
    })
}

pub fn list_players(conn: &Connection) -> Result<Vec<Player>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PLAYER_COLUMNS} FROM players ORDER BY full_name COLLATE NOCASE, player_id"
    ))?;
    let rows = stmt.query_map([], player_from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn player_by_id(conn: &Connection, player_id: i64) -> Result<Option<Player>> {
    let player = conn
        .query_row(
            &format!("SELECT {PLAYER_COLUMNS} FROM players WHERE player_id = ?1"),
            params![player_id],
            player_from_row,
        )
        .optional()?;
    Ok(player)
}

/// Case-insensitive identity lookup, matching the uniqueness rule on `players`.
pub fn find_player_by_identity(
    conn: &Connection,
    full_name: &str,
    birth_date: NaiveDate,
    nationality: &str,
) -> Result<Option<Player>> {
    let player = conn
        .query_row(
            &format!(
                "SELECT {PLAYER_COLUMNS} FROM players
                 WHERE full_name = ?1 AND birth_date = ?2 AND nationality = ?3"
            ),
            params![full_name.trim(), birth_date, nationality.trim()],
            player_from_row,
        )
        .optional()?;
    Ok(player)
}

/// Inserts a player; an identity clash comes back as `ScoutError::Conflict`.
pub fn insert_player(conn: &Connection, player: &NewPlayer) -> Result<i64> {
    let res = conn.execute(
        "INSERT INTO players (
            full_name, birth_date, nationality, height_cm, weight_kg, position, preferred_foot
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            player.full_name,
            player.birth_date,
            player.nationality,
            player.height_cm,
            player.weight_kg,
            player.position,
            player.preferred_foot.map(|f| f.as_str()),
        ],
    );
    match res {
        Ok(_) => {
            let id = conn.last_insert_rowid();
            debug!(player_id = id, name = %player.full_name, "player inserted");
            Ok(id)
        }
        Err(err) if is_unique_violation(&err) => {
            Err(ScoutError::Conflict(ConflictKind::PlayerIdentity))
        }
        Err(err) => Err(err.into()),
    }
}

pub fn update_player(conn: &Connection, player_id: i64, update: &PlayerUpdate) -> Result<()> {
    let res = conn.execute(
        "UPDATE players
         SET nationality = ?1, height_cm = ?2, weight_kg = ?3, position = ?4, preferred_foot = ?5
         WHERE player_id = ?6",
        params![
            update.nationality,
            update.height_cm,
            update.weight_kg,
            update.position,
            update.preferred_foot.map(|f| f.as_str()),
            player_id,
        ],
    );
    match res {
        Ok(0) => Err(ScoutError::NotFound(format!("player {player_id}"))),
        Ok(_) => Ok(()),
        Err(err) if is_unique_violation(&err) => {
            Err(ScoutError::Conflict(ConflictKind::PlayerIdentity))
        }
        Err(err) => Err(err.into()),
    }
}

/// Returns the id for `(name, country)`, inserting the league on first use.
/// The insert is a no-op when the natural key already exists, so concurrent callers converge.
pub fn get_or_create_league(
    conn: &Connection,
    name: &str,
    country: &str,
    level: Option<i64>,
) -> Result<i64> {
    let inserted = conn.execute(
        "INSERT INTO leagues (name, country, level) VALUES (?1, ?2, ?3)
         ON CONFLICT (name, country) DO NOTHING",
        params![name, country, level],
    )?;
    if inserted > 0 {
        debug!(name, country, "league created");
    }
    let id = conn.query_row(
        "SELECT league_id FROM leagues WHERE name = ?1 AND country = ?2",
        params![name, country],
        |row| row.get(0),
    )?;
    Ok(id)
}

pub fn get_or_create_team(conn: &Connection, name: &str, league_id: i64) -> Result<i64> {
    let inserted = conn.execute(
        "INSERT INTO teams (name, league_id) VALUES (?1, ?2)
         ON CONFLICT (name, league_id) DO NOTHING",
        params![name, league_id],
    )?;
    if inserted > 0 {
        debug!(name, league_id, "team created");
    }
    let id = conn.query_row(
        "SELECT team_id FROM teams WHERE name = ?1 AND league_id = ?2",
        params![name, league_id],
        |row| row.get(0),
    )?;
    Ok(id)
}

pub fn create_match(
    conn: &Connection,
    match_date: NaiveDate,
    league_id: i64,
    home_team_id: i64,
    away_team_id: i64,
    venue: Option<&str>,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO matches (match_date, home_team_id, away_team_id, league_id, venue)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![match_date, home_team_id, away_team_id, league_id, venue],
    )?;
    Ok(conn.last_insert_rowid())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatedMatch {
    pub match_id: i64,
    pub league_id: i64,
}

/// Get-or-creates the league and both teams, then creates the match row.
pub fn create_match_from_context(conn: &Connection, ctx: &MatchContext) -> Result<CreatedMatch> {
    let league_id = get_or_create_league(conn, &ctx.league_name, &ctx.league_country, None)?;
    let home_id = get_or_create_team(conn, &ctx.home_team, league_id)?;
    let away_id = get_or_create_team(conn, &ctx.away_team, league_id)?;
    let match_id = create_match(
        conn,
        ctx.match_date,
        league_id,
        home_id,
        away_id,
        ctx.venue.as_deref(),
    )?;
    Ok(CreatedMatch {
        match_id,
        league_id,
    })
}

pub fn insert_stats(conn: &Connection, match_id: i64, player_id: i64, s: &StatLine) -> Result<()> {
    conn.execute(
        "INSERT INTO stats (
            match_id, player_id, minutes_played, goals, assists, shots, passes, tackles,
            yellow_cards, red_cards
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            match_id,
            player_id,
            s.minutes_played,
            s.goals,
            s.assists,
            s.shots,
            s.passes,
            s.tackles,
            s.yellow_cards,
            s.red_cards,
        ],
    )?;
    Ok(())
}

pub fn insert_scouting_report(conn: &Connection, player_id: i64, r: &NewReport) -> Result<i64> {
    conn.execute(
        "INSERT INTO scouting_reports (
            player_id, report_date, scout_name, overall_rating,
            strengths, weaknesses, recommended_role, notes
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            player_id,
            r.report_date,
            r.scout_name,
            r.overall_rating,
            r.strengths,
            r.weaknesses,
            r.recommended_role,
            r.notes,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_reports(conn: &Connection, player_id: Option<i64>) -> Result<Vec<ScoutingReport>> {
    let mut stmt = conn.prepare(
        "SELECT report_id, player_id, report_date, scout_name, overall_rating,
                strengths, weaknesses, recommended_role, notes
         FROM scouting_reports
         WHERE ?1 IS NULL OR player_id = ?1
         ORDER BY report_date DESC, report_id DESC",
    )?;
    let rows = stmt.query_map(params![player_id], |row| {
        Ok(ScoutingReport {
            report_id: row.get(0)?,
            player_id: row.get(1)?,
            report_date: row.get(2)?,
            scout_name: row.get(3)?,
            overall_rating: row.get(4)?,
            strengths: row.get(5)?,
            weaknesses: row.get(6)?,
            recommended_role: row.get(7)?,
            notes: row.get(8)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn league_by_id(conn: &Connection, league_id: i64) -> Result<Option<League>> {
    let league = conn
        .query_row(
            "SELECT league_id, name, country, level FROM leagues WHERE league_id = ?1",
            params![league_id],
            |row| {
                Ok(League {
                    league_id: row.get(0)?,
                    name: row.get(1)?,
                    country: row.get(2)?,
                    level: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(league)
}

pub fn teams_in_league(conn: &Connection, league_id: i64) -> Result<Vec<Team>> {
    let mut stmt = conn.prepare(
        "SELECT team_id, name, league_id FROM teams WHERE league_id = ?1 ORDER BY name",
    )?;
    let rows = stmt.query_map(params![league_id], |row| {
        Ok(Team {
            team_id: row.get(0)?,
            name: row.get(1)?,
            league_id: row.get(2)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn count_rows(conn: &Connection, table: &str) -> Result<i64> {
    let n = conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", crate::db::quote_ident(table)),
        [],
        |row| row.get(0),
    )?;
    Ok(n)
}
