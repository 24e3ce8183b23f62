//! Data-entry flows behind the terminal forms: build a form with sensible defaults,
//! validate it into typed input, and write it.

use chrono::NaiveDate;
use rusqlite::Connection;
use tracing::info;

use crate::error::{Result, ScoutError, ValidationError};
use crate::football_api::SUPPORTED_COMPETITIONS;
use crate::forms::{Field, Form};
use crate::records::{
    MatchContext, NewPlayer, NewReport, Player, PlayerUpdate, PreferredFoot, StatLine,
};
use crate::repo;

pub const DEFAULT_NATIONALITY: &str = "Colombia";
pub const DEFAULT_HEIGHT_CM: i64 = 175;
pub const DEFAULT_WEIGHT_KG: i64 = 70;
pub const HEIGHT_RANGE: (i64, i64) = (120, 220);
pub const WEIGHT_RANGE: (i64, i64) = (40, 120);
pub const MINUTES_RANGE: (i64, i64) = (1, 120);
pub const RATING_RANGE: (f64, f64) = (0.0, 10.0);
pub const DEFAULT_HOME_TEAM: &str = "Home Team";
pub const DEFAULT_AWAY_TEAM: &str = "Away Team";
pub const DEFAULT_STRENGTHS: &str = "Good acceleration, dribbling and ability to beat a man.";
pub const DEFAULT_WEAKNESSES: &str = "Decision-making in the final third can improve.";
pub const DEFAULT_ROLE: &str = "Winger for fast attacking transitions";
pub const DEFAULT_NOTES: &str = "Player with potential for higher-tempo leagues.";

fn earliest_birth_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

fn default_birth_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2005, 1, 1).unwrap_or_default()
}

fn earliest_match_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or_default()
}

fn competition_names() -> &'static [&'static str] {
    static NAMES: once_cell::sync::Lazy<Vec<&'static str>> =
        once_cell::sync::Lazy::new(|| SUPPORTED_COMPETITIONS.iter().map(|c| c.name).collect());
    NAMES.as_slice()
}

pub fn new_player_form(today: NaiveDate) -> Form {
    Form::new(
        "Register new player",
        vec![
            Field::text("full_name", "Full name", "").required(),
            Field::date(
                "birth_date",
                "Birth date",
                earliest_birth_date(),
                today,
                default_birth_date().min(today),
            ),
            Field::text("nationality", "Nationality", DEFAULT_NATIONALITY).required(),
            Field::integer(
                "height_cm",
                "Height (cm)",
                HEIGHT_RANGE.0,
                HEIGHT_RANGE.1,
                DEFAULT_HEIGHT_CM,
            ),
            Field::integer(
                "weight_kg",
                "Weight (kg)",
                WEIGHT_RANGE.0,
                WEIGHT_RANGE.1,
                DEFAULT_WEIGHT_KG,
            ),
            Field::text("position", "Position (winger, striker, ...)", "").required(),
            Field::choice("preferred_foot", "Preferred foot", PreferredFoot::LABELS),
        ],
    )
}

pub fn parse_new_player(form: &Form) -> std::result::Result<NewPlayer, ValidationError> {
    Ok(NewPlayer {
        full_name: form.required_text("full_name")?,
        birth_date: form.date("birth_date")?,
        nationality: form.required_text("nationality")?,
        height_cm: Some(form.integer("height_cm")?),
        weight_kg: Some(form.integer("weight_kg")?),
        position: Some(form.required_text("position")?),
        preferred_foot: PreferredFoot::parse(form.choice("preferred_foot")?),
    })
}

/// Profile form pre-filled from the stored player.
pub fn profile_form(player: &Player) -> Form {
    let mut form = Form::new(
        "Update profile",
        vec![
            Field::text("nationality", "Nationality", player.nationality.clone()).required(),
            Field::text(
                "position",
                "Position",
                player.position.clone().unwrap_or_default(),
            ),
            Field::integer(
                "height_cm",
                "Height (cm)",
                HEIGHT_RANGE.0,
                HEIGHT_RANGE.1,
                player.height_cm.unwrap_or(DEFAULT_HEIGHT_CM),
            ),
            Field::integer(
                "weight_kg",
                "Weight (kg)",
                WEIGHT_RANGE.0,
                WEIGHT_RANGE.1,
                player.weight_kg.unwrap_or(DEFAULT_WEIGHT_KG),
            ),
            Field::choice("preferred_foot", "Preferred foot", PreferredFoot::LABELS),
        ],
    );
    if let Some(foot) = player.preferred_foot.as_deref().and_then(PreferredFoot::parse) {
        form.set("preferred_foot", foot.as_str());
    }
    form
}

pub fn parse_player_update(form: &Form) -> std::result::Result<PlayerUpdate, ValidationError> {
    Ok(PlayerUpdate {
        nationality: form.required_text("nationality")?,
        height_cm: Some(form.integer("height_cm")?),
        weight_kg: Some(form.integer("weight_kg")?),
        position: form.text("position")?,
        preferred_foot: PreferredFoot::parse(form.choice("preferred_foot")?),
    })
}

pub fn stats_form(today: NaiveDate) -> Form {
    Form::new(
        "Match statistics",
        vec![
            Field::date("match_date", "Match date", earliest_match_date(), today, today),
            Field::text("league_name", "League", "Liga Colombiana A").required(),
            Field::text("league_country", "League country", DEFAULT_NATIONALITY).required(),
            Field::text("venue", "Venue", ""),
            Field::text("home_team", "Home team", DEFAULT_HOME_TEAM).required(),
            Field::text("away_team", "Away team", DEFAULT_AWAY_TEAM).required(),
            Field::integer("minutes_played", "Minutes played", MINUTES_RANGE.0, MINUTES_RANGE.1, 90),
            Field::integer("goals", "Goals", 0, 10, 0),
            Field::integer("assists", "Assists", 0, 10, 0),
            Field::integer("shots", "Shots", 0, 20, 0),
            Field::integer("passes", "Passes", 0, 200, 0),
            Field::integer("tackles", "Tackles", 0, 20, 0),
            Field::integer("yellow_cards", "Yellow cards", 0, 2, 0),
            Field::integer("red_cards", "Red cards", 0, 1, 0),
        ],
    )
}

pub fn parse_stats(
    form: &Form,
) -> std::result::Result<(MatchContext, StatLine), ValidationError> {
    let home_team = form.required_text("home_team")?;
    let away_team = form.required_text("away_team")?;
    if home_team.eq_ignore_ascii_case(&away_team) {
        return Err(ValidationError::new(
            "Away team",
            "must differ from the home team",
        ));
    }
    let ctx = MatchContext {
        match_date: form.date("match_date")?,
        league_name: form.required_text("league_name")?,
        league_country: form.required_text("league_country")?,
        venue: form.text("venue")?,
        home_team,
        away_team,
    };
    let line = StatLine {
        minutes_played: form.integer("minutes_played")?,
        goals: form.integer("goals")?,
        assists: form.integer("assists")?,
        shots: form.integer("shots")?,
        passes: form.integer("passes")?,
        tackles: form.integer("tackles")?,
        yellow_cards: form.integer("yellow_cards")?,
        red_cards: form.integer("red_cards")?,
    };
    Ok((ctx, line))
}

pub fn report_form(today: NaiveDate, scout_name: &str) -> Form {
    Form::new(
        "Scouting report",
        vec![
            Field::date("report_date", "Report date", earliest_match_date(), today, today),
            Field::text("scout_name", "Scout", scout_name),
            Field::decimal(
                "overall_rating",
                "Overall rating (0.0-10.0)",
                RATING_RANGE.0,
                RATING_RANGE.1,
                7.5,
            ),
            Field::text("strengths", "Strengths", DEFAULT_STRENGTHS).required(),
            Field::text("weaknesses", "Weaknesses", DEFAULT_WEAKNESSES).required(),
            Field::text("recommended_role", "Recommended role", DEFAULT_ROLE),
            Field::text("notes", "Notes", DEFAULT_NOTES),
        ],
    )
}

pub fn parse_report(form: &Form) -> std::result::Result<NewReport, ValidationError> {
    Ok(NewReport {
        report_date: form.date("report_date")?,
        scout_name: form.text("scout_name")?,
        overall_rating: form.decimal("overall_rating")?,
        strengths: Some(form.required_text("strengths")?),
        weaknesses: Some(form.required_text("weaknesses")?),
        recommended_role: form.text("recommended_role")?,
        notes: form.text("notes")?,
    })
}

pub fn api_report_form(competition: Option<&str>) -> Form {
    let mut form = Form::new(
        "Report from a real match",
        vec![
            Field::choice("competition", "Competition", competition_names()),
            Field::text("team_name", "Team (e.g. Liverpool, PSG, Bayern)", "Liverpool").required(),
        ],
    );
    if let Some(name) = competition.filter(|n| competition_names().contains(n)) {
        form.set("competition", name);
    }
    form
}

#[derive(Debug, Clone, PartialEq)]
pub enum Registration {
    Registered { player_id: i64 },
    /// The identity is already on file; nothing was written.
    AlreadyRegistered(Player),
}

pub fn register_player(conn: &Connection, form: &Form) -> Result<Registration> {
    let player = parse_new_player(form)?;
    if let Some(existing) =
        repo::find_player_by_identity(conn, &player.full_name, player.birth_date, &player.nationality)?
    {
        return Ok(Registration::AlreadyRegistered(existing));
    }
    let player_id = repo::insert_player(conn, &player)?;
    info!(player_id, name = %player.full_name, "player registered");
    Ok(Registration::Registered { player_id })
}

pub fn update_profile(conn: &Connection, player_id: i64, form: &Form) -> Result<()> {
    let update = parse_player_update(form)?;
    repo::update_player(conn, player_id, &update)?;
    info!(player_id, "player profile updated");
    Ok(())
}

/// Writes league, teams, match and stat line together; returns the new match id.
pub fn record_match_stats(conn: &mut Connection, player_id: i64, form: &Form) -> Result<i64> {
    let (ctx, line) = parse_stats(form)?;
    let tx = conn.transaction()?;
    if repo::player_by_id(&tx, player_id)?.is_none() {
        return Err(ScoutError::NotFound(format!("player {player_id}")));
    }
    let match_id = repo::create_match_from_context(&tx, &ctx)?.match_id;
    repo::insert_stats(&tx, match_id, player_id, &line)?;
    tx.commit()?;
    info!(player_id, match_id, "match stats recorded");
    Ok(match_id)
}

pub fn add_scouting_report(conn: &Connection, player_id: i64, form: &Form) -> Result<i64> {
    let report = parse_report(form)?;
    if repo::player_by_id(conn, player_id)?.is_none() {
        return Err(ScoutError::NotFound(format!("player {player_id}")));
    }
    let report_id = repo::insert_scouting_report(conn, player_id, &report)?;
    info!(player_id, report_id, "scouting report saved");
    Ok(report_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn new_player_requires_name_and_position() {
        let form = new_player_form(today());
        let err = parse_new_player(&form).unwrap_err();
        assert_eq!(err.field, "Full name");

        let mut form = new_player_form(today());
        form.set("full_name", "Jane Doe");
        let err = parse_new_player(&form).unwrap_err();
        assert_eq!(err.field, "Position (winger, striker, ...)");
    }

    #[test]
    fn new_player_defaults_parse() {
        let mut form = new_player_form(today());
        form.set("full_name", "  Jane Doe ");
        form.set("position", "Winger");
        let p = parse_new_player(&form).unwrap();
        assert_eq!(p.full_name, "Jane Doe");
        assert_eq!(p.nationality, "Colombia");
        assert_eq!(p.birth_date, NaiveDate::from_ymd_opt(2005, 1, 1).unwrap());
        assert_eq!(p.height_cm, Some(175));
        assert_eq!(p.preferred_foot, Some(PreferredFoot::Right));
    }

    #[test]
    fn minutes_must_be_positive() {
        let mut form = stats_form(today());
        form.set("home_team", "Millonarios");
        form.set("away_team", "Santa Fe");
        form.set("minutes_played", "0");
        let err = parse_stats(&form).unwrap_err();
        assert_eq!(err.field, "Minutes played");
    }

    #[test]
    fn same_home_and_away_is_rejected() {
        let mut form = stats_form(today());
        form.set("home_team", "Nacional");
        form.set("away_team", "nacional");
        assert!(parse_stats(&form).is_err());
    }

    #[test]
    fn report_needs_strengths_and_weaknesses() {
        let mut form = report_form(today(), "Scout");
        form.set("strengths", "Acceleration");
        form.set("weaknesses", "  ");
        form.set("notes", "");
        let err = parse_report(&form).unwrap_err();
        assert_eq!(err.field, "Weaknesses");
        form.set("weaknesses", "Final third decisions");
        form.set("overall_rating", "11");
        assert!(parse_report(&form).is_err());
        form.set("overall_rating", "8");
        let report = parse_report(&form).unwrap();
        assert_eq!(report.overall_rating, 8.0);
        assert_eq!(report.scout_name.as_deref(), Some("Scout"));
        assert!(report.notes.is_none());
    }

    #[test]
    fn api_form_restores_known_competition_only() {
        let form = api_report_form(Some("Serie A"));
        assert_eq!(form.raw("competition"), "Serie A");
        let form = api_report_form(Some("Liga BetPlay"));
        assert_eq!(form.raw("competition"), SUPPORTED_COMPETITIONS[0].name);
    }

    #[test]
    fn profile_form_prefills_from_player() {
        let player = Player {
            player_id: 1,
            full_name: "Jane Doe".to_string(),
            birth_date: NaiveDate::from_ymd_opt(2005, 1, 1).unwrap(),
            nationality: "Colombia".to_string(),
            height_cm: Some(168),
            weight_kg: None,
            position: Some("Winger".to_string()),
            preferred_foot: Some("Left".to_string()),
        };
        let form = profile_form(&player);
        assert_eq!(form.raw("height_cm"), "168");
        assert_eq!(form.raw("weight_kg"), "70");
        assert_eq!(form.raw("preferred_foot"), "Left");
        let update = parse_player_update(&form).unwrap();
        assert_eq!(update.position.as_deref(), Some("Winger"));
    }

    #[test]
    fn stats_and_report_forms_start_prefilled() {
        let stats = stats_form(today());
        let (ctx, line) = parse_stats(&stats).unwrap();
        assert_eq!(ctx.home_team, DEFAULT_HOME_TEAM);
        assert_eq!(ctx.away_team, DEFAULT_AWAY_TEAM);
        assert_eq!(ctx.league_name, "Liga Colombiana A");
        assert_eq!(line.minutes_played, 90);

        let report = parse_report(&report_form(today(), "Andrés Barrero")).unwrap();
        assert_eq!(report.strengths.as_deref(), Some(DEFAULT_STRENGTHS));
        assert_eq!(report.weaknesses.as_deref(), Some(DEFAULT_WEAKNESSES));
        assert_eq!(report.recommended_role.as_deref(), Some(DEFAULT_ROLE));
        assert_eq!(report.notes.as_deref(), Some(DEFAULT_NOTES));
        assert_eq!(report.overall_rating, 7.5);
    }
}
