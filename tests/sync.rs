use chrono::NaiveDate;
use rusqlite::Connection;
use tempfile::tempdir;
use scout_terminal::db;
use scout_terminal::records::{MatchContext, NewPlayer, NewReport, StatLine};
use scout_terminal::repo;
use scout_terminal::summary;
use scout_terminal::sync::{self, COPY_ORDER, SyncError};

fn seeded_source() -> Connection {
    let conn = db::open_memory_db().unwrap();
    let player_id = repo::insert_player(
        &conn,
        &NewPlayer {
            full_name: "Jane Doe".to_string(),
            birth_date: NaiveDate::from_ymd_opt(2005, 1, 1).unwrap(),
            nationality: "Colombia".to_string(),
            height_cm: Some(170),
            weight_kg: None,
            position: Some("Winger".to_string()),
            preferred_foot: None,
        },
    )
    .unwrap();
    // Leave a gap in the id sequence so id preservation is observable.
    conn.execute("DELETE FROM players WHERE player_id = ?1", [player_id])
        .unwrap();
    let player_id = repo::insert_player(
        &conn,
        &NewPlayer {
            full_name: "Jane Doe".to_string(),
            birth_date: NaiveDate::from_ymd_opt(2005, 1, 1).unwrap(),
            nationality: "Colombia".to_string(),
            height_cm: Some(170),
            weight_kg: None,
            position: Some("Winger".to_string()),
            preferred_foot: Some(scout_terminal::records::PreferredFoot::Right),
        },
    )
    .unwrap();
    assert_eq!(player_id, 2);

    let match_id = repo::create_match_from_context(
        &conn,
        &MatchContext {
            match_date: NaiveDate::from_ymd_opt(2026, 9, 20).unwrap(),
            league_name: "Liga X".to_string(),
            league_country: "Colombia".to_string(),
            venue: Some("El Campín".to_string()),
            home_team: "Club A".to_string(),
            away_team: "Club B".to_string(),
        },
    )
    .unwrap()
    .match_id;
    repo::insert_stats(
        &conn,
        match_id,
        player_id,
        &StatLine {
            minutes_played: 90,
            goals: 1,
            ..StatLine::default()
        },
    )
    .unwrap();
    repo::insert_scouting_report(
        &conn,
        player_id,
        &NewReport {
            report_date: NaiveDate::from_ymd_opt(2026, 9, 21).unwrap(),
            scout_name: Some("Andrés Barrero".to_string()),
            overall_rating: 7.8,
            strengths: Some("Pace".to_string()),
            weaknesses: Some("Finishing".to_string()),
            recommended_role: None,
            notes: None,
        },
    )
    .unwrap();
    conn
}

fn assert_tables_equal(source: &Connection, target: &Connection) {
    for table in COPY_ORDER {
        let (src_cols, src_rows) = sync::fetch_all_rows(source, table).unwrap();
        let (dst_cols, dst_rows) = sync::fetch_all_rows(target, table).unwrap();
        assert_eq!(src_cols, dst_cols, "columns of {table}");
        assert_eq!(src_rows, dst_rows, "rows of {table}");
    }
}

#[test]
fn full_copy_replaces_target_rows_and_keeps_ids() {
    let source = seeded_source();
    let mut target = db::open_memory_db().unwrap();
    repo::get_or_create_league(&target, "Stale League", "Nowhere", None).unwrap();
    repo::get_or_create_league(&target, "Other Stale League", "Nowhere", None).unwrap();

    let summary = sync::sync_databases(&source, &mut target).unwrap();
    assert!(summary.created_tables.is_empty());
    assert_eq!(summary.copied.len(), COPY_ORDER.len());
    assert_eq!(summary.total_rows(), 1 + 2 + 1 + 1 + 1 + 1);

    assert_tables_equal(&source, &target);
    let players = repo::list_players(&target).unwrap();
    assert_eq!(players.len(), 1);
    assert_eq!(players[0].player_id, 2);
}

#[test]
fn running_twice_is_stable() {
    let source = seeded_source();
    let mut target = db::open_memory_db().unwrap();
    sync::sync_databases(&source, &mut target).unwrap();
    let second = sync::sync_databases(&source, &mut target).unwrap();
    assert_eq!(second.total_rows(), 7);
    assert_tables_equal(&source, &target);
}

#[test]
fn missing_tables_are_created_from_source_ddl() {
    let source = seeded_source();
    let mut target = Connection::open_in_memory().unwrap();
    target.execute_batch("PRAGMA foreign_keys = ON;").unwrap();

    let summary = sync::sync_databases(&source, &mut target).unwrap();
    let mut created = summary.created_tables.clone();
    created.sort();
    let mut expected: Vec<String> = COPY_ORDER.iter().map(|t| t.to_string()).collect();
    expected.sort();
    assert_eq!(created, expected);
    // Parents come before the tables that reference them.
    let pos = |t: &str| summary.created_tables.iter().position(|c| c == t).unwrap();
    assert!(pos("leagues") < pos("teams"));
    assert!(pos("teams") < pos("matches"));
    assert!(pos("matches") < pos("stats"));

    assert_tables_equal(&source, &target);
    let index_count: i64 = target
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = 'idx_stats_player'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(index_count, 1);
}

#[test]
fn summary_view_is_rebuilt_on_target() {
    let source = seeded_source();
    let mut target = db::open_memory_db().unwrap();
    target
        .execute_batch(&format!(
            "DROP VIEW {view}; CREATE VIEW {view} AS SELECT 1 AS player_id;",
            view = summary::SUMMARY_VIEW
        ))
        .unwrap();

    sync::sync_databases(&source, &mut target).unwrap();
    let rows = summary::load_summary(&target).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].full_name, "Jane Doe");
    assert_eq!(rows[0].goals_per_90, Some(1.0));
    assert_eq!(rows[0].scout_rating, Some(7.8));
}

#[test]
fn failed_copy_rolls_back_every_table() {
    let source = seeded_source();
    let mut target = db::open_memory_db().unwrap();
    target
        .execute_batch(
            "DROP VIEW IF EXISTS player_scouting_summary;
             DROP TABLE scouting_reports;
             CREATE TABLE scouting_reports (
                 report_id INTEGER PRIMARY KEY AUTOINCREMENT,
                 player_id INTEGER NOT NULL REFERENCES players(player_id) ON DELETE CASCADE,
                 report_date TEXT NOT NULL,
                 scout_name TEXT NULL,
                 overall_rating REAL NOT NULL,
                 strengths TEXT NULL,
                 weaknesses TEXT NULL,
                 recommended_role TEXT NULL,
                 notes TEXT NULL,
                 reviewed_by TEXT NOT NULL
             );",
        )
        .unwrap();
    let kept = repo::get_or_create_league(&target, "Kept League", "Peru", None).unwrap();

    let err = sync::sync_databases(&source, &mut target).unwrap_err();
    assert!(matches!(err, SyncError::Copy { ref table, .. } if table == "scouting_reports"));

    let leagues = sync::fetch_all_rows(&target, "leagues").unwrap().1;
    assert_eq!(leagues.len(), 1);
    assert_eq!(repo::league_by_id(&target, kept).unwrap().unwrap().name, "Kept League");
    assert_eq!(repo::count_rows(&target, "players").unwrap(), 0);
    assert_eq!(repo::count_rows(&target, "matches").unwrap(), 0);
}

#[test]
fn new_rows_after_sync_continue_the_source_sequence() {
    let source = seeded_source();
    // Deleting the newest row leaves the counter above the highest id.
    let temp = repo::get_or_create_league(&source, "Temp League", "Chile", None).unwrap();
    source
        .execute("DELETE FROM leagues WHERE league_id = ?1", [temp])
        .unwrap();
    let source_seq = sync::sequence_value(&source, "leagues").unwrap().unwrap();
    assert_eq!(source_seq, temp);

    let mut target = db::open_memory_db().unwrap();
    for name in ["Old A", "Old B", "Old C", "Old D"] {
        repo::get_or_create_league(&target, name, "Peru", None).unwrap();
    }
    sync::sync_databases(&source, &mut target).unwrap();

    assert_eq!(
        sync::sequence_value(&target, "leagues").unwrap(),
        Some(source_seq)
    );
    let fresh = repo::get_or_create_league(&target, "Liga Nueva", "Ecuador", None).unwrap();
    assert_eq!(fresh, source_seq + 1);
    assert_eq!(
        sync::sequence_value(&target, "players").unwrap(),
        sync::sequence_value(&source, "players").unwrap()
    );
}

fn seed_file(path: &std::path::Path) {
    let mut file = db::connect(path).unwrap();
    db::init_schema(&file).unwrap();
    sync::sync_databases(&seeded_source(), &mut file).unwrap();
    file.close().unwrap();
}

#[test]
fn run_copies_between_files_and_releases_both() {
    let dir = tempdir().unwrap();
    let source_path = dir.path().join("dev.db");
    let target_path = dir.path().join("prod.db");
    seed_file(&source_path);

    let summary = sync::run(&source_path, &target_path).expect("sync should succeed");
    assert_eq!(summary.copied.len(), COPY_ORDER.len());

    let source = db::connect(&source_path).unwrap();
    let target = db::connect(&target_path).unwrap();
    assert_tables_equal(&source, &target);
}

#[test]
fn run_with_missing_source_leaves_target_untouched() {
    let dir = tempdir().unwrap();
    let source_path = dir.path().join("missing.db");
    let target_path = dir.path().join("prod.db");

    assert!(sync::run(&source_path, &target_path).is_none());
    assert!(!target_path.exists());
}

#[test]
fn run_with_failing_target_rolls_back_and_closes() {
    let dir = tempdir().unwrap();
    let source_path = dir.path().join("dev.db");
    let target_path = dir.path().join("prod.db");
    seed_file(&source_path);
    {
        let target = db::open_db(&target_path).unwrap();
        target
            .execute_batch(
                "DROP VIEW IF EXISTS player_scouting_summary;
                 DROP TABLE scouting_reports;
                 CREATE TABLE scouting_reports (
                     report_id INTEGER PRIMARY KEY AUTOINCREMENT,
                     player_id INTEGER NOT NULL REFERENCES players(player_id) ON DELETE CASCADE,
                     report_date TEXT NOT NULL,
                     scout_name TEXT NULL,
                     overall_rating REAL NOT NULL,
                     strengths TEXT NULL,
                     weaknesses TEXT NULL,
                     recommended_role TEXT NULL,
                     notes TEXT NULL,
                     reviewed_by TEXT NOT NULL
                 );",
            )
            .unwrap();
        repo::get_or_create_league(&target, "Kept League", "Peru", None).unwrap();
        target.close().unwrap();
    }

    assert!(sync::run(&source_path, &target_path).is_none());

    // A released handle lets a writer take the lock straight away.
    let target = db::connect(&target_path).unwrap();
    target.execute_batch("BEGIN IMMEDIATE; COMMIT;").unwrap();
    let leagues = sync::fetch_all_rows(&target, "leagues").unwrap().1;
    assert_eq!(leagues.len(), 1);
    assert_eq!(repo::count_rows(&target, "players").unwrap(), 0);
}
