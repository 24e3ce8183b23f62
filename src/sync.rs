//! Copies one scouting database onto another: creates tables the target lacks, rebuilds the
//! summary view, then truncates and reloads every table in [`COPY_ORDER`]. All target changes
//! happen in a single transaction, so a failure leaves the target untouched.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Transaction, params, params_from_iter};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::db::{self, quote_ident};
use crate::error::ScoutError;
use crate::summary;

/// Parents before children; checked against the source FK graph before any write.
pub const COPY_ORDER: [&str; 6] = [
    "leagues",
    "teams",
    "players",
    "matches",
    "stats",
    "scouting_reports",
];

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("copy order lists {table} before {references}, which it references")]
    CopyOrder { table: String, references: String },
    #[error("source database has no table {0}")]
    MissingSourceTable(String),
    #[error("schema reconciliation failed for {table}: {source}")]
    Schema {
        table: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("rebuilding the summary view failed: {0}")]
    View(#[source] ScoutError),
    #[error("copying {table} failed: {source}")]
    Copy {
        table: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error(transparent)]
    Db(#[from] rusqlite::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCopy {
    pub table: String,
    pub rows: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub created_tables: Vec<String>,
    pub copied: Vec<TableCopy>,
}

impl SyncSummary {
    pub fn total_rows(&self) -> usize {
        self.copied.iter().map(|c| c.rows).sum()
    }
}

/// Opens both databases, runs [`sync_databases`] and closes whatever was opened. Every failure
/// is logged here and reported as `None`; the target is left as it was.
pub fn run(source_path: &Path, target_path: &Path) -> Option<SyncSummary> {
    info!(
        source = %source_path.display(),
        target = %target_path.display(),
        "starting database sync"
    );
    let source = match db::connect_read_only(source_path) {
        Ok(conn) => conn,
        Err(err) => {
            error!(err = %format!("{err:#}"), "opening source database failed");
            return None;
        }
    };
    let mut target = match db::connect(target_path) {
        Ok(conn) => conn,
        Err(err) => {
            error!(err = %format!("{err:#}"), "opening target database failed");
            close_connection(source, "source");
            return None;
        }
    };

    let outcome = match sync_databases(&source, &mut target) {
        Ok(summary) => {
            if !summary.created_tables.is_empty() {
                info!(tables = ?summary.created_tables, "created missing tables");
            }
            for copy in &summary.copied {
                info!(table = %copy.table, rows = copy.rows, "table synced");
            }
            info!(rows = summary.total_rows(), "sync finished");
            Some(summary)
        }
        Err(err) => {
            error!(%err, "sync failed, target rolled back");
            None
        }
    };

    close_connection(source, "source");
    close_connection(target, "target");
    outcome
}

fn close_connection(conn: Connection, label: &str) {
    match conn.close() {
        Ok(()) => debug!(db = label, "connection closed"),
        Err((_, err)) => warn!(db = label, %err, "closing database failed"),
    }
}

/// Runs the whole sync. On error the target transaction is rolled back on drop.
pub fn sync_databases(source: &Connection, target: &mut Connection) -> Result<SyncSummary, SyncError> {
    verify_copy_order(source, &COPY_ORDER)?;

    let tx = target.transaction()?;
    let created_tables = reconcile_schema(source, &tx)?;
    summary::rebuild_summary_view(&tx).map_err(SyncError::View)?;
    info!(view = summary::SUMMARY_VIEW, "summary view rebuilt");

    let mut copied = Vec::with_capacity(COPY_ORDER.len());
    for table in COPY_ORDER {
        info!(table, "copying table");
        let rows = copy_table(source, &tx, table)?;
        copied.push(TableCopy {
            table: table.to_string(),
            rows,
        });
    }
    tx.commit()?;

    Ok(SyncSummary {
        created_tables,
        copied,
    })
}

/// User tables of a database (excludes SQLite internals such as `sqlite_sequence`).
pub fn user_tables(conn: &Connection) -> rusqlite::Result<BTreeSet<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
    )?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    rows.collect()
}

/// Creates every table present in `source` but missing from `target`, with its indexes,
/// using the source's own DDL. Returns the created table names.
pub fn reconcile_schema(source: &Connection, target: &Connection) -> Result<Vec<String>, SyncError> {
    let source_tables = user_tables(source)?;
    let target_tables = user_tables(target)?;
    let missing: Vec<String> = source_tables
        .difference(&target_tables)
        .cloned()
        .collect();
    if missing.is_empty() {
        return Ok(missing);
    }
    info!(tables = ?missing, "tables missing on target");

    // Parents first, so REFERENCES clauses resolve if the target enforces them at create time.
    let ordered = order_missing_tables(source, &missing)?;
    for table in &ordered {
        for ddl in table_ddl(source, table)? {
            target
                .execute_batch(&ddl)
                .map_err(|source| SyncError::Schema {
                    table: table.clone(),
                    source,
                })?;
        }
        debug!(table = %table, "table created on target");
    }
    Ok(ordered)
}

/// `CREATE TABLE` followed by the table's explicit `CREATE INDEX` statements.
fn table_ddl(conn: &Connection, table: &str) -> Result<Vec<String>, SyncError> {
    let mut stmt = conn.prepare(
        "SELECT sql FROM sqlite_master
         WHERE tbl_name = ?1 AND type IN ('table', 'index') AND sql IS NOT NULL
         ORDER BY CASE type WHEN 'table' THEN 0 ELSE 1 END, name",
    )?;
    let rows = stmt.query_map(params![table], |row| row.get::<_, String>(0))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    if out.is_empty() {
        return Err(SyncError::MissingSourceTable(table.to_string()));
    }
    Ok(out)
}

fn order_missing_tables(conn: &Connection, missing: &[String]) -> Result<Vec<String>, SyncError> {
    let wanted: HashSet<&str> = missing.iter().map(String::as_str).collect();
    let mut graph: HashMap<String, Vec<String>> = HashMap::new();
    for table in missing {
        graph.insert(table.clone(), referenced_tables(conn, table)?);
    }

    let mut ordered = Vec::with_capacity(missing.len());
    let mut done: HashSet<String> = HashSet::new();
    while ordered.len() < missing.len() {
        let before = ordered.len();
        for table in missing {
            if done.contains(table) {
                continue;
            }
            let ready = graph[table]
                .iter()
                .all(|p| p == table || done.contains(p) || !wanted.contains(p.as_str()));
            if ready {
                done.insert(table.clone());
                ordered.push(table.clone());
            }
        }
        if ordered.len() == before {
            // Cycle: fall back to name order for the remainder.
            for table in missing {
                if done.insert(table.clone()) {
                    ordered.push(table.clone());
                }
            }
        }
    }
    Ok(ordered)
}

/// Tables that `table` points at through foreign keys.
pub fn referenced_tables(conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT DISTINCT \"table\" FROM pragma_foreign_key_list(?1)")?;
    let rows = stmt.query_map(params![table], |row| row.get::<_, String>(0))?;
    rows.collect()
}

/// Tables that point at `table` through foreign keys.
pub fn dependent_tables(conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT m.name
         FROM sqlite_master m, pragma_foreign_key_list(m.name) f
         WHERE m.type = 'table' AND f.\"table\" = ?1 AND m.name <> ?1
         ORDER BY m.name",
    )?;
    let rows = stmt.query_map(params![table], |row| row.get::<_, String>(0))?;
    rows.collect()
}

/// Fails when a table in `order` comes before a table it references.
pub fn verify_copy_order(conn: &Connection, order: &[&str]) -> Result<(), SyncError> {
    let position: HashMap<&str, usize> = order.iter().enumerate().map(|(i, t)| (*t, i)).collect();
    for (idx, table) in order.iter().enumerate() {
        for parent in referenced_tables(conn, table)? {
            if parent == *table {
                continue;
            }
            if let Some(&parent_idx) = position.get(parent.as_str()) {
                if parent_idx > idx {
                    return Err(SyncError::CopyOrder {
                        table: table.to_string(),
                        references: parent,
                    });
                }
            }
        }
    }
    Ok(())
}

/// Empties `table` and its dependents (children first) and resets AUTOINCREMENT counters.
pub fn truncate_table(tx: &Transaction<'_>, table: &str) -> rusqlite::Result<()> {
    let mut visited = HashSet::new();
    truncate_cascade(tx, table, &mut visited)
}

fn truncate_cascade(
    conn: &Connection,
    table: &str,
    visited: &mut HashSet<String>,
) -> rusqlite::Result<()> {
    if !visited.insert(table.to_string()) {
        return Ok(());
    }
    for child in dependent_tables(conn, table)? {
        truncate_cascade(conn, &child, visited)?;
    }
    conn.execute(&format!("DELETE FROM {}", quote_ident(table)), [])?;
    if has_sequence_table(conn)? {
        conn.execute("DELETE FROM sqlite_sequence WHERE name = ?1", params![table])?;
    }
    Ok(())
}

fn has_sequence_table(conn: &Connection) -> rusqlite::Result<bool> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'sqlite_sequence'",
        [],
        |row| row.get(0),
    )?;
    Ok(n > 0)
}

/// Reads every row of `table` with its column names.
pub fn fetch_all_rows(
    conn: &Connection,
    table: &str,
) -> rusqlite::Result<(Vec<String>, Vec<Vec<Value>>)> {
    let mut stmt = conn.prepare(&format!("SELECT * FROM {}", quote_ident(table)))?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();
    let width = columns.len();
    let rows = stmt.query_map([], |row| {
        let mut values = Vec::with_capacity(width);
        for idx in 0..width {
            values.push(row.get::<_, Value>(idx)?);
        }
        Ok(values)
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok((columns, out))
}

/// AUTOINCREMENT counter of `table`, if the database keeps one.
pub fn sequence_value(conn: &Connection, table: &str) -> rusqlite::Result<Option<i64>> {
    if !has_sequence_table(conn)? {
        return Ok(None);
    }
    conn.query_row(
        "SELECT seq FROM sqlite_sequence WHERE name = ?1",
        params![table],
        |row| row.get(0),
    )
    .optional()
}

/// Sets the target counter to the source's so new ids continue where the source left off.
fn copy_sequence(source: &Connection, tx: &Transaction<'_>, table: &str) -> rusqlite::Result<()> {
    let Some(seq) = sequence_value(source, table)? else {
        return Ok(());
    };
    if !has_sequence_table(tx)? {
        return Ok(());
    }
    tx.execute("DELETE FROM sqlite_sequence WHERE name = ?1", params![table])?;
    tx.execute(
        "INSERT INTO sqlite_sequence (name, seq) VALUES (?1, ?2)",
        params![table, seq],
    )?;
    Ok(())
}

/// Bulk insert with an explicit column list. No-op for an empty row set.
pub fn insert_rows(
    conn: &Connection,
    table: &str,
    columns: &[String],
    rows: &[Vec<Value>],
) -> rusqlite::Result<usize> {
    if rows.is_empty() || columns.is_empty() {
        return Ok(0);
    }
    let column_list = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=columns.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let mut stmt = conn.prepare(&format!(
        "INSERT INTO {} ({column_list}) VALUES ({placeholders})",
        quote_ident(table)
    ))?;
    for row in rows {
        stmt.execute(params_from_iter(row.iter()))?;
    }
    Ok(rows.len())
}

fn copy_table(source: &Connection, tx: &Transaction<'_>, table: &str) -> Result<usize, SyncError> {
    let wrap = |source: rusqlite::Error| SyncError::Copy {
        table: table.to_string(),
        source,
    };
    let (columns, rows) = fetch_all_rows(source, table).map_err(wrap)?;
    truncate_table(tx, table).map_err(wrap)?;
    let n = insert_rows(tx, table, &columns, &rows).map_err(wrap)?;
    copy_sequence(source, tx, table).map_err(wrap)?;
    debug!(table, rows = n, "table reloaded");
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[test]
    fn fixed_order_satisfies_schema_fk_graph() {
        let conn = db::open_memory_db().unwrap();
        verify_copy_order(&conn, &COPY_ORDER).unwrap();
    }

    #[test]
    fn order_with_child_first_is_rejected() {
        let conn = db::open_memory_db().unwrap();
        let err = verify_copy_order(&conn, &["teams", "leagues"]).unwrap_err();
        assert!(matches!(
            err,
            SyncError::CopyOrder { ref table, ref references }
                if table == "teams" && references == "leagues"
        ));
    }

    #[test]
    fn dependents_follow_foreign_keys() {
        let conn = db::open_memory_db().unwrap();
        assert_eq!(dependent_tables(&conn, "leagues").unwrap(), vec!["matches", "teams"]);
        assert_eq!(
            dependent_tables(&conn, "players").unwrap(),
            vec!["scouting_reports", "stats"]
        );
        assert!(dependent_tables(&conn, "stats").unwrap().is_empty());
    }

    #[test]
    fn insert_rows_skips_empty_sets() {
        let conn = db::open_memory_db().unwrap();
        assert_eq!(insert_rows(&conn, "leagues", &[], &[]).unwrap(), 0);
    }
}
