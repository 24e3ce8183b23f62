use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::records::ScoutingReport;
use crate::repo;
use crate::summary::{self, PlayerSummary};

pub struct ExportReport {
    pub players: usize,
    pub reports: usize,
}

/// Writes the summary view and every scouting report to an `.xlsx` workbook.
pub fn export_summary(conn: &Connection, path: &Path) -> Result<ExportReport> {
    let summaries = summary::load_summary(conn).context("load summary view")?;
    let reports = repo::list_reports(conn, None).context("load scouting reports")?;
    let names: std::collections::HashMap<i64, String> = summaries
        .iter()
        .map(|s| (s.player_id, s.full_name.clone()))
        .collect();

    let mut summary_rows = vec![vec![
        "Player ID".to_string(),
        "Player".to_string(),
        "Position".to_string(),
        "Nationality".to_string(),
        "Age".to_string(),
        "Scout Rating".to_string(),
        "Minutes".to_string(),
        "Goals".to_string(),
        "Assists".to_string(),
        "Goals/90".to_string(),
        "Assists/90".to_string(),
        "Strengths".to_string(),
        "Weaknesses".to_string(),
        "Narrative".to_string(),
    ]];
    summary_rows.extend(summaries.iter().map(summary_row));

    let mut report_rows = vec![vec![
        "Report ID".to_string(),
        "Player ID".to_string(),
        "Player".to_string(),
        "Date".to_string(),
        "Scout".to_string(),
        "Rating".to_string(),
        "Strengths".to_string(),
        "Weaknesses".to_string(),
        "Recommended Role".to_string(),
        "Notes".to_string(),
    ]];
    report_rows.extend(
        reports
            .iter()
            .map(|r| report_row(r, names.get(&r.player_id).map(String::as_str))),
    );

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Summary").context("name summary sheet")?;
        write_rows(sheet, &summary_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Reports").context("name reports sheet")?;
        write_rows(sheet, &report_rows)?;
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    workbook
        .save(path)
        .with_context(|| format!("save workbook {}", path.display()))?;

    Ok(ExportReport {
        players: summaries.len(),
        reports: reports.len(),
    })
}

fn summary_row(s: &PlayerSummary) -> Vec<String> {
    vec![
        s.player_id.to_string(),
        s.full_name.clone(),
        s.position.clone().unwrap_or_default(),
        s.nationality.clone(),
        opt_to_string(s.age),
        s.scout_rating.map(|r| format!("{r:.1}")).unwrap_or_default(),
        opt_to_string(s.minutes_played),
        opt_to_string(s.goals),
        opt_to_string(s.assists),
        s.goals_per_90.map(|r| format!("{r:.2}")).unwrap_or_default(),
        s.assists_per_90.map(|r| format!("{r:.2}")).unwrap_or_default(),
        s.strengths_summary.clone().unwrap_or_default(),
        s.weaknesses_summary.clone().unwrap_or_default(),
        s.narrative.clone(),
    ]
}

fn report_row(r: &ScoutingReport, player: Option<&str>) -> Vec<String> {
    vec![
        r.report_id.to_string(),
        r.player_id.to_string(),
        player.unwrap_or_default().to_string(),
        r.report_date.to_string(),
        r.scout_name.clone().unwrap_or_default(),
        format!("{:.1}", r.overall_rating),
        r.strengths.clone().unwrap_or_default(),
        r.weaknesses.clone().unwrap_or_default(),
        r.recommended_role.clone().unwrap_or_default(),
        r.notes.clone().unwrap_or_default(),
    ]
}

fn opt_to_string<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
