use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};
use rusqlite::Connection;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use scout_terminal::config::{self, AppConfig};
use scout_terminal::entry::{self, Registration};
use scout_terminal::error::ScoutError;
use scout_terminal::football_api::{FootballDataClient, competition_by_name};
use scout_terminal::forms::{FieldKind, Form};
use scout_terminal::persist;
use scout_terminal::reporting;
use scout_terminal::state::{AppState, Focus, ManageTab, Section, StatusKind};
use scout_terminal::{db, export, repo, summary};

struct App {
    state: AppState,
    conn: Connection,
    feed: FootballDataClient,
    export_dir: PathBuf,
    should_quit: bool,
}

impl App {
    fn new(cfg: &AppConfig, conn: Connection) -> Self {
        let today = Local::now().date_naive();
        let prefs = persist::load_prefs();
        let mut state = AppState::new(today, &prefs);
        state.env_label = format!("{} | {}", cfg.active, cfg.active_db().path.display());
        let feed = FootballDataClient::from_config(&cfg.football);
        if !feed.has_key() {
            state.push_log("[WARN] FOOTBALL_API_KEY not set; API scouting is unavailable");
        }
        let export_dir = cfg
            .active_db()
            .path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        let mut app = Self {
            state,
            conn,
            feed,
            export_dir,
            should_quit: false,
        };
        app.reload_players();
        app.reload_summary();
        app
    }

    fn reload_players(&mut self) {
        match repo::list_players(&self.conn) {
            Ok(players) => self.state.set_players(players),
            Err(err) => self
                .state
                .set_status(StatusKind::Error, format!("Could not load players: {err}")),
        }
    }

    fn reload_summary(&mut self) {
        match summary::load_summary(&self.conn) {
            Ok(rows) => self.state.set_summary(rows),
            Err(err) => self
                .state
                .set_status(StatusKind::Error, format!("Could not load summary: {err}")),
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
        {
            self.should_quit = true;
            return;
        }
        if key.code == KeyCode::F(1) {
            self.state.help_overlay = !self.state.help_overlay;
            return;
        }
        match self.state.focus {
            Focus::Sidebar => self.on_sidebar_key(key),
            Focus::Content => self.on_content_key(key),
        }
    }

    fn on_sidebar_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Char('j') | KeyCode::Down => self.state.section = self.state.section.next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.section = self.state.section.prev(),
            KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
                self.state.focus = Focus::Content;
                if self.state.section == Section::Summary {
                    self.reload_summary();
                }
            }
            _ => {}
        }
    }

    fn on_content_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.state.focus = Focus::Sidebar;
                return;
            }
            KeyCode::PageDown => {
                self.state.select_next_player();
                return;
            }
            KeyCode::PageUp => {
                self.state.select_prev_player();
                return;
            }
            KeyCode::F(2) if self.state.section == Section::ManagePlayer => {
                self.state.manage_tab = self.state.manage_tab.next();
                return;
            }
            _ => {}
        }

        if self.state.section == Section::Summary {
            match key.code {
                KeyCode::Char('j') | KeyCode::Down => self.state.select_next_summary(),
                KeyCode::Char('k') | KeyCode::Up => self.state.select_prev_summary(),
                KeyCode::Char('r') => {
                    self.reload_summary();
                    self.state.set_status(StatusKind::Info, "Summary refreshed");
                }
                KeyCode::Char('x') => self.export_summary(),
                _ => {}
            }
            return;
        }

        if key.code == KeyCode::Enter {
            self.submit();
            return;
        }
        let Some(form) = self.state.active_form_mut() else {
            return;
        };
        match key.code {
            KeyCode::Tab | KeyCode::Down => form.focus_next(),
            KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
            KeyCode::Left => form.cycle_choice(-1),
            KeyCode::Right => form.cycle_choice(1),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Char(ch) => form.input(ch),
            _ => {}
        }
    }

    fn submit(&mut self) {
        match self.state.section {
            Section::RegisterPlayer => self.submit_register(),
            Section::ManagePlayer => match self.state.manage_tab {
                ManageTab::Profile => self.submit_profile(),
                ManageTab::MatchStats => self.submit_stats(),
                ManageTab::Report => self.submit_report(),
            },
            Section::ApiScouting => self.submit_api_report(),
            Section::Summary => {}
        }
    }

    fn submit_register(&mut self) {
        match entry::register_player(&self.conn, &self.state.register_form) {
            Ok(Registration::Registered { player_id }) => {
                let name = self.state.register_form.raw("full_name").trim().to_string();
                self.reload_players();
                self.state.select_player_id(player_id);
                self.state.reset_register_form();
                self.state
                    .set_status(StatusKind::Success, format!("Player {name} added"));
            }
            Ok(Registration::AlreadyRegistered(existing)) => {
                self.state.set_status(
                    StatusKind::Warning,
                    format!(
                        "{} is already registered; use Manage player to update it or add a report",
                        existing.label()
                    ),
                );
            }
            Err(err) => self.report_error("Could not save player", err),
        }
    }

    fn submit_profile(&mut self) {
        let Some(player_id) = self.state.selected_player().map(|p| p.player_id) else {
            self.state
                .set_status(StatusKind::Info, "No players registered yet");
            return;
        };
        let Some(form) = self.state.profile_form.as_ref() else {
            return;
        };
        match entry::update_profile(&self.conn, player_id, form) {
            Ok(()) => {
                self.reload_players();
                self.state
                    .set_status(StatusKind::Success, "Player profile updated");
            }
            Err(err) => self.report_error("Could not update player", err),
        }
    }

    fn submit_stats(&mut self) {
        let Some(player_id) = self.state.selected_player().map(|p| p.player_id) else {
            self.state
                .set_status(StatusKind::Info, "No players registered yet");
            return;
        };
        match entry::record_match_stats(&mut self.conn, player_id, &self.state.stats_form) {
            Ok(match_id) => {
                self.state.reset_stats_numbers();
                self.state.set_status(
                    StatusKind::Success,
                    format!("Match statistics recorded (match #{match_id})"),
                );
            }
            Err(err) => self.report_error("Could not record statistics", err),
        }
    }

    fn submit_report(&mut self) {
        let Some(player_id) = self.state.selected_player().map(|p| p.player_id) else {
            self.state
                .set_status(StatusKind::Info, "No players registered yet");
            return;
        };
        match entry::add_scouting_report(&self.conn, player_id, &self.state.report_form) {
            Ok(_) => {
                self.state.reset_report_text();
                self.state
                    .set_status(StatusKind::Success, "Scouting report saved");
            }
            Err(err) => self.report_error("Could not save report", err),
        }
    }

    fn submit_api_report(&mut self) {
        let Some(player_id) = self.state.selected_player().map(|p| p.player_id) else {
            self.state
                .set_status(StatusKind::Info, "No players registered yet");
            return;
        };
        let competition = self.state.api_form.raw("competition").to_string();
        let Some(competition) = competition_by_name(&competition) else {
            self.state
                .set_status(StatusKind::Error, "Pick a supported competition");
            return;
        };
        let team_name = match self.state.api_form.required_text("team_name") {
            Ok(name) => name,
            Err(err) => {
                self.state.set_status(StatusKind::Error, err.to_string());
                return;
            }
        };
        self.state.push_log(format!(
            "[INFO] Looking up {team_name} in {}",
            competition.name
        ));
        match reporting::generate_contextual_report(
            &mut self.conn,
            &self.feed,
            player_id,
            &team_name,
            competition.id,
            self.state.today,
        ) {
            Ok(generated) => {
                self.state
                    .set_status(StatusKind::Success, generated.message());
            }
            Err(err) => {
                error!(%err, "contextual report failed");
                self.state
                    .set_status(StatusKind::Error, format!("Could not generate report: {err}"));
            }
        }
    }

    fn export_summary(&mut self) {
        let file = format!("scouting_summary_{}.xlsx", self.state.today.format("%Y%m%d"));
        let path = self.export_dir.join(file);
        match export::export_summary(&self.conn, &path) {
            Ok(report) => self.state.set_status(
                StatusKind::Success,
                format!(
                    "Exported {} players and {} reports to {}",
                    report.players,
                    report.reports,
                    path.display()
                ),
            ),
            Err(err) => self
                .state
                .set_status(StatusKind::Error, format!("Export failed: {err:#}")),
        }
    }

    fn report_error(&mut self, what: &str, err: ScoutError) {
        let kind = match err {
            ScoutError::Validation(_) | ScoutError::Conflict(_) => StatusKind::Warning,
            _ => StatusKind::Error,
        };
        if kind == StatusKind::Error {
            error!(%err, "{what}");
        }
        self.state.set_status(kind, format!("{what}: {err}"));
    }
}

fn main() -> Result<()> {
    config::load_env();
    let cfg = AppConfig::from_env()?;
    init_file_logging();

    let conn = db::open_db(&cfg.active_db().path).context("open active database")?;
    info!(env = %cfg.active, db = %cfg.active_db().path.display(), "scout terminal starting");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = App::new(&cfg, conn);
    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    persist::save_prefs(&app.state.prefs());
    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn init_file_logging() {
    let Some(dir) = config::app_data_dir() else {
        return;
    };
    if std::fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("scout_terminal.log"))
    else {
        return;
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let state = &app.state;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(8),
            Constraint::Length(1),
            Constraint::Length(6),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(format!(" SCOUT TERMINAL | {}", state.env_label))
        .style(Style::default().add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(22), Constraint::Min(30)])
        .split(chunks[1]);
    render_sidebar(frame, body[0], state);
    match state.section {
        Section::RegisterPlayer => render_form(frame, body[1], &state.register_form, state),
        Section::ManagePlayer => render_manage(frame, body[1], state),
        Section::ApiScouting => render_api(frame, body[1], state),
        Section::Summary => render_summary(frame, body[1], state),
    }

    frame.render_widget(status_paragraph(state), chunks[2]);

    let console = Paragraph::new(console_text(state, chunks[3].height.saturating_sub(2)))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[3]);

    let footer = Paragraph::new(footer_text(state)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[4]);

    if state.help_overlay {
        let area = frame.size();
        render_help_overlay(frame, area);
    }
}

fn render_sidebar(frame: &mut Frame, area: Rect, state: &AppState) {
    let lines: Vec<Line> = Section::ALL
        .iter()
        .map(|section| {
            let selected = *section == state.section;
            let prefix = if selected { "> " } else { "  " };
            let mut style = Style::default();
            if selected {
                style = style.add_modifier(Modifier::BOLD);
                if state.focus == Focus::Sidebar {
                    style = style.fg(Color::Black).bg(Color::Cyan);
                }
            }
            Line::from(Span::styled(format!("{prefix}{}", section.label()), style))
        })
        .collect();
    let border = if state.focus == Focus::Sidebar {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let sidebar = Paragraph::new(lines).block(
        Block::default()
            .title("Sections")
            .borders(Borders::ALL)
            .border_style(border),
    );
    frame.render_widget(sidebar, area);
}

fn content_block(title: String, state: &AppState) -> Block<'static> {
    let border = if state.focus == Focus::Content {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border)
}

fn render_form(frame: &mut Frame, area: Rect, form: &Form, state: &AppState) {
    let editing = state.focus == Focus::Content;
    let label_width = form
        .fields
        .iter()
        .map(|f| f.label.chars().count())
        .max()
        .unwrap_or(0)
        + 2;
    let lines: Vec<Line> = form
        .fields
        .iter()
        .enumerate()
        .map(|(idx, field)| {
            let focused = editing && idx == form.focus;
            let marker = if field.required { "*" } else { " " };
            let label = format!("{:<width$}", format!("{}{marker}", field.label), width = label_width);
            let value = match field.kind {
                FieldKind::Choice(_) => format!("< {} >", field.value),
                _ if focused => format!("{}_", field.value),
                _ => field.value.clone(),
            };
            let value_style = if focused {
                Style::default().fg(Color::Black).bg(Color::Yellow)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(label, Style::default().fg(Color::Gray)),
                Span::styled(value, value_style),
            ])
        })
        .collect();
    let paragraph = Paragraph::new(lines).block(content_block(form.title.to_string(), state));
    frame.render_widget(paragraph, area);
}

fn player_line(state: &AppState) -> String {
    match state.selected_player() {
        Some(p) => format!(
            "Player {}/{}: {}  (PgUp/PgDn to change)",
            state.player_selected + 1,
            state.players.len(),
            p.label()
        ),
        None => "No players registered yet".to_string(),
    }
}

fn render_manage(frame: &mut Frame, area: Rect, state: &AppState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);
    let tabs = [ManageTab::Profile, ManageTab::MatchStats, ManageTab::Report]
        .iter()
        .map(|tab| {
            if *tab == state.manage_tab {
                format!("[{}]", tab.label())
            } else {
                format!(" {} ", tab.label())
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    let top = Paragraph::new(format!("{}\n{tabs}  (F2 switches)", player_line(state)));
    frame.render_widget(top, rows[0]);

    match state.manage_tab {
        ManageTab::Profile => match state.profile_form.as_ref() {
            Some(form) => render_form(frame, rows[1], form, state),
            None => {
                let empty = Paragraph::new("No players registered yet")
                    .style(Style::default().fg(Color::DarkGray))
                    .block(content_block("Update profile".to_string(), state));
                frame.render_widget(empty, rows[1]);
            }
        },
        ManageTab::MatchStats => render_form(frame, rows[1], &state.stats_form, state),
        ManageTab::Report => render_form(frame, rows[1], &state.report_form, state),
    }
}

fn render_api(frame: &mut Frame, area: Rect, state: &AppState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(3)])
        .split(area);
    frame.render_widget(Paragraph::new(player_line(state)), rows[0]);
    render_form(frame, rows[1], &state.api_form, state);
}

fn render_summary(frame: &mut Frame, area: Rect, state: &AppState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(6)])
        .split(area);

    if state.summary.is_empty() {
        let empty = Paragraph::new("No players registered yet")
            .style(Style::default().fg(Color::DarkGray))
            .block(content_block("Scouting summary".to_string(), state));
        frame.render_widget(empty, rows[0]);
        return;
    }

    let header = Row::new(
        ["Player", "Pos", "Age", "Rating", "Min", "G", "A", "G/90", "A/90"]
            .into_iter()
            .map(Cell::from),
    )
    .style(Style::default().add_modifier(Modifier::BOLD));
    let body = state.summary.iter().enumerate().map(|(idx, s)| {
        let style = if idx == state.summary_selected {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else {
            Style::default()
        };
        Row::new(vec![
            Cell::from(s.full_name.clone()),
            Cell::from(s.position.clone().unwrap_or_default()),
            Cell::from(opt_cell(s.age)),
            Cell::from(s.scout_rating.map(|r| format!("{r:.1}")).unwrap_or_else(|| "-".to_string())),
            Cell::from(opt_cell(s.minutes_played)),
            Cell::from(opt_cell(s.goals)),
            Cell::from(opt_cell(s.assists)),
            Cell::from(s.goals_per_90.map(|r| format!("{r:.2}")).unwrap_or_else(|| "-".to_string())),
            Cell::from(s.assists_per_90.map(|r| format!("{r:.2}")).unwrap_or_else(|| "-".to_string())),
        ])
        .style(style)
    });
    let widths = [
        Constraint::Min(18),
        Constraint::Length(10),
        Constraint::Length(4),
        Constraint::Length(6),
        Constraint::Length(5),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(5),
        Constraint::Length(5),
    ];
    let table = Table::new(body, widths)
        .header(header)
        .block(content_block("Scouting summary".to_string(), state));
    frame.render_widget(table, rows[0]);

    let detail = state
        .summary
        .get(state.summary_selected)
        .map(|s| {
            format!(
                "Strengths: {}\nWeaknesses: {}\n{}",
                s.strengths_summary.as_deref().unwrap_or("-"),
                s.weaknesses_summary.as_deref().unwrap_or("-"),
                s.narrative
            )
        })
        .unwrap_or_default();
    let detail = Paragraph::new(detail)
        .wrap(Wrap { trim: true })
        .block(Block::default().title("Profile").borders(Borders::ALL));
    frame.render_widget(detail, rows[1]);
}

fn opt_cell(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn status_paragraph(state: &AppState) -> Paragraph<'static> {
    let Some(status) = &state.status else {
        return Paragraph::new("");
    };
    let color = match status.kind {
        StatusKind::Info => Color::Cyan,
        StatusKind::Success => Color::Green,
        StatusKind::Warning => Color::Yellow,
        StatusKind::Error => Color::Red,
    };
    Paragraph::new(format!(" {}", status.text)).style(Style::default().fg(color))
}

fn console_text(state: &AppState, height: u16) -> String {
    let start = state.logs.len().saturating_sub(height as usize);
    state
        .logs
        .iter()
        .skip(start)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn footer_text(state: &AppState) -> String {
    match (state.focus, state.section) {
        (Focus::Sidebar, _) => {
            "j/k/↑/↓ Section | Enter Open | F1/? Help | q Quit".to_string()
        }
        (Focus::Content, Section::Summary) => {
            "j/k/↑/↓ Move | r Refresh | x Export xlsx | Esc Back | Ctrl+Q Quit".to_string()
        }
        (Focus::Content, Section::ManagePlayer) => {
            "Tab/↑/↓ Field | ←/→ Choice | Enter Save | F2 Tab | PgUp/PgDn Player | Esc Back".to_string()
        }
        (Focus::Content, _) => {
            "Tab/↑/↓ Field | ←/→ Choice | Enter Save | PgUp/PgDn Player | Esc Back | Ctrl+Q Quit".to_string()
        }
    }
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup);
    let text = [
        "Sections",
        "  Register player   new player with identity check",
        "  Manage player     profile, match stats, scouting report",
        "  API scouting      report from the team's latest real match",
        "  Summary           per-90 rates and narrative per player",
        "",
        "Forms",
        "  Tab / ↑ / ↓       move between fields",
        "  ← / →             change a choice",
        "  Enter             validate and save",
        "  Esc               back to the section list",
        "",
        "F1 toggles this help. Ctrl+Q quits from anywhere.",
    ]
    .join("\n");
    let help = Paragraph::new(text).block(Block::default().title("Help").borders(Borders::ALL));
    frame.render_widget(help, popup);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
