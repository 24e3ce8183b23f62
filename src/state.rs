use std::collections::VecDeque;

use chrono::NaiveDate;

use crate::entry;
use crate::forms::Form;
use crate::persist::UiPrefs;
use crate::records::Player;
use crate::summary::PlayerSummary;

pub const DEFAULT_SCOUT_NAME: &str = "Andrés Barrero";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    RegisterPlayer,
    ManagePlayer,
    ApiScouting,
    Summary,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Self::RegisterPlayer,
        Self::ManagePlayer,
        Self::ApiScouting,
        Self::Summary,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::RegisterPlayer => "Register player",
            Self::ManagePlayer => "Manage player",
            Self::ApiScouting => "API scouting",
            Self::Summary => "Summary",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label)
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|s| *s == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Sidebar,
    Content,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManageTab {
    Profile,
    MatchStats,
    Report,
}

impl ManageTab {
    pub fn label(self) -> &'static str {
        match self {
            Self::Profile => "Profile",
            Self::MatchStats => "Match stats",
            Self::Report => "Scouting report",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Profile => Self::MatchStats,
            Self::MatchStats => Self::Report,
            Self::Report => Self::Profile,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub kind: StatusKind,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub today: NaiveDate,
    pub section: Section,
    pub focus: Focus,
    pub players: Vec<Player>,
    pub player_selected: usize,
    pub manage_tab: ManageTab,
    pub register_form: Form,
    pub profile_form: Option<Form>,
    pub stats_form: Form,
    pub report_form: Form,
    pub api_form: Form,
    pub summary: Vec<PlayerSummary>,
    pub summary_selected: usize,
    pub status: Option<StatusLine>,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    pub env_label: String,
}

impl AppState {
    pub fn new(today: NaiveDate, prefs: &UiPrefs) -> Self {
        let scout = prefs
            .scout_name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_SCOUT_NAME);
        Self {
            today,
            section: prefs
                .section
                .as_deref()
                .and_then(Section::from_label)
                .unwrap_or(Section::RegisterPlayer),
            focus: Focus::Sidebar,
            players: Vec::new(),
            player_selected: 0,
            manage_tab: ManageTab::Profile,
            register_form: entry::new_player_form(today),
            profile_form: None,
            stats_form: entry::stats_form(today),
            report_form: entry::report_form(today, scout),
            api_form: entry::api_report_form(prefs.competition.as_deref()),
            summary: Vec::new(),
            summary_selected: 0,
            status: None,
            logs: VecDeque::new(),
            help_overlay: false,
            env_label: String::new(),
        }
    }

    pub fn prefs(&self) -> UiPrefs {
        UiPrefs {
            version: 0,
            section: Some(self.section.label().to_string()),
            scout_name: self
                .report_form
                .field("scout_name")
                .and_then(|f| f.trimmed())
                .map(str::to_string),
            competition: Some(self.api_form.raw("competition").to_string()),
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn set_status(&mut self, kind: StatusKind, text: impl Into<String>) {
        let text = text.into();
        let prefix = match kind {
            StatusKind::Info => "[INFO]",
            StatusKind::Success => "[OK]",
            StatusKind::Warning => "[WARN]",
            StatusKind::Error => "[ERR]",
        };
        self.push_log(format!("{prefix} {text}"));
        self.status = Some(StatusLine { kind, text });
    }

    /// Replaces the player list, keeping the current selection by id when it still exists.
    pub fn set_players(&mut self, players: Vec<Player>) {
        let keep = self.selected_player().map(|p| p.player_id);
        self.players = players;
        self.player_selected = keep
            .and_then(|id| self.players.iter().position(|p| p.player_id == id))
            .unwrap_or(0)
            .min(self.players.len().saturating_sub(1));
        self.refresh_profile_form();
    }

    pub fn select_player_id(&mut self, player_id: i64) {
        if let Some(idx) = self.players.iter().position(|p| p.player_id == player_id) {
            self.player_selected = idx;
            self.refresh_profile_form();
        }
    }

    pub fn selected_player(&self) -> Option<&Player> {
        self.players.get(self.player_selected)
    }

    pub fn select_next_player(&mut self) {
        if self.players.is_empty() {
            return;
        }
        self.player_selected = (self.player_selected + 1) % self.players.len();
        self.refresh_profile_form();
    }

    pub fn select_prev_player(&mut self) {
        if self.players.is_empty() {
            return;
        }
        self.player_selected = (self.player_selected + self.players.len() - 1) % self.players.len();
        self.refresh_profile_form();
    }

    fn refresh_profile_form(&mut self) {
        self.profile_form = self.selected_player().map(entry::profile_form);
    }

    pub fn set_summary(&mut self, rows: Vec<PlayerSummary>) {
        self.summary = rows;
        self.summary_selected = self
            .summary_selected
            .min(self.summary.len().saturating_sub(1));
    }

    pub fn select_next_summary(&mut self) {
        if !self.summary.is_empty() {
            self.summary_selected = (self.summary_selected + 1).min(self.summary.len() - 1);
        }
    }

    pub fn select_prev_summary(&mut self) {
        self.summary_selected = self.summary_selected.saturating_sub(1);
    }

    /// The form that receives keystrokes in the current section, if any.
    pub fn active_form(&self) -> Option<&Form> {
        match self.section {
            Section::RegisterPlayer => Some(&self.register_form),
            Section::ManagePlayer => match self.manage_tab {
                ManageTab::Profile => self.profile_form.as_ref(),
                ManageTab::MatchStats => Some(&self.stats_form),
                ManageTab::Report => Some(&self.report_form),
            },
            Section::ApiScouting => Some(&self.api_form),
            Section::Summary => None,
        }
    }

    pub fn active_form_mut(&mut self) -> Option<&mut Form> {
        match self.section {
            Section::RegisterPlayer => Some(&mut self.register_form),
            Section::ManagePlayer => match self.manage_tab {
                ManageTab::Profile => self.profile_form.as_mut(),
                ManageTab::MatchStats => Some(&mut self.stats_form),
                ManageTab::Report => Some(&mut self.report_form),
            },
            Section::ApiScouting => Some(&mut self.api_form),
            Section::Summary => None,
        }
    }

    pub fn reset_register_form(&mut self) {
        self.register_form = entry::new_player_form(self.today);
    }

    /// Clears the per-match numbers but keeps league and teams for the next line.
    pub fn reset_stats_numbers(&mut self) {
        let fresh = entry::stats_form(self.today);
        for key in [
            "minutes_played",
            "goals",
            "assists",
            "shots",
            "passes",
            "tackles",
            "yellow_cards",
            "red_cards",
        ] {
            self.stats_form.set(key, fresh.raw(key));
        }
    }

    /// Restores the text fields to their defaults; date, scout and rating stay.
    pub fn reset_report_text(&mut self) {
        let fresh = entry::report_form(self.today, DEFAULT_SCOUT_NAME);
        for key in ["strengths", "weaknesses", "recommended_role", "notes"] {
            self.report_form.set(key, fresh.raw(key));
        }
    }
}
