//! Main TUI application.
//!
//! `App` owns all render state and lives on the presentation thread. Workers
//! never touch it; they send `AppEvent`s which the main loop feeds to
//! `handle_event`. Requests going the other way (refresh, cancel) are queued
//! as `Action`s for the main loop to dispatch.

use crate::components::{
    DataTable, Footer, FooterMode, Header, LoadingScreen, UnavailableScreen,
};
use crate::rows::{TableRow, render_rows};
use crate::table::DiffTable;
use crate::ui::Theme;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};
use sqtop_slurm::{ClusterNode, Job, PriorityRow, UserStats, validate_job_id};
use sqtop_state::{CacheStats, ClusterView, JobCache, LoadProgress, LoadStep, StepStatus};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How long a status message stays in the footer.
const STATUS_TTL: Duration = Duration::from_secs(4);

/// Result of one refresh cycle, stamped with a monotonic generation.
#[derive(Debug, Clone)]
pub struct DashboardUpdate {
    pub generation: u64,
    pub view: ClusterView,
    /// Sources that failed this cycle and fell back to older data
    pub warnings: Vec<String>,
}

/// Messages from workers to the presentation thread.
#[derive(Debug, Clone)]
pub enum AppEvent {
    Progress(LoadStep, StepStatus),
    Update(DashboardUpdate),
    Unavailable(String),
    CancelFinished {
        job_id: String,
        result: Result<(), String>,
    },
}

/// Requests from the UI for the main loop to carry out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Refresh,
    Cancel(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Jobs,
    Nodes,
    Users,
    Priority,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Jobs, Tab::Nodes, Tab::Users, Tab::Priority];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Jobs => "Jobs",
            Tab::Nodes => "Nodes",
            Tab::Users => "Users",
            Tab::Priority => "Priority",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Tab::Jobs => Tab::Nodes,
            Tab::Nodes => Tab::Users,
            Tab::Users => Tab::Priority,
            Tab::Priority => Tab::Jobs,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            Tab::Jobs => Tab::Priority,
            Tab::Nodes => Tab::Jobs,
            Tab::Users => Tab::Nodes,
            Tab::Priority => Tab::Users,
        }
    }
}

/// Which full screen is showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Loading(LoadProgress),
    Unavailable(String),
    Dashboard,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum InputMode {
    #[default]
    Normal,
    Filter,
    ConfirmCancel(String),
}

/// Main application state.
pub struct App {
    cache: Arc<JobCache>,
    user: String,
    pub screen: Screen,
    pub tab: Tab,
    pub should_quit: bool,
    pub show_help: bool,
    pub theme: Theme,
    jobs_table: DiffTable,
    nodes_table: DiffTable,
    users_table: DiffTable,
    priority_table: DiffTable,
    view: ClusterView,
    stats: CacheStats,
    last_generation: Option<u64>,
    last_update: Option<Instant>,
    input_mode: InputMode,
    filter_input: String,
    status_message: Option<(String, Instant)>,
    actions: Vec<Action>,
}

impl App {
    pub fn new(cache: Arc<JobCache>, user: impl Into<String>, theme: Theme) -> Self {
        Self {
            cache,
            user: user.into(),
            screen: Screen::Loading(LoadProgress::default()),
            tab: Tab::default(),
            should_quit: false,
            show_help: false,
            theme,
            jobs_table: DiffTable::new(Job::COLUMNS),
            nodes_table: DiffTable::new(ClusterNode::COLUMNS),
            users_table: DiffTable::new(UserStats::COLUMNS),
            priority_table: DiffTable::new(PriorityRow::COLUMNS),
            view: ClusterView::default(),
            stats: CacheStats::default(),
            last_generation: None,
            last_update: None,
            input_mode: InputMode::default(),
            filter_input: String::new(),
            status_message: None,
            actions: Vec::new(),
        }
    }

    /// Apply one worker message.
    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Progress(step, status) => {
                if let Screen::Loading(progress) = &mut self.screen {
                    progress.apply(step, &status);
                }
            }
            AppEvent::Unavailable(reason) => {
                tracing::warn!("Scheduler unavailable: {}", reason);
                self.screen = Screen::Unavailable(reason);
            }
            AppEvent::Update(update) => {
                self.apply_update(update);
            }
            AppEvent::CancelFinished { job_id, result } => match result {
                Ok(()) => self.set_status(format!("Cancel requested for job {}", job_id)),
                Err(e) => self.set_status(format!("Cancel of {} failed: {}", job_id, e)),
            },
        }
    }

    /// Apply an update unless a newer one was already applied.
    ///
    /// Returns whether the update was applied.
    pub fn apply_update(&mut self, update: DashboardUpdate) -> bool {
        if self.last_generation.is_some_and(|last| update.generation <= last) {
            tracing::debug!(
                "Discarding stale update {} (last applied {:?})",
                update.generation,
                self.last_generation
            );
            return false;
        }
        self.last_generation = Some(update.generation);
        self.last_update = Some(Instant::now());

        let snapshot = self.cache.snapshot();
        self.stats = snapshot.stats();
        self.jobs_table.set_data(render_rows(&snapshot.jobs));
        self.nodes_table.set_data(render_rows(&update.view.nodes));
        self.users_table.set_data(render_rows(&update.view.users));
        self.priority_table
            .set_data(render_rows(&update.view.priorities));
        self.view = update.view;

        if matches!(self.screen, Screen::Loading(_)) {
            self.screen = Screen::Dashboard;
        }
        if !update.warnings.is_empty() {
            self.set_status(format!("Showing stale data: {}", update.warnings.join("; ")));
        }
        true
    }

    /// Drain the queued requests.
    pub fn take_actions(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.actions)
    }

    pub fn last_generation(&self) -> Option<u64> {
        self.last_generation
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub fn table(&self, tab: Tab) -> &DiffTable {
        match tab {
            Tab::Jobs => &self.jobs_table,
            Tab::Nodes => &self.nodes_table,
            Tab::Users => &self.users_table,
            Tab::Priority => &self.priority_table,
        }
    }

    fn table_mut(&mut self, tab: Tab) -> &mut DiffTable {
        match tab {
            Tab::Jobs => &mut self.jobs_table,
            Tab::Nodes => &mut self.nodes_table,
            Tab::Users => &mut self.users_table,
            Tab::Priority => &mut self.priority_table,
        }
    }

    /// The job under the cursor on the Jobs tab.
    pub fn selected_job(&self) -> Option<Job> {
        self.jobs_table
            .cursor_key()
            .and_then(|id| self.cache.job_by_id(id))
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message
            .as_ref()
            .filter(|(_, at)| at.elapsed() < STATUS_TTL)
            .map(|(msg, _)| msg.as_str())
    }

    fn set_status(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Handle a key event.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.quit();
            return;
        }

        // If help is showing, any key closes it
        if self.show_help {
            self.show_help = false;
            return;
        }

        if self.screen != Screen::Dashboard {
            if key.code == KeyCode::Char('q') {
                self.quit();
            }
            return;
        }

        match std::mem::take(&mut self.input_mode) {
            InputMode::Filter => self.handle_filter_key(key),
            InputMode::ConfirmCancel(job_id) => {
                if key.code == KeyCode::Char('y') {
                    self.set_status(format!("Cancelling job {}...", job_id));
                    self.actions.push(Action::Cancel(job_id));
                } else {
                    self.set_status("Cancel aborted".to_string());
                }
            }
            InputMode::Normal => self.handle_normal_key(key),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.quit(),
            KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => self.tab = self.tab.next(),
            KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => {
                self.tab = self.tab.previous()
            }
            KeyCode::Char(c @ '1'..='4') => {
                let index = c as usize - '1' as usize;
                self.tab = Tab::ALL[index];
            }
            KeyCode::Char('j') | KeyCode::Down => self.table_mut(self.tab).cursor_down(),
            KeyCode::Char('k') | KeyCode::Up => self.table_mut(self.tab).cursor_up(),
            KeyCode::Char('g') | KeyCode::Home => self.table_mut(self.tab).cursor_first(),
            KeyCode::Char('G') | KeyCode::End => self.table_mut(self.tab).cursor_last(),
            KeyCode::Char('/') => {
                self.filter_input = self.table(self.tab).filter_text().to_string();
                self.input_mode = InputMode::Filter;
            }
            KeyCode::Char('s') => {
                self.table_mut(self.tab).cycle_sort_column();
            }
            KeyCode::Char('S') => {
                self.table_mut(self.tab).toggle_sort_direction();
            }
            KeyCode::Char('r') => {
                self.set_status("Refreshing...".to_string());
                self.actions.push(Action::Refresh);
            }
            KeyCode::Char('x') if self.tab == Tab::Jobs => self.request_cancel(),
            KeyCode::Char('c') if self.tab == Tab::Jobs => self.copy_job_id(),
            KeyCode::Char('?') => self.show_help = true,
            _ => {}
        }
    }

    fn handle_filter_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => return,
            KeyCode::Esc => self.filter_input.clear(),
            KeyCode::Backspace => {
                self.filter_input.pop();
            }
            KeyCode::Char(c) => self.filter_input.push(c),
            _ => {}
        }
        let query = self.filter_input.clone();
        self.table_mut(self.tab).set_filter(&query);
        if key.code != KeyCode::Esc {
            self.input_mode = InputMode::Filter;
        }
    }

    fn request_cancel(&mut self) {
        let Some(job) = self.selected_job() else {
            self.set_status("No job selected".to_string());
            return;
        };
        if !job.is_active {
            self.set_status(format!("Job {} is not active", job.job_id));
            return;
        }
        match validate_job_id(&job.job_id) {
            Ok(id) => self.input_mode = InputMode::ConfirmCancel(id.to_string()),
            Err(e) => self.set_status(e.to_string()),
        }
    }

    fn copy_job_id(&mut self) {
        let Some(job_id) = self.jobs_table.cursor_key().map(str::to_string) else {
            self.set_status("No job selected".to_string());
            return;
        };

        match arboard::Clipboard::new() {
            Ok(mut clipboard) => match clipboard.set_text(job_id.clone()) {
                Ok(()) => self.set_status(format!("Copied {} to clipboard", job_id)),
                Err(_) => self.set_status("Failed to copy to clipboard".to_string()),
            },
            Err(_) => self.set_status("Clipboard not available".to_string()),
        }
    }

    /// Poll for a terminal event and handle it.
    pub fn poll_events(&mut self, timeout: Duration) -> std::io::Result<bool> {
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                self.handle_key(key);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Render the UI.
    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        match &self.screen {
            Screen::Loading(progress) => LoadingScreen::render(frame, area, progress, &self.theme),
            Screen::Unavailable(reason) => {
                UnavailableScreen::render(frame, area, reason, &self.theme)
            }
            Screen::Dashboard => self.render_dashboard(frame, area),
        }

        if self.show_help {
            self.render_help_overlay(frame);
        }
    }

    fn render_dashboard(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(5),    // Table
                Constraint::Length(1), // Footer
            ])
            .split(area);

        Header::render(
            frame,
            chunks[0],
            self.tab,
            &self.user,
            &self.stats,
            &self.view,
            self.last_update.map(|t| t.elapsed().as_secs()),
            &self.theme,
        );

        let table = self.table(self.tab);
        let title = Line::from(vec![Span::raw(format!(
            " {} ({}) ",
            self.tab.title(),
            table.row_count()
        ))]);
        let state_column = match self.tab {
            Tab::Jobs => Some(2),
            Tab::Nodes | Tab::Users | Tab::Priority => None,
        };
        DataTable::render(frame, chunks[1], table, title, state_column, &self.theme);

        let mode = match &self.input_mode {
            InputMode::Filter => FooterMode::Filter(&self.filter_input),
            InputMode::ConfirmCancel(job_id) => FooterMode::ConfirmCancel(job_id),
            InputMode::Normal => match self.status_message() {
                Some(msg) => FooterMode::Status(msg),
                None => FooterMode::Help,
            },
        };
        Footer::render(frame, chunks[2], mode, &self.theme);
    }

    fn render_help_overlay(&self, frame: &mut Frame) {
        let area = centered_rect(60, 70, frame.area());

        let help_text = r#"
  Keyboard Shortcuts
  ──────────────────

  Views
  Tab / l    Next view
  S-Tab / h  Previous view
  1-4        Jobs, Nodes, Users, Priority

  Tables
  j/k / ↑↓   Move cursor
  g / G      First / last row
  /          Filter (text, or column:value)
  s          Cycle sort column
  S          Reverse sort

  Jobs
  x          Cancel job under cursor
  c          Copy job id

  Global
  r          Refresh now
  ?          This help
  q / Ctrl+C Quit

  Press any key to close
"#;

        frame.render_widget(Clear, area);
        let paragraph = Paragraph::new(help_text)
            .block(Block::default().borders(Borders::ALL).title(" Help "))
            .style(Style::default().fg(self.theme.foreground));

        frame.render_widget(paragraph, area);
    }
}

/// Create a centered rectangle.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
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
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{Terminal, backend::TestBackend};

    fn job(id: &str, state: &str, is_active: bool) -> Job {
        Job {
            job_id: id.to_string(),
            name: format!("job{}", id),
            state: state.to_string(),
            time: "0:10".to_string(),
            nodes: "1".to_string(),
            node_list: "node01".to_string(),
            restarts: 0,
            exit_code: String::new(),
            is_active,
        }
    }

    fn update(generation: u64) -> DashboardUpdate {
        DashboardUpdate {
            generation,
            view: ClusterView::default(),
            warnings: Vec::new(),
        }
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn loaded_app() -> App {
        let cache = Arc::new(JobCache::new());
        cache.refresh(
            vec![job("101", "RUNNING", true), job("102", "PENDING", true)],
            vec![job("90", "COMPLETED", false)],
            1,
            0,
            0,
        );
        let mut app = App::new(cache, "alice", Theme::dark());
        app.handle_event(AppEvent::Update(update(1)));
        app
    }

    fn screen_text(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_first_update_leaves_loading() {
        let app = loaded_app();
        assert_eq!(app.screen, Screen::Dashboard);
        assert_eq!(app.table(Tab::Jobs).row_count(), 3);
        assert_eq!(app.stats().running, 1);
        assert_eq!(app.stats().pending, 1);
    }

    #[test]
    fn test_stale_generation_discarded() {
        let mut app = loaded_app();
        assert!(app.apply_update(update(3)));
        assert!(!app.apply_update(update(2)));
        assert!(!app.apply_update(update(3)));
        assert_eq!(app.last_generation(), Some(3));
    }

    #[test]
    fn test_progress_only_while_loading() {
        let cache = Arc::new(JobCache::new());
        let mut app = App::new(cache, "alice", Theme::dark());
        app.handle_event(AppEvent::Progress(
            LoadStep::Availability,
            StepStatus::Succeeded,
        ));
        match &app.screen {
            Screen::Loading(progress) => assert_eq!(progress.percent(), 5),
            other => panic!("unexpected screen {:?}", other),
        }
    }

    #[test]
    fn test_unavailable_screen() {
        let cache = Arc::new(JobCache::new());
        let mut app = App::new(cache, "alice", Theme::dark());
        app.handle_event(AppEvent::Unavailable("squeue: not found".to_string()));
        assert_eq!(app.screen, Screen::Unavailable("squeue: not found".to_string()));

        // navigation is ignored, quit still works
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.tab, Tab::Jobs);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);

        assert!(screen_text(&app).contains("not available"));
    }

    #[test]
    fn test_tab_navigation() {
        let mut app = loaded_app();
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.tab, Tab::Nodes);
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.tab, Tab::Jobs);
        press(&mut app, KeyCode::Char('4'));
        assert_eq!(app.tab, Tab::Priority);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.tab, Tab::Jobs);
    }

    #[test]
    fn test_refresh_key_queues_action() {
        let mut app = loaded_app();
        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.take_actions(), vec![Action::Refresh]);
        assert!(app.take_actions().is_empty());
    }

    #[test]
    fn test_cancel_requires_confirmation() {
        let mut app = loaded_app();
        assert_eq!(app.selected_job().map(|j| j.job_id), Some("101".to_string()));

        press(&mut app, KeyCode::Char('x'));
        press(&mut app, KeyCode::Char('n'));
        assert!(app.take_actions().is_empty());
        assert_eq!(app.status_message(), Some("Cancel aborted"));

        press(&mut app, KeyCode::Char('x'));
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.take_actions(), vec![Action::Cancel("101".to_string())]);
    }

    #[test]
    fn test_cancel_refused_for_history_rows() {
        let mut app = loaded_app();
        press(&mut app, KeyCode::Char('G'));
        assert_eq!(app.selected_job().map(|j| j.job_id), Some("90".to_string()));

        press(&mut app, KeyCode::Char('x'));
        press(&mut app, KeyCode::Char('y'));
        assert!(app.take_actions().is_empty());
    }

    #[test]
    fn test_filter_input() {
        let mut app = loaded_app();
        press(&mut app, KeyCode::Char('/'));
        for c in "pend".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        assert_eq!(app.table(Tab::Jobs).row_count(), 1);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.table(Tab::Jobs).filter_text(), "pend");

        // normal mode again: 'q' quits instead of typing
        press(&mut app, KeyCode::Char('/'));
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.table(Tab::Jobs).row_count(), 3);
        assert!(!app.should_quit);
    }

    #[test]
    fn test_cursor_kept_across_updates() {
        let mut app = loaded_app();
        press(&mut app, KeyCode::Char('j'));
        assert_eq!(app.table(Tab::Jobs).cursor_key(), Some("102"));

        app.cache.refresh(
            vec![job("100", "RUNNING", true), job("101", "RUNNING", true), job("102", "PENDING", true)],
            vec![job("90", "COMPLETED", false)],
            1,
            0,
            0,
        );
        app.handle_event(AppEvent::Update(update(2)));
        assert_eq!(app.table(Tab::Jobs).cursor_key(), Some("102"));
        assert_eq!(app.table(Tab::Jobs).cursor_row(), 2);
    }

    #[test]
    fn test_warnings_become_status() {
        let mut app = loaded_app();
        let mut next = update(2);
        next.warnings = vec!["sacct: timed out".to_string()];
        app.handle_event(AppEvent::Update(next));
        assert_eq!(
            app.status_message(),
            Some("Showing stale data: sacct: timed out")
        );
    }

    #[test]
    fn test_render_dashboard() {
        let app = loaded_app();
        let text = screen_text(&app);
        assert!(text.contains("sqtop"));
        assert!(text.contains("[Jobs]"));
        assert!(text.contains("job101"));
        assert!(text.contains("job90"));
    }

    #[test]
    fn test_render_loading_and_help() {
        let cache = Arc::new(JobCache::new());
        let mut app = App::new(cache, "alice", Theme::dark());
        assert!(screen_text(&app).contains("Starting"));

        app.show_help = true;
        assert!(screen_text(&app).contains("Keyboard Shortcuts"));
    }
}
