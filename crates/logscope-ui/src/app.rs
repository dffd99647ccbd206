//! Main application state and TUI event loop for logscope.
//!
//! [`App`] owns the theme, the current [`Session`], the sync coordinator with
//! its terminal charts, and the channel list. Keyboard and mouse input are
//! translated into coordinator calls; finished loads arrive from the
//! background [`LogLoader`] over an `mpsc` channel.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Position, Rect},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{error, info};

use logscope_data::IngestedLog;
use logscope_runtime::events::{ChartEvent, Interaction, Pick};
use logscope_runtime::loader::{LoadOutcome, LogLoader};
use logscope_runtime::session::Session;
use logscope_runtime::surface::HandleId;
use logscope_runtime::sync::SyncCoordinator;

use crate::channel_list::ChannelList;
use crate::chart_view::TerminalSurfaces;
use crate::components::header::Header;
use crate::components::status::{status_line, StatusMessage};
use crate::marker_panel::MarkerPanelState;
use crate::themes::Theme;

/// Longest wait for input when no marker update is pending.
const IDLE_POLL: Duration = Duration::from_millis(100);

/// Share of the viewport width moved by one pan step.
const PAN_STEP: f64 = 0.25;

/// Zoom factor for one key press or wheel notch.
const ZOOM_STEP: f64 = 1.25;

const CHANNEL_PANE_WIDTH: u16 = 34;

// ── Config / focus ────────────────────────────────────────────────────────────

/// Startup options for [`App`].
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub theme: String,
    /// Display name of the timezone used for calendar axes.
    pub timezone: String,
    /// Default viewport width; `None` shows the whole log.
    pub window: Option<f64>,
    /// Initial channel selection; empty uses the default heuristic.
    pub channels: Vec<String>,
    pub marker_delay: Duration,
}

/// Which pane receives navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Channels,
    Chart(HandleId),
}

// ── App ───────────────────────────────────────────────────────────────────────

pub struct App {
    pub theme: Theme,
    pub timezone: String,
    /// Set to `true` to break out of the event loop on the next iteration.
    pub should_quit: bool,
    window: Option<f64>,
    requested_channels: Vec<String>,
    loader: LogLoader,
    current_file: Option<PathBuf>,
    session: Option<Session>,
    sync: SyncCoordinator<TerminalSurfaces, MarkerPanelState>,
    channels: ChannelList,
    focus: Focus,
    status: Option<StatusMessage>,
    chart_areas: Vec<(HandleId, Rect)>,
}

impl App {
    pub fn new(config: AppConfig, loader: LogLoader) -> Self {
        Self {
            theme: Theme::from_name(&config.theme),
            timezone: config.timezone,
            should_quit: false,
            window: config.window,
            requested_channels: config.channels,
            loader,
            current_file: None,
            session: None,
            sync: SyncCoordinator::new(
                TerminalSurfaces,
                MarkerPanelState::default(),
                config.marker_delay,
            ),
            channels: ChannelList::default(),
            focus: Focus::Channels,
            status: None,
            chart_areas: Vec::new(),
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn sync(&self) -> &SyncCoordinator<TerminalSurfaces, MarkerPanelState> {
        &self.sync
    }

    pub fn channels(&self) -> &ChannelList {
        &self.channels
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    /// File of the session on screen.
    pub fn current_file(&self) -> Option<&Path> {
        self.current_file.as_deref()
    }

    // ── Loading ───────────────────────────────────────────────────────────────

    /// Start loading `path` in the background. The header and `R` keep
    /// pointing at the current file until the new one has loaded.
    pub fn open(&mut self, path: PathBuf) {
        self.status = Some(StatusMessage::info(format!("Loading {}…", path.display())));
        self.loader.request(path);
    }

    /// Load the current file again, keeping the channel selection.
    pub fn reload(&mut self) {
        let Some(path) = self.current_file.clone() else {
            self.status = Some(StatusMessage::error("No file to reload"));
            return;
        };
        if let Some(session) = &self.session {
            self.requested_channels = session.selection().to_vec();
        }
        self.open(path);
    }

    /// Handle a finished load. Stale outcomes are ignored; failures keep the
    /// previous session on screen.
    pub fn apply_outcome(&mut self, outcome: LoadOutcome) {
        match self.loader.accept(outcome) {
            None => {}
            Some(Ok(log)) => self.install_log(log),
            Some(Err(e)) => {
                error!(error = %e, "load failed");
                self.status = Some(StatusMessage::error(format!("Failed to load: {e}")));
            }
        }
    }

    /// Replace the session with one for `log` and rebuild every chart.
    pub fn install_log(&mut self, log: IngestedLog) {
        let base = Session::new(log, self.window);
        let mut notice = None;
        let mut session = if self.requested_channels.is_empty() {
            base
        } else {
            match base.clone().with_selection(&self.requested_channels) {
                Ok(session) => session,
                Err(e) => {
                    notice = Some(StatusMessage::error(format!("{e}; using default channels")));
                    base
                }
            }
        };

        self.sync.attach(&mut session);
        self.current_file = session.log().source.clone();
        self.channels = ChannelList::new(session.channels().to_vec(), session.selection());
        self.focus = Focus::Channels;

        let log = session.log();
        let mut summary = format!(
            "Loaded {} rows, {} axis on {}",
            log.records.len(),
            log.axis.kind,
            log.axis.column
        );
        if log.report.short_rows + log.report.long_rows > 0 {
            summary.push_str(&format!(
                " ({} short, {} long rows adjusted)",
                log.report.short_rows, log.report.long_rows
            ));
        }
        info!(rows = log.records.len(), charts = self.sync.charts().len(), "session installed");
        self.status = Some(notice.unwrap_or_else(|| StatusMessage::info(summary)));
        self.session = Some(session);
    }

    /// Rebuild the charts from the channel list.
    fn apply_selection(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match self.sync.rebuild(session, &self.channels.selection()) {
            Ok(count) => {
                self.status = Some(StatusMessage::info(format!("{count} charts")));
                if let Focus::Chart(id) = self.focus {
                    if !self.sync.charts().contains(id) {
                        self.focus = Focus::Channels;
                    }
                }
            }
            Err(e) => self.status = Some(StatusMessage::error(e.to_string())),
        }
    }

    // ── Input ─────────────────────────────────────────────────────────────────

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab => self.focus_next(),
            KeyCode::BackTab => self.focus_previous(),
            KeyCode::Up => match self.focus {
                Focus::Channels => self.channels.move_up(),
                Focus::Chart(_) => self.focus_previous(),
            },
            KeyCode::Down => match self.focus {
                Focus::Channels => self.channels.move_down(),
                Focus::Chart(_) => self.focus_next(),
            },
            KeyCode::Char(' ') => self.channels.toggle(),
            KeyCode::Char('a') => self.channels.select_all(),
            KeyCode::Char('n') => self.channels.select_none(),
            KeyCode::Enter => self.apply_selection(),
            KeyCode::Char('R') => self.reload(),
            _ => self.handle_view_key(key.code, now),
        }
    }

    /// Keys that act on the shared viewport and marker.
    fn handle_view_key(&mut self, code: KeyCode, now: Instant) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match code {
            KeyCode::Left => {
                self.sync.step_marker(session, -1, now);
            }
            KeyCode::Right => {
                self.sync.step_marker(session, 1, now);
            }
            KeyCode::Char('h') => {
                self.sync.pan(session, -PAN_STEP);
            }
            KeyCode::Char('l') => {
                self.sync.pan(session, PAN_STEP);
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.sync.zoom(session, ZOOM_STEP, None);
            }
            KeyCode::Char('-') => {
                self.sync.zoom(session, 1.0 / ZOOM_STEP, None);
            }
            KeyCode::Char('r') => {
                self.sync.reset(session);
            }
            KeyCode::Esc => self.sync.clear_marker(session),
            _ => {}
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent, now: Instant) {
        let position = Position::new(mouse.column, mouse.row);
        let Some((id, area)) = self
            .chart_areas
            .iter()
            .copied()
            .find(|(_, area)| area.contains(position))
        else {
            return;
        };
        let Some(x) = self
            .sync
            .charts()
            .get(id)
            .and_then(|chart| chart.x_at_column(area, mouse.column))
        else {
            return;
        };
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let interaction = match mouse.kind {
            MouseEventKind::Moved => Interaction::Hover(Pick::at_x(x)),
            MouseEventKind::Down(MouseButton::Left) => {
                self.focus = Focus::Chart(id);
                Interaction::Click(Pick::at_x(x))
            }
            MouseEventKind::ScrollUp => {
                Interaction::ViewportChanged(Some(session.viewport().zoomed(ZOOM_STEP, x)))
            }
            MouseEventKind::ScrollDown => {
                Interaction::ViewportChanged(Some(session.viewport().zoomed(1.0 / ZOOM_STEP, x)))
            }
            _ => return,
        };
        if let Err(e) = self.sync.handle_event(session, ChartEvent::new(id, interaction), now) {
            self.status = Some(StatusMessage::error(e.to_string()));
        }
    }

    fn focus_next(&mut self) {
        let count = self.sync.charts().len();
        self.focus = match self.focus {
            Focus::Channels if count > 0 => Focus::Chart(HandleId(0)),
            Focus::Chart(HandleId(i)) if i + 1 < count => Focus::Chart(HandleId(i + 1)),
            _ => Focus::Channels,
        };
    }

    fn focus_previous(&mut self) {
        let count = self.sync.charts().len();
        self.focus = match self.focus {
            Focus::Channels if count > 0 => Focus::Chart(HandleId(count - 1)),
            Focus::Chart(HandleId(i)) if i > 0 => Focus::Chart(HandleId(i - 1)),
            _ => Focus::Channels,
        };
    }

    /// How long the event loop may block waiting for input.
    fn poll_timeout(&self, now: Instant) -> Duration {
        self.sync
            .next_deadline()
            .map(|deadline| deadline.saturating_duration_since(now).min(IDLE_POLL))
            .unwrap_or(IDLE_POLL)
    }

    // ── Event loop ────────────────────────────────────────────────────────────

    /// Run the viewer until `q` or `Ctrl+C`, receiving loads from `rx`.
    ///
    /// Uses `crossterm::event::poll` with a short timeout so pending marker
    /// updates are flushed on time and finished loads are picked up via
    /// `try_recv`.
    pub async fn run(mut self, mut rx: mpsc::Receiver<LoadOutcome>) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal, &mut rx);

        // Restore terminal state unconditionally.
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            DisableMouseCapture,
            LeaveAlternateScreen
        )?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        rx: &mut mpsc::Receiver<LoadOutcome>,
    ) -> io::Result<()> {
        loop {
            terminal.draw(|frame| self.render(frame))?;

            if event::poll(self.poll_timeout(Instant::now()))? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        self.handle_key(key, Instant::now())
                    }
                    Event::Mouse(mouse) => self.handle_mouse(mouse, Instant::now()),
                    _ => {}
                }
            }

            self.sync.tick(Instant::now());

            // Drain finished loads (non-blocking).
            while let Ok(outcome) = rx.try_recv() {
                self.apply_outcome(outcome);
            }

            if self.should_quit {
                return Ok(());
            }
        }
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    /// Draw the whole screen and remember where each chart landed.
    pub fn render(&mut self, frame: &mut Frame) {
        let [header_area, body, panel_area, status_area] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Min(3),
            Constraint::Length(self.sync.panel().height()),
            Constraint::Length(1),
        ])
        .areas(frame.area());
        let [channel_area, charts_area] =
            Layout::horizontal([Constraint::Length(CHANNEL_PANE_WIDTH), Constraint::Min(10)])
                .areas(body);

        self.render_header(frame, header_area);
        self.channels
            .render(frame, channel_area, &self.theme, self.focus == Focus::Channels);
        self.render_charts(frame, charts_area);
        self.sync.panel().render(frame, panel_area, &self.theme);
        frame.render_widget(
            Paragraph::new(status_line(self.status.as_ref(), &self.theme)),
            status_area,
        );
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let file = self
            .current_file
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "no file".to_string());
        let (rows, axis) = match &self.session {
            Some(s) => (
                s.sample_count(),
                format!("{}: {}", s.axis().kind, s.axis().column),
            ),
            None => (0, "-".to_string()),
        };
        let lines = Header::new(&file, rows, &axis, &self.timezone, &self.theme).to_lines();
        frame.render_widget(Paragraph::new(Text::from(lines)), area);
    }

    fn render_charts(&mut self, frame: &mut Frame, area: Rect) {
        self.chart_areas.clear();
        let charts = self.sync.charts();
        if charts.is_empty() {
            let message = match (&self.session, self.loader.is_loading()) {
                (_, true) => "Loading…",
                (None, false) => "No log loaded",
                (Some(_), false) => "No channels selected. Check channels and press Enter.",
            };
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(message, self.theme.dim)))
                    .block(Block::default().borders(Borders::ALL).border_style(self.theme.border)),
                area,
            );
            return;
        }

        let constraints = vec![Constraint::Ratio(1, charts.len() as u32); charts.len()];
        let rows = Layout::vertical(constraints).split(area);
        for (position, (entry, rect)) in charts.iter().zip(rows.iter()).enumerate() {
            let focused = self.focus == Focus::Chart(entry.id);
            entry
                .handle
                .render(frame, *rect, &self.theme, position, focused);
            self.chart_areas.push((entry.id, *rect));
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
