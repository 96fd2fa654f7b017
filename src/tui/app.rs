//! Terminal application: owns the terminal and runs the event loop.

use crossterm::{
    event::{self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    Frame, Terminal,
};
use std::io::{self, Stdout};
use std::time::{Duration, Instant};
use tracing::info;

use crate::model::Page;

use super::state::AppState;
use super::widgets::{AlertOverlay, HeaderBar, HelpBar, Sidebar, StatusBar};

const SIDEBAR_WIDTH: u16 = 24;

pub struct App {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    state: AppState,
    spinner_frame: usize,
}

impl App {
    /// Take over the terminal (raw mode, alternate screen, bracketed paste).
    pub fn new(state: AppState) -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            state,
            spinner_frame: 0,
        })
    }

    /// Run the main event loop until the user quits
    pub async fn run(&mut self) -> io::Result<()> {
        let poll_timeout = Duration::from_millis(16);
        let spinner_interval = Duration::from_millis(80);
        let mut last_spinner_update = Instant::now();

        // The initial page gets mounted like any other
        self.state.navigate(Page::default());
        info!("UI started");

        while !self.state.should_quit {
            self.state.drain_events();

            if self.state.is_busy() && last_spinner_update.elapsed() >= spinner_interval {
                self.spinner_frame = self.spinner_frame.wrapping_add(1);
                last_spinner_update = Instant::now();
            }

            self.draw()?;

            if event::poll(poll_timeout)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        self.state.handle_key(key).await;
                    }
                    Event::Paste(text) => self.state.handle_paste(&text),
                    _ => {}
                }
            }
        }

        info!("UI stopped");
        Ok(())
    }

    fn draw(&mut self) -> io::Result<()> {
        let state = &self.state;
        let spinner_frame = self.spinner_frame;
        self.terminal.draw(|f| render(f, state, spinner_frame))?;
        Ok(())
    }
}

fn render(f: &mut Frame, state: &AppState, spinner_frame: usize) {
    let size = f.area();
    let is_busy = state.is_busy();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(8),    // Body
            Constraint::Length(1), // Status
            Constraint::Length(1), // Help
        ])
        .split(size);

    f.render_widget(
        HeaderBar {
            title: state.page.title(),
            is_busy,
            spinner_frame,
        },
        rows[0],
    );

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(40)])
        .split(rows[1]);
    f.render_widget(Sidebar { current: state.page }, body[0]);

    let content = Rect {
        x: body[1].x + 1,
        width: body[1].width.saturating_sub(2),
        ..body[1]
    };
    match state.page {
        Page::GradeEntry => state.grades.render(f, content, &state.store),
        Page::MailGenerator => state.mail.render(f, content, &state.store),
        Page::StudentRoster => state.students.render(f, content, &state.store),
    }

    f.render_widget(
        StatusBar {
            text: state.status.as_deref(),
            is_busy,
            spinner_frame,
        },
        rows[2],
    );
    f.render_widget(
        HelpBar {
            bindings: state.help(),
        },
        rows[3],
    );

    if state.picker.visible {
        state.picker.render(size, f.buffer_mut());
    }
    if let Some(message) = &state.alert {
        f.render_widget(AlertOverlay { message }, size);
    }
}

impl Drop for App {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            DisableBracketedPaste,
            LeaveAlternateScreen
        );
        let _ = self.terminal.show_cursor();
    }
}
