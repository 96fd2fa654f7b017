//! Roster management: manual entry, file import and the roster table.

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table, TableState},
    Frame,
};
use tracing::{info, warn};

use crate::model::NewStudent;
use crate::store::DomainStore;
use crate::tui::input::{FieldAction, TextField};
use crate::tui::theme::Theme;
use crate::tui::widgets::{Button, FieldBox};

use super::{cycle, RemoteRequest, ViewAction};

const EMPTY_ROSTER_TEXT: &str = "Noch keine Schüler hinzugefügt.";
pub const UPLOAD_DONE_TEXT: &str = "Datei wurde hochgeladen.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RosterMode {
    #[default]
    Manual,
    Import,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterField {
    FirstName,
    LastName,
    Email,
    Add,
    FilePath,
    Upload,
    Table,
}

const MANUAL_ORDER: [RosterField; 5] = [
    RosterField::FirstName,
    RosterField::LastName,
    RosterField::Email,
    RosterField::Add,
    RosterField::Table,
];

const IMPORT_ORDER: [RosterField; 3] = [
    RosterField::FilePath,
    RosterField::Upload,
    RosterField::Table,
];

#[derive(Debug, Clone)]
pub struct StudentsView {
    pub mode: RosterMode,
    pub focus: RosterField,
    pub first_name: TextField,
    pub last_name: TextField,
    pub email: TextField,
    pub file_path: TextField,
    pub uploading: bool,
    pub notice: Option<String>,
    pub table_selected: usize,
}

impl Default for StudentsView {
    fn default() -> Self {
        Self::new()
    }
}

impl StudentsView {
    pub fn new() -> Self {
        Self {
            mode: RosterMode::Manual,
            focus: RosterField::FirstName,
            first_name: TextField::new(),
            last_name: TextField::new(),
            email: TextField::new(),
            file_path: TextField::new(),
            uploading: false,
            notice: None,
            table_selected: 0,
        }
    }

    pub fn mount(&mut self) {
        *self = Self::new();
    }

    fn order(&self) -> &'static [RosterField] {
        match self.mode {
            RosterMode::Manual => &MANUAL_ORDER,
            RosterMode::Import => &IMPORT_ORDER,
        }
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            RosterMode::Manual => RosterMode::Import,
            RosterMode::Import => RosterMode::Manual,
        };
        self.focus = self.order()[0];
        self.notice = None;
    }

    /// Add the student when all three fields are filled. Returns whether a
    /// student was added.
    pub async fn submit_manual(&mut self, store: &mut DomainStore) -> crate::Result<bool> {
        if self.first_name.is_blank() || self.last_name.is_blank() || self.email.is_blank() {
            return Ok(false);
        }
        store
            .add_student(NewStudent {
                first_name: self.first_name.value().trim().to_string(),
                last_name: self.last_name.value().trim().to_string(),
                email: self.email.value().trim().to_string(),
            })
            .await?;
        self.first_name.clear();
        self.last_name.clear();
        self.email.clear();
        self.focus = RosterField::FirstName;
        Ok(true)
    }

    /// Build the upload request for the selected file, if any.
    pub fn upload_request(&mut self) -> Option<RemoteRequest> {
        if self.file_path.is_blank() || self.uploading {
            return None;
        }
        self.uploading = true;
        self.notice = None;
        Some(RemoteRequest::UploadRoster {
            path: PathBuf::from(self.file_path.value().trim()),
        })
    }

    /// Outcome of the roster upload. Failures are only logged.
    pub fn apply_upload(&mut self, result: crate::Result<serde_json::Value>) {
        self.uploading = false;
        match result {
            Ok(ack) => {
                info!("Roster uploaded: {}", ack);
                self.file_path.clear();
                self.notice = Some(UPLOAD_DONE_TEXT.to_string());
            }
            Err(e) => warn!("Roster upload failed: {}", e),
        }
    }

    /// Pasted text. In import mode this is usually a file dropped on the
    /// terminal, which replaces the current selection.
    pub fn handle_paste(&mut self, text: &str) {
        match self.mode {
            RosterMode::Import => {
                self.file_path.set(&clean_dropped_path(text));
                self.focus = RosterField::FilePath;
                self.notice = None;
            }
            RosterMode::Manual => {
                if let Some(field) = self.focused_field() {
                    field.insert_str(text);
                }
            }
        }
    }

    fn focused_field(&mut self) -> Option<&mut TextField> {
        match self.focus {
            RosterField::FirstName => Some(&mut self.first_name),
            RosterField::LastName => Some(&mut self.last_name),
            RosterField::Email => Some(&mut self.email),
            RosterField::FilePath => Some(&mut self.file_path),
            _ => None,
        }
    }

    pub async fn handle_key(&mut self, key: KeyEvent, store: &mut DomainStore) -> ViewAction {
        let order = self.order();
        match key.code {
            KeyCode::Char('t') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.toggle_mode();
                return ViewAction::None;
            }
            KeyCode::Tab => {
                self.focus = cycle(order, self.focus, true);
                return ViewAction::None;
            }
            KeyCode::BackTab => {
                self.focus = cycle(order, self.focus, false);
                return ViewAction::None;
            }
            _ => {}
        }

        if let Some(field) = self.focused_field() {
            return match field.handle_key(key) {
                FieldAction::Submit => self.confirm(store).await,
                _ => ViewAction::None,
            };
        }

        match (self.focus, key.code) {
            (RosterField::Add | RosterField::Upload, KeyCode::Enter | KeyCode::Char(' ')) => {
                self.confirm(store).await
            }
            (RosterField::Table, KeyCode::Up) => {
                self.table_selected = self.table_selected.saturating_sub(1);
                ViewAction::None
            }
            (RosterField::Table, KeyCode::Down) => {
                let last = store.list_students().len().saturating_sub(1);
                self.table_selected = (self.table_selected + 1).min(last);
                ViewAction::None
            }
            (RosterField::Table, KeyCode::Delete | KeyCode::Char('x')) => {
                self.delete_selected(store).await
            }
            _ => ViewAction::None,
        }
    }

    async fn confirm(&mut self, store: &mut DomainStore) -> ViewAction {
        match self.mode {
            RosterMode::Manual => match self.submit_manual(store).await {
                Ok(_) => ViewAction::None,
                Err(e) => ViewAction::Alert(format!("Schüler konnte nicht gespeichert werden: {e}")),
            },
            RosterMode::Import => self
                .upload_request()
                .map(ViewAction::Request)
                .unwrap_or(ViewAction::None),
        }
    }

    async fn delete_selected(&mut self, store: &mut DomainStore) -> ViewAction {
        let Some(id) = store
            .list_students()
            .get(self.table_selected)
            .map(|s| s.id.clone())
        else {
            return ViewAction::None;
        };
        if let Err(e) = store.delete_student(&id).await {
            return ViewAction::Alert(format!("Schüler konnte nicht gelöscht werden: {e}"));
        }
        let last = store.list_students().len().saturating_sub(1);
        self.table_selected = self.table_selected.min(last);
        ViewAction::None
    }

    pub fn help(&self) -> &'static [(&'static str, &'static str)] {
        match self.focus {
            RosterField::Table => &[
                ("↑↓", "Auswahl"),
                ("Entf/x", "Löschen"),
                ("Tab", "Feld"),
                ("Ctrl+T", "Modus"),
                ("F1-F3", "Seite"),
            ],
            _ => &[
                ("Tab", "Feld"),
                ("Enter", "Bestätigen"),
                ("Ctrl+T", "Manuell/Import"),
                ("F1-F3", "Seite"),
                ("Ctrl+C", "Beenden"),
            ],
        }
    }

    pub fn render(&self, f: &mut Frame, area: Rect, store: &DomainStore) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(9), Constraint::Min(5)])
            .split(area);

        let tabs = Line::from(vec![
            Span::styled(" Manuell ", tab_style(self.mode == RosterMode::Manual)),
            Span::raw(" "),
            Span::styled(" Importieren ", tab_style(self.mode == RosterMode::Import)),
            Span::styled("  (Ctrl+T)", Theme::muted()),
        ]);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::border())
            .title(tabs);
        let inner = block.inner(chunks[0]);
        f.render_widget(block, chunks[0]);

        match self.mode {
            RosterMode::Manual => self.render_manual(f, inner),
            RosterMode::Import => self.render_import(f, inner),
        }
        self.render_table(f, chunks[1], store);
    }

    fn render_manual(&self, f: &mut Frame, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Length(3)])
            .split(area);
        let top = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[0]);
        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(20), Constraint::Length(20)])
            .split(rows[1]);

        let fields = [
            (RosterField::FirstName, "Vorname", &self.first_name, top[0]),
            (RosterField::LastName, "Nachname", &self.last_name, top[1]),
            (RosterField::Email, "E-Mail der Eltern", &self.email, bottom[0]),
        ];
        for (field, label, input, field_area) in fields {
            f.render_widget(
                FieldBox {
                    label,
                    value: input.value(),
                    placeholder: "",
                    focused: self.focus == field,
                    enabled: true,
                    is_select: false,
                },
                field_area,
            );
            if self.focus == field {
                set_cursor(f, field_area, input);
            }
        }
        let enabled =
            !(self.first_name.is_blank() || self.last_name.is_blank() || self.email.is_blank());
        f.render_widget(
            Button {
                label: "Schüler hinzufügen",
                focused: self.focus == RosterField::Add,
                enabled,
            },
            Rect {
                y: bottom[1].y + 1,
                height: 1,
                ..bottom[1]
            },
        );
    }

    fn render_import(&self, f: &mut Frame, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);

        f.render_widget(
            FieldBox {
                label: "Datei",
                value: self.file_path.value(),
                placeholder: "Pfad eingeben oder Datei hierher ziehen (CSV, Excel)",
                focused: self.focus == RosterField::FilePath,
                enabled: !self.uploading,
                is_select: false,
            },
            rows[0],
        );
        if self.focus == RosterField::FilePath {
            set_cursor(f, rows[0], &self.file_path);
        }

        let label = if self.uploading {
            "Wird hochgeladen..."
        } else {
            "Datei hochladen"
        };
        let button_area = Rect {
            width: rows[2].width.min(22),
            ..rows[2]
        };
        f.render_widget(
            Button {
                label,
                focused: self.focus == RosterField::Upload,
                enabled: !self.file_path.is_blank() && !self.uploading,
            },
            button_area,
        );

        if let Some(notice) = &self.notice {
            f.render_widget(
                Paragraph::new(Line::styled(notice.as_str(), Theme::success())),
                rows[3],
            );
        }
    }

    fn render_table(&self, f: &mut Frame, area: Rect, store: &DomainStore) {
        let border = if self.focus == RosterField::Table {
            Theme::border_focused()
        } else {
            Theme::border()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(Span::styled(
                format!(" Schülerliste ({}) ", store.list_students().len()),
                Theme::bold(),
            ));

        if store.list_students().is_empty() {
            f.render_widget(
                Paragraph::new(Line::styled(EMPTY_ROSTER_TEXT, Theme::muted()))
                    .alignment(Alignment::Center)
                    .block(block),
                area,
            );
            return;
        }

        let rows: Vec<Row> = store
            .list_students()
            .iter()
            .map(|s| {
                Row::new(vec![
                    s.first_name.clone(),
                    s.last_name.clone(),
                    s.email.clone(),
                ])
            })
            .collect();
        let table = Table::new(
            rows,
            [
                Constraint::Percentage(25),
                Constraint::Percentage(25),
                Constraint::Percentage(50),
            ],
        )
        .header(Row::new(vec!["VORNAME", "NACHNAME", "E-MAIL"]).style(Theme::muted()))
        .block(block)
        .row_highlight_style(Theme::row_selected());

        let mut state = TableState::default();
        if self.focus == RosterField::Table {
            state.select(Some(self.table_selected));
        }
        f.render_stateful_widget(table, area, &mut state);
    }
}

fn tab_style(active: bool) -> ratatui::style::Style {
    if active {
        Theme::nav_active()
    } else {
        Theme::nav_inactive()
    }
}

fn set_cursor(f: &mut Frame, area: Rect, field: &TextField) {
    let x = area.x + 1 + field.cursor_display_width() as u16;
    f.set_cursor_position((x.min(area.right().saturating_sub(2)), area.y + 1));
}

/// Terminals paste dropped files as a (possibly quoted or shell-escaped)
/// path. Only the first path is kept.
pub fn clean_dropped_path(text: &str) -> String {
    let first = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let trimmed = first.trim();
    let unquoted = trimmed
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| trimmed.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
        .unwrap_or(trimmed);
    let unquoted = unquoted.strip_prefix("file://").unwrap_or(unquoted);
    unquoted.replace("\\ ", " ")
}
