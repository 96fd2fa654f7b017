//! Grade entry form and the roll-up table.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};
use tracing::error;

use crate::model::{format_grade, local_date_string, parse_grade, NewGrade, SUBJECTS};
use crate::store::DomainStore;
use crate::tui::input::{FieldAction, TextField};
use crate::tui::picker::PickerItem;
use crate::tui::theme::Theme;
use crate::tui::widgets::{Button, FieldBox, Notice};

use super::{cycle, PickTarget, ViewAction};

pub const EMPTY_ROSTER_TEXT: &str =
    "Bitte fügen Sie zuerst Schüler unter \"Schüler einfügen\" hinzu.";
const NO_GRADES_TEXT: &str = "Noch keine Noten eingetragen.";
const NO_STUDENT_TEXT: &str = "Bitte wählen Sie einen Schüler aus.";
const INVALID_GRADE_TEXT: &str = "Bitte eine Note zwischen 1 und 6 (in Schritten von 0,1) eingeben.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeField {
    Student,
    Subject,
    Grade,
    Comment,
    Save,
    Table,
}

const FORM_ORDER: [GradeField; 6] = [
    GradeField::Student,
    GradeField::Subject,
    GradeField::Grade,
    GradeField::Comment,
    GradeField::Save,
    GradeField::Table,
];

const TABLE_ONLY_ORDER: [GradeField; 1] = [GradeField::Table];

/// Outcome of pressing "Note speichern"
#[derive(Debug, Clone, PartialEq)]
pub enum GradeSubmit {
    Saved,
    /// Form hidden, nothing to submit
    NoRoster,
    NoStudent,
    InvalidGrade,
    StoreFailed(String),
}

#[derive(Debug, Clone)]
pub struct GradesView {
    pub focus: GradeField,
    pub student_id: Option<String>,
    pub subject: String,
    pub grade: TextField,
    pub comment: TextField,
    pub table_selected: usize,
}

impl Default for GradesView {
    fn default() -> Self {
        Self::new()
    }
}

impl GradesView {
    pub fn new() -> Self {
        Self {
            focus: GradeField::Student,
            student_id: None,
            subject: SUBJECTS[0].to_string(),
            grade: TextField::with_value("1"),
            comment: TextField::new(),
            table_selected: 0,
        }
    }

    /// Fresh form state whenever the page is shown
    pub fn mount(&mut self) {
        *self = Self::new();
    }

    /// The form is only available with a non-empty roster
    pub fn can_submit(store: &DomainStore) -> bool {
        !store.list_students().is_empty()
    }

    /// Validate the form and store the grade. Only the comment is cleared on
    /// success; student, subject and grade stay for the next entry.
    pub async fn submit(&mut self, store: &mut DomainStore) -> GradeSubmit {
        if !Self::can_submit(store) {
            return GradeSubmit::NoRoster;
        }
        let Some(student_id) = self
            .student_id
            .clone()
            .filter(|id| store.student(id).is_some())
        else {
            return GradeSubmit::NoStudent;
        };
        let Some(value) = parse_grade(self.grade.value()) else {
            return GradeSubmit::InvalidGrade;
        };

        let data = NewGrade {
            student_id,
            subject: self.subject.clone(),
            grade: value,
            comment: self.comment.value().to_string(),
            date: local_date_string(),
        };
        match store.add_grade(data).await {
            Ok(_) => {
                self.comment.clear();
                self.table_selected = 0;
                GradeSubmit::Saved
            }
            Err(e) => {
                error!("Failed to save grade: {}", e);
                GradeSubmit::StoreFailed(e.to_string())
            }
        }
    }

    pub fn apply_pick(&mut self, target: PickTarget, id: &str) {
        match target {
            PickTarget::Student => self.student_id = Some(id.to_string()),
            PickTarget::Subject => self.subject = id.to_string(),
            _ => {}
        }
    }

    fn focus_order(store: &DomainStore) -> &'static [GradeField] {
        if Self::can_submit(store) {
            &FORM_ORDER
        } else {
            &TABLE_ONLY_ORDER
        }
    }

    pub async fn handle_key(&mut self, key: KeyEvent, store: &mut DomainStore) -> ViewAction {
        let order = Self::focus_order(store);
        if !order.contains(&self.focus) {
            self.focus = order[0];
        }

        match key.code {
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

        let field = match self.focus {
            GradeField::Grade => Some(&mut self.grade),
            GradeField::Comment => Some(&mut self.comment),
            _ => None,
        };
        if let Some(field) = field {
            return match field.handle_key(key) {
                FieldAction::Submit => self.submit_action(store).await,
                _ => ViewAction::None,
            };
        }

        match (self.focus, key.code) {
            (GradeField::Student, KeyCode::Enter | KeyCode::Char(' ')) => ViewAction::Pick {
                target: PickTarget::Student,
                title: "Schüler",
                items: store
                    .list_students()
                    .iter()
                    .map(|s| PickerItem::new(&s.id, s.full_name()).with_subtitle(&s.email))
                    .collect(),
                current: self.student_id.clone(),
            },
            (GradeField::Subject, KeyCode::Enter | KeyCode::Char(' ')) => ViewAction::Pick {
                target: PickTarget::Subject,
                title: "Fach",
                items: SUBJECTS.iter().map(|s| PickerItem::new(*s, *s)).collect(),
                current: Some(self.subject.clone()),
            },
            (GradeField::Save, KeyCode::Enter | KeyCode::Char(' ')) => {
                self.submit_action(store).await
            }
            (GradeField::Table, KeyCode::Up) => {
                self.table_selected = self.table_selected.saturating_sub(1);
                ViewAction::None
            }
            (GradeField::Table, KeyCode::Down) => {
                let last = store.list_grades().len().saturating_sub(1);
                self.table_selected = (self.table_selected + 1).min(last);
                ViewAction::None
            }
            _ => ViewAction::None,
        }
    }

    async fn submit_action(&mut self, store: &mut DomainStore) -> ViewAction {
        match self.submit(store).await {
            GradeSubmit::Saved | GradeSubmit::NoRoster => ViewAction::None,
            GradeSubmit::NoStudent => ViewAction::Alert(NO_STUDENT_TEXT.to_string()),
            GradeSubmit::InvalidGrade => ViewAction::Alert(INVALID_GRADE_TEXT.to_string()),
            GradeSubmit::StoreFailed(e) => {
                ViewAction::Alert(format!("Note konnte nicht gespeichert werden: {e}"))
            }
        }
    }

    pub fn help(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("Tab", "Feld"),
            ("Enter", "Auswählen/Speichern"),
            ("↑↓", "Tabelle"),
            ("F1-F3", "Seite"),
            ("Ctrl+C", "Beenden"),
        ]
    }

    pub fn render(&self, f: &mut Frame, area: Rect, store: &DomainStore) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(8), Constraint::Min(5)])
            .split(area);

        self.render_form(f, chunks[0], store);
        self.render_table(f, chunks[1], store);
    }

    fn render_form(&self, f: &mut Frame, area: Rect, store: &DomainStore) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::border())
            .title(Span::styled(" + Note eintragen ", Theme::bold()));
        let inner = block.inner(area);
        f.render_widget(block, area);

        if !Self::can_submit(store) {
            f.render_widget(
                Notice {
                    title: "Hinweis",
                    text: EMPTY_ROSTER_TEXT,
                    style: Theme::warning(),
                },
                inner,
            );
            return;
        }

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Length(3)])
            .split(inner);
        let top = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(40),
                Constraint::Percentage(35),
                Constraint::Percentage(25),
            ])
            .split(rows[0]);
        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(20), Constraint::Length(18)])
            .split(rows[1]);

        let student_name = self
            .student_id
            .as_deref()
            .and_then(|id| store.student(id))
            .map(|s| s.full_name())
            .unwrap_or_default();

        f.render_widget(
            FieldBox {
                label: "Schüler",
                value: &student_name,
                placeholder: "Wählen...",
                focused: self.focus == GradeField::Student,
                enabled: true,
                is_select: true,
            },
            top[0],
        );
        f.render_widget(
            FieldBox {
                label: "Fach",
                value: &self.subject,
                placeholder: "",
                focused: self.focus == GradeField::Subject,
                enabled: true,
                is_select: true,
            },
            top[1],
        );
        f.render_widget(
            FieldBox {
                label: "Note (1-6)",
                value: self.grade.value(),
                placeholder: "",
                focused: self.focus == GradeField::Grade,
                enabled: true,
                is_select: false,
            },
            top[2],
        );
        f.render_widget(
            FieldBox {
                label: "Kommentar",
                value: self.comment.value(),
                placeholder: "z.B. Sehr gute Beteiligung in der letzten Klausur.",
                focused: self.focus == GradeField::Comment,
                enabled: true,
                is_select: false,
            },
            bottom[0],
        );
        let button_area = Rect {
            y: bottom[1].y + 1,
            height: 1,
            ..bottom[1]
        };
        f.render_widget(
            Button {
                label: "Note speichern",
                focused: self.focus == GradeField::Save,
                enabled: true,
            },
            button_area,
        );

        let cursor = match self.focus {
            GradeField::Grade => Some((top[2], &self.grade)),
            GradeField::Comment => Some((bottom[0], &self.comment)),
            _ => None,
        };
        if let Some((field_area, field)) = cursor {
            let x = field_area.x + 1 + field.cursor_display_width() as u16;
            f.set_cursor_position((x.min(field_area.right().saturating_sub(2)), field_area.y + 1));
        }
    }

    fn render_table(&self, f: &mut Frame, area: Rect, store: &DomainStore) {
        let border = if self.focus == GradeField::Table {
            Theme::border_focused()
        } else {
            Theme::border()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(Span::styled(" Zuletzt eingetragene Noten ", Theme::bold()));

        if store.list_grades().is_empty() {
            f.render_widget(
                Paragraph::new(Line::styled(NO_GRADES_TEXT, Theme::muted()))
                    .alignment(ratatui::layout::Alignment::Center)
                    .block(block),
                area,
            );
            return;
        }

        let rows: Vec<Row> = store
            .grades_newest_first()
            .map(|grade| {
                Row::new(vec![
                    Cell::from(store.student_display_name(&grade.student_id)).style(Theme::bold()),
                    Cell::from(grade.subject.clone()),
                    Cell::from(Span::styled(
                        format!(" {} ", format_grade(grade.grade)),
                        Theme::severity(grade.severity()),
                    )),
                    Cell::from(format!("\"{}\"", grade.comment)).style(Theme::italic()),
                    Cell::from(grade.date.clone()).style(Theme::muted()),
                ])
            })
            .collect();

        let header = Row::new(vec!["SCHÜLER", "FACH", "NOTE", "KOMMENTAR", "DATUM"])
            .style(Theme::muted());
        let table = Table::new(
            rows,
            [
                Constraint::Percentage(22),
                Constraint::Percentage(16),
                Constraint::Length(6),
                Constraint::Min(20),
                Constraint::Length(11),
            ],
        )
        .header(header)
        .block(block)
        .row_highlight_style(Theme::row_selected());

        let mut state = TableState::default();
        if self.focus == GradeField::Table {
            state.select(Some(self.table_selected));
        }
        f.render_stateful_widget(table, area, &mut state);
    }
}
