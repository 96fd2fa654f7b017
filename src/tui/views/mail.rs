//! Mail generator: server-composed semester mails and AI drafts per grade.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use tracing::warn;

use crate::mailto::semester_mailto;
use crate::model::{format_grade, SEMESTERS};
use crate::remote::{ClassInfo, MailRecord};
use crate::store::DomainStore;
use crate::tui::picker::PickerItem;
use crate::tui::theme::Theme;
use crate::tui::widgets::{truncate_to_width, Button, FieldBox, Notice};

use super::{cycle, PickTarget, RemoteRequest, ViewAction};

pub const CLASSES_LOADING_TEXT: &str = "Klassen werden geladen...";
pub const CLASSES_ERROR_TEXT: &str = "Klassen konnten nicht geladen werden.";
pub const MISSING_SELECTION_TEXT: &str = "Bitte Klasse und Semester auswaehlen.";
pub const GENERATION_FAILED_TEXT: &str = "Mail konnte nicht generiert werden.";
const NO_GRADE_TEXT: &str = "Bitte wählen Sie eine Note aus.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MailMode {
    /// Class + semester, composed by the server
    #[default]
    Semester,
    /// One grade, drafted by the AI writer
    SingleGrade,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailField {
    Class,
    Semester,
    Generate,
    Cards,
    Grade,
    Draft,
    Copy,
}

const SEMESTER_ORDER: [MailField; 4] = [
    MailField::Class,
    MailField::Semester,
    MailField::Generate,
    MailField::Cards,
];

const SINGLE_GRADE_ORDER: [MailField; 3] = [MailField::Grade, MailField::Draft, MailField::Copy];

#[derive(Debug, Clone)]
pub struct MailView {
    pub mode: MailMode,
    pub focus: MailField,
    /// Bumped on every mount; class-list responses for older mounts are stale
    pub mount_generation: u64,

    pub classes: Vec<ClassInfo>,
    pub classes_loading: bool,
    pub classes_error: Option<String>,
    pub class_id: Option<String>,
    pub semester: Option<String>,
    pub loading: bool,
    pub records: Vec<MailRecord>,
    /// Semester the current cards were generated for
    pub records_semester: String,
    pub card_selected: usize,

    pub grade_id: Option<String>,
    pub drafting: bool,
    pub draft: Option<String>,
}

impl Default for MailView {
    fn default() -> Self {
        Self::new()
    }
}

impl MailView {
    pub fn new() -> Self {
        Self {
            mode: MailMode::Semester,
            focus: MailField::Class,
            mount_generation: 0,
            classes: Vec::new(),
            classes_loading: false,
            classes_error: None,
            class_id: None,
            semester: None,
            loading: false,
            records: Vec::new(),
            records_semester: String::new(),
            card_selected: 0,
            grade_id: None,
            drafting: false,
            draft: None,
        }
    }

    /// Reset to a fresh view and start loading the class list.
    pub fn mount(&mut self) -> RemoteRequest {
        let generation = self.mount_generation + 1;
        *self = Self::new();
        self.mount_generation = generation;
        self.classes_loading = true;
        RemoteRequest::LoadClasses { generation }
    }

    pub fn is_busy(&self) -> bool {
        self.classes_loading || self.loading || self.drafting
    }

    /// Class-list outcome. Ignored when it belongs to an earlier mount.
    pub fn apply_classes(&mut self, generation: u64, result: crate::Result<Vec<ClassInfo>>) {
        if generation != self.mount_generation {
            return;
        }
        self.classes_loading = false;
        match result {
            Ok(classes) => {
                self.classes = classes;
                self.classes_error = None;
            }
            Err(e) => {
                warn!("Loading classes failed: {}", e);
                self.classes.clear();
                self.classes_error = Some(CLASSES_ERROR_TEXT.to_string());
            }
        }
    }

    pub fn request_mails(&mut self) -> ViewAction {
        let (Some(class_id), Some(semester)) = (self.class_id.clone(), self.semester.clone())
        else {
            return ViewAction::Alert(MISSING_SELECTION_TEXT.to_string());
        };
        if self.loading {
            return ViewAction::None;
        }
        self.loading = true;
        self.records.clear();
        self.card_selected = 0;
        self.records_semester = semester.clone();
        ViewAction::Request(RemoteRequest::GenerateMails { class_id, semester })
    }

    /// Mail-generation outcome. Failures drop whatever was shown before.
    pub fn apply_mails(&mut self, result: crate::Result<Vec<MailRecord>>) -> ViewAction {
        self.loading = false;
        self.card_selected = 0;
        match result {
            Ok(records) => {
                self.records = records;
                ViewAction::None
            }
            Err(e) => {
                warn!("Generating mails failed: {}", e);
                self.records.clear();
                self.draft = None;
                ViewAction::Alert(GENERATION_FAILED_TEXT.to_string())
            }
        }
    }

    pub fn request_draft(&mut self, store: &DomainStore) -> ViewAction {
        let selected = self.grade_id.as_deref().and_then(|id| {
            let grade = store.grade(id)?;
            let student = store.student(&grade.student_id)?;
            Some((student.clone(), grade.clone()))
        });
        let Some((student, grade)) = selected else {
            return ViewAction::Alert(NO_GRADE_TEXT.to_string());
        };
        if self.drafting {
            return ViewAction::None;
        }
        self.drafting = true;
        self.draft = None;
        ViewAction::Request(RemoteRequest::DraftMail { student, grade })
    }

    pub fn apply_draft(&mut self, text: String) {
        self.drafting = false;
        self.draft = Some(text);
    }

    pub fn apply_pick(&mut self, target: PickTarget, id: &str) {
        match target {
            PickTarget::Class => self.class_id = Some(id.to_string()),
            PickTarget::Semester => self.semester = Some(id.to_string()),
            PickTarget::MailGrade => {
                if self.grade_id.as_deref() != Some(id) {
                    self.draft = None;
                }
                self.grade_id = Some(id.to_string());
            }
            _ => {}
        }
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            MailMode::Semester => MailMode::SingleGrade,
            MailMode::SingleGrade => MailMode::Semester,
        };
        self.focus = self.order()[0];
    }

    fn order(&self) -> &'static [MailField] {
        match self.mode {
            MailMode::Semester => &SEMESTER_ORDER,
            MailMode::SingleGrade => &SINGLE_GRADE_ORDER,
        }
    }

    /// Picker label for a grade: `Nachname, Vorname — Fach (Note: X)`
    pub fn grade_label(store: &DomainStore, grade: &crate::model::Grade) -> Option<String> {
        let student = store.student(&grade.student_id)?;
        Some(format!(
            "{}, {} — {} (Note: {})",
            student.last_name,
            student.first_name,
            grade.subject,
            format_grade(grade.grade)
        ))
    }

    pub fn handle_key(&mut self, key: KeyEvent, store: &DomainStore) -> ViewAction {
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

        let activate = matches!(key.code, KeyCode::Enter | KeyCode::Char(' '));
        match self.focus {
            MailField::Class if activate => {
                if self.classes_loading {
                    return ViewAction::None;
                }
                ViewAction::Pick {
                    target: PickTarget::Class,
                    title: "Klasse",
                    items: self
                        .classes
                        .iter()
                        .map(|c| PickerItem::new(&c.id, &c.name))
                        .collect(),
                    current: self.class_id.clone(),
                }
            }
            MailField::Semester if activate => ViewAction::Pick {
                target: PickTarget::Semester,
                title: "Semester",
                items: SEMESTERS
                    .iter()
                    .map(|s| PickerItem::new(*s, format!("Semester {s}")))
                    .collect(),
                current: self.semester.clone(),
            },
            MailField::Generate if activate => self.request_mails(),
            MailField::Cards => match key.code {
                KeyCode::Up => {
                    self.card_selected = self.card_selected.saturating_sub(1);
                    ViewAction::None
                }
                KeyCode::Down => {
                    let last = self.records.len().saturating_sub(1);
                    self.card_selected = (self.card_selected + 1).min(last);
                    ViewAction::None
                }
                KeyCode::Enter => self
                    .records
                    .get(self.card_selected)
                    .map(|record| ViewAction::OpenUrl(semester_mailto(&self.records_semester, record)))
                    .unwrap_or(ViewAction::None),
                _ => ViewAction::None,
            },
            MailField::Grade if activate => ViewAction::Pick {
                target: PickTarget::MailGrade,
                title: "Note",
                items: store
                    .grades_newest_first()
                    .filter_map(|g| {
                        Self::grade_label(store, g)
                            .map(|label| PickerItem::new(&g.id, label).with_subtitle(&g.date))
                    })
                    .collect(),
                current: self.grade_id.clone(),
            },
            MailField::Draft if activate => self.request_draft(store),
            MailField::Copy if activate => match &self.draft {
                Some(text) => ViewAction::Copy(text.clone()),
                None => ViewAction::None,
            },
            _ => ViewAction::None,
        }
    }

    pub fn help(&self) -> &'static [(&'static str, &'static str)] {
        match (self.mode, self.focus) {
            (MailMode::Semester, MailField::Cards) => &[
                ("↑↓", "Karte"),
                ("Enter", "Im Mailprogramm öffnen"),
                ("Tab", "Feld"),
                ("Ctrl+T", "KI-Modus"),
            ],
            (MailMode::Semester, _) => &[
                ("Tab", "Feld"),
                ("Enter", "Auswählen"),
                ("Ctrl+T", "KI-Modus"),
                ("F1-F3", "Seite"),
                ("Ctrl+C", "Beenden"),
            ],
            (MailMode::SingleGrade, _) => &[
                ("Tab", "Feld"),
                ("Enter", "Auswählen"),
                ("Ctrl+T", "Semester-Modus"),
                ("F1-F3", "Seite"),
                ("Ctrl+C", "Beenden"),
            ],
        }
    }

    pub fn render(&self, f: &mut Frame, area: Rect, store: &DomainStore) {
        match self.mode {
            MailMode::Semester => self.render_semester(f, area),
            MailMode::SingleGrade => self.render_single_grade(f, area, store),
        }
    }

    fn render_semester(&self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Min(3),
            ])
            .split(area);
        let row = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(40),
                Constraint::Percentage(30),
                Constraint::Min(18),
            ])
            .split(chunks[0]);

        let class_name = self
            .class_id
            .as_deref()
            .map(|id| {
                self.classes
                    .iter()
                    .find(|c| c.id == id)
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| id.to_string())
            })
            .unwrap_or_default();
        let class_placeholder = if self.classes_loading {
            CLASSES_LOADING_TEXT
        } else {
            "Klasse wählen"
        };
        f.render_widget(
            FieldBox {
                label: "Klasse",
                value: &class_name,
                placeholder: class_placeholder,
                focused: self.focus == MailField::Class,
                enabled: !self.classes_loading,
                is_select: true,
            },
            row[0],
        );
        let semester = self
            .semester
            .as_deref()
            .map(|s| format!("Semester {s}"))
            .unwrap_or_default();
        f.render_widget(
            FieldBox {
                label: "Semester",
                value: &semester,
                placeholder: "Semester wählen",
                focused: self.focus == MailField::Semester,
                enabled: true,
                is_select: true,
            },
            row[1],
        );
        let label = if self.loading {
            "Wird generiert..."
        } else {
            "Mails generieren"
        };
        f.render_widget(
            Button {
                label,
                focused: self.focus == MailField::Generate,
                enabled: !self.loading,
            },
            Rect {
                y: row[2].y + 1,
                height: 1,
                ..row[2]
            },
        );

        if let Some(error) = &self.classes_error {
            f.render_widget(
                Paragraph::new(Line::styled(format!(" {error}"), Theme::error())),
                chunks[1],
            );
        }

        self.render_cards(f, chunks[2]);
    }

    fn render_cards(&self, f: &mut Frame, area: Rect) {
        if self.records.is_empty() {
            return;
        }
        let start = first_visible_card(&self.records, self.card_selected, area.height);

        let mut y = area.y;
        for (i, record) in self.records.iter().enumerate().skip(start) {
            let height = card_height(record).min(area.bottom().saturating_sub(y));
            if height < 3 {
                break;
            }
            let selected = self.focus == MailField::Cards && i == self.card_selected;
            let border = if selected {
                Theme::border_focused()
            } else {
                Theme::border()
            };
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(Span::styled(
                    format!(" {} {} ", record.vorname, record.nachname),
                    Theme::bold(),
                ));
            let width = area.width.saturating_sub(2) as usize;
            let mut lines = vec![
                Line::styled(truncate_to_width(&record.email, width), Theme::accent()),
                Line::raw(""),
            ];
            lines.extend(
                record
                    .noten
                    .iter()
                    .map(|n| Line::raw(truncate_to_width(&n.display(), width))),
            );
            f.render_widget(
                Paragraph::new(lines).block(block),
                Rect::new(area.x, y, area.width, height),
            );
            y = y.saturating_add(height);
            if y >= area.bottom() {
                break;
            }
        }
    }

    fn render_single_grade(&self, f: &mut Frame, area: Rect, store: &DomainStore) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Min(5),
            ])
            .split(area);
        let row = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(30), Constraint::Length(20)])
            .split(chunks[0]);

        let label = self
            .grade_id
            .as_deref()
            .and_then(|id| store.grade(id))
            .and_then(|g| Self::grade_label(store, g))
            .unwrap_or_default();
        f.render_widget(
            FieldBox {
                label: "Note",
                value: &label,
                placeholder: "Note wählen",
                focused: self.focus == MailField::Grade,
                enabled: true,
                is_select: true,
            },
            row[0],
        );
        let button = if self.drafting {
            "Wird geschrieben..."
        } else {
            "E-Mail entwerfen"
        };
        f.render_widget(
            Button {
                label: button,
                focused: self.focus == MailField::Draft,
                enabled: self.grade_id.is_some() && !self.drafting,
            },
            Rect {
                y: row[1].y + 1,
                height: 1,
                ..row[1]
            },
        );

        let border = if self.focus == MailField::Copy {
            Theme::border_focused()
        } else {
            Theme::border()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(Span::styled(" Entwurf ", Theme::bold()))
            .title_bottom(Line::styled(" Enter kopieren ", Theme::muted()));

        match &self.draft {
            Some(text) => f.render_widget(
                Paragraph::new(text.as_str())
                    .wrap(Wrap { trim: false })
                    .block(block),
                chunks[2],
            ),
            None if store.list_grades().is_empty() => f.render_widget(
                Notice {
                    title: "Hinweis",
                    text: "Noch keine Noten eingetragen.",
                    style: Theme::warning(),
                },
                chunks[2],
            ),
            None => f.render_widget(
                Paragraph::new(Line::styled(
                    "Wählen Sie eine Note und lassen Sie eine E-Mail entwerfen.",
                    Theme::muted(),
                ))
                .alignment(Alignment::Center)
                .block(block),
                chunks[2],
            ),
        }
    }
}

/// Rows a card needs: borders, email, spacer and one line per grade.
fn card_height(record: &MailRecord) -> u16 {
    u16::try_from(record.noten.len())
        .unwrap_or(u16::MAX)
        .saturating_add(4)
}

/// Index of the first card to draw so that `selected` is the last one that
/// fully fits into `height` rows.
fn first_visible_card(records: &[MailRecord], selected: usize, height: u16) -> usize {
    if records.is_empty() {
        return 0;
    }
    let mut start = selected.min(records.len() - 1);
    let mut used = card_height(&records[start]);
    while start > 0 && used.saturating_add(card_height(&records[start - 1])) <= height {
        start -= 1;
        used = used.saturating_add(card_height(&records[start]));
    }
    start
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewGrade, NewStudent};
    use crate::remote::NoteLine;
    use crate::AppError;
    use tempfile::TempDir;

    fn record(vorname: &str) -> MailRecord {
        MailRecord {
            vorname: vorname.into(),
            nachname: "Huber".into(),
            email: "huber@beispiel.de".into(),
            noten: vec![NoteLine {
                fach: "Mathe".into(),
                note: "2".into(),
            }],
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_mount_bumps_generation_and_resets() {
        let mut view = MailView::new();
        view.class_id = Some("10a".into());
        let first = view.mount();
        let second = view.mount();
        assert_eq!(first, RemoteRequest::LoadClasses { generation: 1 });
        assert_eq!(second, RemoteRequest::LoadClasses { generation: 2 });
        assert!(view.classes_loading);
        assert_eq!(view.class_id, None);
    }

    #[test]
    fn test_stale_class_response_is_ignored() {
        let mut view = MailView::new();
        view.mount();
        view.mount();
        view.apply_classes(
            1,
            Ok(vec![ClassInfo {
                id: "alt".into(),
                name: "alt".into(),
            }]),
        );
        assert!(view.classes.is_empty());
        assert!(view.classes_loading);

        view.apply_classes(
            2,
            Ok(vec![ClassInfo {
                id: "10a".into(),
                name: "10a".into(),
            }]),
        );
        assert_eq!(view.classes.len(), 1);
        assert!(!view.classes_loading);
    }

    #[test]
    fn test_class_failure_shows_inline_error() {
        let mut view = MailView::new();
        view.mount();
        view.apply_classes(1, Err(AppError::Http("network: refused".into())));
        assert!(view.classes.is_empty());
        assert_eq!(view.classes_error.as_deref(), Some(CLASSES_ERROR_TEXT));
    }

    #[test]
    fn test_request_without_selection_is_rejected() {
        let mut view = MailView::new();
        assert_eq!(
            view.request_mails(),
            ViewAction::Alert(MISSING_SELECTION_TEXT.to_string())
        );
        view.apply_pick(PickTarget::Class, "10a");
        assert_eq!(
            view.request_mails(),
            ViewAction::Alert(MISSING_SELECTION_TEXT.to_string())
        );
        assert!(!view.loading);
    }

    #[test]
    fn test_failed_generation_clears_cards() {
        let mut view = MailView::new();
        view.apply_pick(PickTarget::Class, "10a");
        view.apply_pick(PickTarget::Semester, "2");
        assert_eq!(
            view.request_mails(),
            ViewAction::Request(RemoteRequest::GenerateMails {
                class_id: "10a".into(),
                semester: "2".into()
            })
        );
        assert_eq!(view.apply_mails(Ok(vec![record("Eva")])), ViewAction::None);
        assert_eq!(view.records.len(), 1);

        view.request_mails();
        assert!(view.records.is_empty());
        let action = view.apply_mails(Err(AppError::Http("boom".into())));
        assert_eq!(action, ViewAction::Alert(GENERATION_FAILED_TEXT.to_string()));
        assert!(view.records.is_empty());
        assert!(!view.loading);
    }

    #[tokio::test]
    async fn test_card_enter_opens_mailto() {
        let dir = TempDir::new().unwrap();
        let store = DomainStore::open(dir.path()).await.unwrap();
        let mut view = MailView::new();
        view.apply_pick(PickTarget::Class, "10a");
        view.apply_pick(PickTarget::Semester, "2");
        view.request_mails();
        view.apply_mails(Ok(vec![record("Eva"), record("Paul")]));

        view.focus = MailField::Cards;
        view.handle_key(key(KeyCode::Down), &store);
        let action = view.handle_key(key(KeyCode::Enter), &store);
        assert_eq!(
            action,
            ViewAction::OpenUrl(semester_mailto("2", &record("Paul")))
        );
    }

    #[tokio::test]
    async fn test_draft_flow() {
        let dir = TempDir::new().unwrap();
        let mut store = DomainStore::open(dir.path()).await.unwrap();
        let student = store
            .add_student(NewStudent {
                first_name: "Mia".into(),
                last_name: "Schulz".into(),
                email: "schulz@beispiel.de".into(),
            })
            .await
            .unwrap()
            .clone();
        let grade = store
            .add_grade(NewGrade {
                student_id: student.id.clone(),
                subject: "Physik".into(),
                grade: 1.7,
                comment: String::new(),
                date: "2.10.2026".into(),
            })
            .await
            .unwrap()
            .clone();

        assert_eq!(
            MailView::grade_label(&store, &grade).as_deref(),
            Some("Schulz, Mia — Physik (Note: 1.7)")
        );

        let mut view = MailView::new();
        view.toggle_mode();
        assert_eq!(
            view.request_draft(&store),
            ViewAction::Alert(NO_GRADE_TEXT.to_string())
        );

        view.apply_pick(PickTarget::MailGrade, &grade.id);
        assert_eq!(
            view.request_draft(&store),
            ViewAction::Request(RemoteRequest::DraftMail {
                student,
                grade: grade.clone()
            })
        );
        assert!(view.drafting);

        view.apply_draft("Sehr geehrte Eltern".into());
        view.focus = MailField::Copy;
        assert_eq!(
            view.handle_key(key(KeyCode::Enter), &store),
            ViewAction::Copy("Sehr geehrte Eltern".into())
        );
    }

    #[test]
    fn test_card_height_saturates() {
        let mut huge = record("Eva");
        huge.noten = vec![huge.noten[0].clone(); 70_000];
        assert_eq!(card_height(&huge), u16::MAX);
        assert_eq!(card_height(&record("Eva")), 5);

        let cards = vec![huge.clone(), huge, record("Paul")];
        assert_eq!(first_visible_card(&cards, 2, u16::MAX - 1), 2);
        assert_eq!(first_visible_card(&cards, 2, 10), 2);
    }

    #[test]
    fn test_scroll_keeps_selected_card_visible() {
        let cards: Vec<MailRecord> = (0..6).map(|i| record(&format!("K{i}"))).collect();
        // Five rows per card, three cards fit into fifteen rows
        assert_eq!(first_visible_card(&cards, 0, 15), 0);
        assert_eq!(first_visible_card(&cards, 5, 15), 3);
        assert_eq!(first_visible_card(&cards, 9, 15), 3);
    }
}
