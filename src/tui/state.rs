//! Application state, separate from the terminal so it can be driven in tests.

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::mailto::open_url;
use crate::model::Page;
use crate::remote::{ApiClient, ClassInfo, MailRecord, MailWriter};
use crate::store::DomainStore;

use super::clipboard::copy_text;
use super::picker::Picker;
use super::views::{GradesView, MailView, PickTarget, RemoteRequest, StudentsView, ViewAction};

const QUIT_WINDOW: Duration = Duration::from_secs(2);
const QUIT_HINT: &str = "Zum Beenden Ctrl+C erneut drücken";

/// Outcome of a spawned remote call
#[derive(Debug)]
pub enum RemoteEvent {
    ClassesLoaded {
        generation: u64,
        result: crate::Result<Vec<ClassInfo>>,
    },
    MailsGenerated(crate::Result<Vec<MailRecord>>),
    RosterUploaded(crate::Result<serde_json::Value>),
    MailDrafted(String),
}

pub struct AppState {
    pub store: DomainStore,
    api: ApiClient,
    writer: MailWriter,
    pub page: Page,
    pub grades: GradesView,
    pub mail: MailView,
    pub students: StudentsView,
    pub picker: Picker,
    pick_target: Option<PickTarget>,
    pub alert: Option<String>,
    pub status: Option<String>,
    pub should_quit: bool,
    quit_armed_at: Option<Instant>,
    events_tx: mpsc::UnboundedSender<RemoteEvent>,
    events_rx: mpsc::UnboundedReceiver<RemoteEvent>,
}

impl AppState {
    pub fn new(store: DomainStore, api: ApiClient, writer: MailWriter) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            store,
            api,
            writer,
            page: Page::default(),
            grades: GradesView::new(),
            mail: MailView::new(),
            students: StudentsView::new(),
            picker: Picker::default(),
            pick_target: None,
            alert: None,
            status: None,
            should_quit: false,
            quit_armed_at: None,
            events_tx,
            events_rx,
        }
    }

    /// Switch pages. The target view always starts from fresh state.
    pub fn navigate(&mut self, page: Page) {
        debug!("Navigating to {:?}", page);
        self.page = page;
        self.picker.close();
        self.pick_target = None;
        self.status = None;
        match page {
            Page::GradeEntry => self.grades.mount(),
            Page::StudentRoster => self.students.mount(),
            Page::MailGenerator => {
                let request = self.mail.mount();
                self.spawn(request);
            }
        }
    }

    pub fn is_busy(&self) -> bool {
        match self.page {
            Page::MailGenerator => self.mail.is_busy(),
            Page::StudentRoster => self.students.uploading,
            Page::GradeEntry => false,
        }
    }

    pub fn help(&self) -> &'static [(&'static str, &'static str)] {
        if self.alert.is_some() {
            return &[("Enter/Esc", "Schließen")];
        }
        if self.picker.visible {
            return &[("↑↓", "Auswahl"), ("Enter", "Übernehmen"), ("Esc", "Abbrechen")];
        }
        match self.page {
            Page::GradeEntry => self.grades.help(),
            Page::MailGenerator => self.mail.help(),
            Page::StudentRoster => self.students.help(),
        }
    }

    pub async fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        if ctrl && key.code == KeyCode::Char('c') {
            self.handle_quit_key();
            return;
        }
        if self.quit_armed_at.take().is_some() {
            self.status = None;
        }

        if self.alert.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.alert = None;
            }
            return;
        }

        if self.picker.visible {
            self.handle_picker_key(key);
            return;
        }

        let page = match key.code {
            KeyCode::F(1) => Some(Page::GradeEntry),
            KeyCode::F(2) => Some(Page::MailGenerator),
            KeyCode::F(3) => Some(Page::StudentRoster),
            _ => None,
        };
        if let Some(page) = page {
            // Selecting the page already shown keeps its state
            if page != self.page {
                self.navigate(page);
            }
            return;
        }

        self.status = None;
        let action = match self.page {
            Page::GradeEntry => self.grades.handle_key(key, &mut self.store).await,
            Page::MailGenerator => self.mail.handle_key(key, &self.store),
            Page::StudentRoster => self.students.handle_key(key, &mut self.store).await,
        };
        self.dispatch(action);
    }

    fn handle_quit_key(&mut self) {
        let armed = self
            .quit_armed_at
            .is_some_and(|at| at.elapsed() < QUIT_WINDOW);
        if armed {
            self.should_quit = true;
        } else {
            self.quit_armed_at = Some(Instant::now());
            self.status = Some(QUIT_HINT.to_string());
        }
    }

    fn handle_picker_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => self.picker.select_prev(),
            KeyCode::Down => self.picker.select_next(),
            KeyCode::Esc => {
                self.picker.close();
                self.pick_target = None;
            }
            KeyCode::Enter => {
                let chosen = self.picker.selected_item().map(|item| item.id.clone());
                let target = self.pick_target.take();
                self.picker.close();
                if let (Some(target), Some(id)) = (target, chosen) {
                    self.apply_pick(target, &id);
                }
            }
            _ => {}
        }
    }

    fn apply_pick(&mut self, target: PickTarget, id: &str) {
        match target {
            PickTarget::Student | PickTarget::Subject => self.grades.apply_pick(target, id),
            PickTarget::Class | PickTarget::Semester | PickTarget::MailGrade => {
                self.mail.apply_pick(target, id)
            }
        }
    }

    /// Pasted text, including files dropped onto the terminal
    pub fn handle_paste(&mut self, text: &str) {
        if self.alert.is_some() || self.picker.visible {
            return;
        }
        match self.page {
            Page::StudentRoster => self.students.handle_paste(text),
            Page::GradeEntry => {
                let field = match self.grades.focus {
                    super::views::GradeField::Grade => Some(&mut self.grades.grade),
                    super::views::GradeField::Comment => Some(&mut self.grades.comment),
                    _ => None,
                };
                if let Some(field) = field {
                    field.insert_str(text);
                }
            }
            Page::MailGenerator => {}
        }
    }

    pub fn dispatch(&mut self, action: ViewAction) {
        match action {
            ViewAction::None => {}
            ViewAction::Pick {
                target,
                title,
                items,
                current,
            } => {
                self.picker.open(title, items, current.as_deref());
                self.pick_target = Some(target);
            }
            ViewAction::Alert(message) => self.alert = Some(message),
            ViewAction::Request(request) => self.spawn(request),
            ViewAction::OpenUrl(url) => match open_url(&url) {
                Ok(()) => self.status = Some("Mailprogramm geöffnet.".to_string()),
                Err(e) => {
                    warn!("{}", e);
                    self.alert = Some(format!("Mailprogramm konnte nicht geöffnet werden: {e}"));
                }
            },
            ViewAction::Copy(text) => match copy_text(&text) {
                Ok(()) => self.status = Some("In die Zwischenablage kopiert.".to_string()),
                Err(e) => {
                    warn!("{}", e);
                    self.alert = Some(format!("Kopieren fehlgeschlagen: {e}"));
                }
            },
        }
    }

    /// Run a remote call off the event loop. The result comes back through
    /// the event channel.
    fn spawn(&self, request: RemoteRequest) {
        let tx = self.events_tx.clone();
        match request {
            RemoteRequest::LoadClasses { generation } => {
                let api = self.api.clone();
                tokio::spawn(async move {
                    let result = api.fetch_classes().await;
                    let _ = tx.send(RemoteEvent::ClassesLoaded { generation, result });
                });
            }
            RemoteRequest::GenerateMails { class_id, semester } => {
                let api = self.api.clone();
                tokio::spawn(async move {
                    let result = api.generate_mails(&class_id, &semester).await;
                    let _ = tx.send(RemoteEvent::MailsGenerated(result));
                });
            }
            RemoteRequest::UploadRoster { path } => {
                let api = self.api.clone();
                tokio::spawn(async move {
                    let result = api.upload_roster(&path).await;
                    let _ = tx.send(RemoteEvent::RosterUploaded(result));
                });
            }
            RemoteRequest::DraftMail { student, grade } => {
                let writer = self.writer.clone();
                tokio::spawn(async move {
                    let text = writer.generate_email_feedback(&student, &grade).await;
                    let _ = tx.send(RemoteEvent::MailDrafted(text));
                });
            }
        }
    }

    /// Apply every remote outcome that arrived since the last frame.
    pub fn drain_events(&mut self) {
        let mut events = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            events.push(event);
        }
        for event in events {
            self.handle_event(event);
        }
    }

    /// Wait for the next remote outcome.
    pub async fn next_event(&mut self) -> Option<RemoteEvent> {
        self.events_rx.recv().await
    }

    pub fn handle_event(&mut self, event: RemoteEvent) {
        match event {
            RemoteEvent::ClassesLoaded { generation, result } => {
                if self.page != Page::MailGenerator {
                    debug!("Dropping class list for unmounted mail page");
                    return;
                }
                self.mail.apply_classes(generation, result);
            }
            RemoteEvent::MailsGenerated(result) => {
                let action = self.mail.apply_mails(result);
                self.dispatch(action);
            }
            RemoteEvent::RosterUploaded(result) => self.students.apply_upload(result),
            RemoteEvent::MailDrafted(text) => self.mail.apply_draft(text),
        }
    }
}
