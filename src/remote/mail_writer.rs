//! AI mail writer
//!
//! Drafts a German parent mail for a single grade through an
//! OpenAI-compatible Chat Completions endpoint. The public entry point never
//! fails: an empty answer and a failed call each map to a fixed text.

use crate::config::AiConfig;
use crate::model::{format_grade, Grade, Student};
use crate::{AppError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

/// Shown when the model answers with an empty body.
pub const EMPTY_MAIL_TEXT: &str = "Fehler beim Generieren der E-Mail.";
/// Shown when the request itself failed.
pub const FAILED_MAIL_TEXT: &str =
    "Entschuldigung, beim Generieren der E-Mail ist ein Fehler aufgetreten.";

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Build the drafting prompt for one student and grade.
pub fn build_prompt(student: &Student, grade: &Grade) -> String {
    let note = format_grade(grade.grade);
    format!(
        "Erstelle eine professionelle und freundliche E-Mail von einer Lehrkraft an die Eltern \
von {first} {last}.\n\
Fach: {subject}\n\
Note: {note}\n\
Kommentar der Lehrkraft: {comment}\n\
Datum der Bewertung: {date}\n\
\n\
Die E-Mail soll:\n\
1. die Eltern höflich begrüßen,\n\
2. den aktuellen Leistungsstand im Fach {subject} beschreiben,\n\
3. die Note {note} einordnen,\n\
4. den Kommentar \"{comment}\" aufgreifen,\n\
5. je nach Note Unterstützung anbieten oder loben,\n\
6. mit einer professionellen Grußformel enden.\n\
Sprache: Deutsch.",
        first = student.first_name,
        last = student.last_name,
        subject = grade.subject,
        comment = grade.comment,
        date = grade.date,
    )
}

/// Client for the text-completion collaborator.
#[derive(Debug, Clone)]
pub struct MailWriter {
    client: Client,
    config: AiConfig,
}

impl MailWriter {
    pub fn new(config: AiConfig) -> Self {
        let client = Client::builder()
            .user_agent(concat!("lehrer-assistent/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, config }
    }

    /// Draft a mail. Always returns displayable text.
    pub async fn generate_email_feedback(&self, student: &Student, grade: &Grade) -> String {
        let prompt = build_prompt(student, grade);
        match self.complete(&prompt).await {
            Ok(text) => mail_text_or_placeholder(text),
            Err(e) => {
                error!("AI mail generation failed: {}", e);
                FAILED_MAIL_TEXT.to_string()
            }
        }
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.config.base_url);
        debug!("Calling {} with prompt length {}", url, prompt.len());

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            stream: false,
        };

        let mut builder = self.client.post(&url).json(&request);
        match &self.config.api_key {
            Some(key) => builder = builder.bearer_auth(key),
            None => warn!("No AI API key configured, sending request without credentials"),
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Status {
                endpoint: url,
                status,
            });
        }

        let chat: ChatResponse = response.json().await?;
        Ok(chat
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default())
    }
}

fn mail_text_or_placeholder(text: String) -> String {
    if text.trim().is_empty() {
        EMPTY_MAIL_TEXT.to_string()
    } else {
        text
    }
}
