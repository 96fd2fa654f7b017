//! Lehrer-Assistent
//!
//! A terminal gradebook for teachers:
//! - Keep a student roster and record subject grades locally
//! - Generate parent notification mails, either per class/semester through the
//!   school API or per grade through an AI writer
//! - Mirror all state to two JSON slots in the data directory

pub mod config;
pub mod mailto;
pub mod model;
pub mod remote;
pub mod store;
pub mod tui;

pub use config::AppConfig;
pub use model::{Grade, NewGrade, NewStudent, Page, SeverityBand, Student};
pub use store::DomainStore;

/// Result type for Lehrer-Assistent operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Errors that can occur in Lehrer-Assistent
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("{endpoint} answered with status {status}")]
    Status {
        endpoint: String,
        status: reqwest::StatusCode,
    },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("Could not open mail client: {0}")]
    MailClient(String),
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            AppError::Http(format!("network: {e}"))
        } else {
            AppError::Http(e.to_string())
        }
    }
}
