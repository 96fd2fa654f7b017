//! HTTP client for the school API.

use crate::{AppError, Result};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

use super::normalize::{normalize_classes, normalize_mail_records, ClassInfo, MailRecord};

const CLASSES_PATH: &str = "/api/klassen";
const MAILS_PATH: &str = "/api/mails";
const STUDENTS_UPLOAD_PATH: &str = "/api/schueler";

/// Multipart field carrying the uploaded roster file.
pub const UPLOAD_FIELD: &str = "selectedFile";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MailRequest<'a> {
    selected_class_id: &'a str,
    selected_semester: &'a str,
}

/// Client for `/api/klassen`, `/api/mails` and `/api/schueler`.
///
/// Cheap to clone; every request task gets its own copy. No timeouts are
/// configured, a hung request stays pending until the server answers.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .user_agent(concat!("lehrer-assistent/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fetch the class list.
    pub async fn fetch_classes(&self) -> Result<Vec<ClassInfo>> {
        debug!("GET {}", CLASSES_PATH);
        let response = self.client.get(self.url(CLASSES_PATH)).send().await?;
        let response = check_status(CLASSES_PATH, response)?;
        let data: serde_json::Value = response.json().await?;
        Ok(normalize_classes(&data))
    }

    /// Ask the server to compose mail records for a class and semester.
    pub async fn generate_mails(&self, class_id: &str, semester: &str) -> Result<Vec<MailRecord>> {
        debug!("POST {} class={} semester={}", MAILS_PATH, class_id, semester);
        let response = self
            .client
            .post(self.url(MAILS_PATH))
            .json(&MailRequest {
                selected_class_id: class_id,
                selected_semester: semester,
            })
            .send()
            .await?;
        let response = check_status(MAILS_PATH, response)?;
        let data: serde_json::Value = response.json().await?;
        debug!("Mail generation response: {}", data);
        Ok(normalize_mail_records(&data))
    }

    /// Upload a roster file for server-side import. Returns the server's
    /// acknowledgment as-is.
    pub async fn upload_roster(&self, file: &Path) -> Result<serde_json::Value> {
        let bytes = tokio::fs::read(file).await?;
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());

        let form = Form::new().part(UPLOAD_FIELD, Part::bytes(bytes).file_name(file_name.clone()));
        debug!("POST {} file={}", STUDENTS_UPLOAD_PATH, file_name);
        let response = self
            .client
            .post(self.url(STUDENTS_UPLOAD_PATH))
            .multipart(form)
            .send()
            .await?;
        let response = check_status(STUDENTS_UPLOAD_PATH, response)?;
        let text = response.text().await?;
        let ack = serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));
        info!("Roster upload acknowledged: {}", ack);
        Ok(ack)
    }
}

fn check_status(endpoint: &str, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(AppError::Status {
            endpoint: endpoint.to_string(),
            status,
        })
    }
}
