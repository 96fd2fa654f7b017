//! Integration tests for Lehrer-Assistent

use lehrer_assistent::mailto::semester_mailto;
use lehrer_assistent::config::AiConfig;
use lehrer_assistent::remote::{
    ApiClient, MailRecord, MailWriter, NoteLine, EMPTY_MAIL_TEXT, FAILED_MAIL_TEXT,
};
use lehrer_assistent::store::{SlotStore, GRADES_SLOT, STUDENTS_SLOT};
use lehrer_assistent::tui::{MailView, RemoteRequest, ViewAction, CLASSES_ERROR_TEXT};
use lehrer_assistent::{DomainStore, Grade, NewGrade, NewStudent, Student};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serve exactly one HTTP response on a random local port. The handle
/// resolves to the raw request that was received.
async fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
        request
    });
    (base_url, handle)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = socket.read(&mut buf).await.unwrap();
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);

        let text = String::from_utf8_lossy(&data);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let headers = text[..header_end].to_ascii_lowercase();
            if headers.contains("transfer-encoding: chunked") {
                if text.ends_with("0\r\n\r\n") {
                    break;
                }
                continue;
            }
            let content_length = text[..header_end]
                .lines()
                .find_map(|l| {
                    let (name, value) = l.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if data.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&data).to_string()
}

fn student(first: &str, last: &str) -> NewStudent {
    NewStudent {
        first_name: first.to_string(),
        last_name: last.to_string(),
        email: format!("{}.{}@beispiel.de", first.to_lowercase(), last.to_lowercase()),
    }
}

fn grade(student_id: &str, subject: &str, value: f64) -> NewGrade {
    NewGrade {
        student_id: student_id.to_string(),
        subject: subject.to_string(),
        grade: value,
        comment: "Gute Mitarbeit".to_string(),
        date: "14.10.2026".to_string(),
    }
}

/// Reopening the store reproduces both collections in the same order
#[tokio::test]
async fn test_store_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();

    let (students, grades) = {
        let mut store = DomainStore::open(temp_dir.path()).await.unwrap();
        let anna = store.add_student(student("Anna", "Berg")).await.unwrap().id.clone();
        let ben = store.add_student(student("Ben", "Adler")).await.unwrap().id.clone();
        store.add_grade(grade(&ben, "Deutsch", 3.0)).await.unwrap();
        store.add_grade(grade(&anna, "Mathematik", 1.5)).await.unwrap();
        (store.list_students().to_vec(), store.list_grades().to_vec())
    };

    let reopened = DomainStore::open(temp_dir.path()).await.unwrap();
    assert_eq!(reopened.list_students(), students.as_slice());
    assert_eq!(reopened.list_grades(), grades.as_slice());

    assert!(temp_dir.path().join("la_students.json").exists());
    assert!(temp_dir.path().join("la_grades.json").exists());
}

/// Deleting a student rewrites both slots
#[tokio::test]
async fn test_cascade_delete_is_persisted() {
    let temp_dir = TempDir::new().unwrap();
    let mut store = DomainStore::open(temp_dir.path()).await.unwrap();
    let anna = store.add_student(student("Anna", "Berg")).await.unwrap().id.clone();
    let ben = store.add_student(student("Ben", "Adler")).await.unwrap().id.clone();
    store.add_grade(grade(&anna, "Kunst", 2.0)).await.unwrap();
    store.add_grade(grade(&ben, "Sport", 1.0)).await.unwrap();

    store.delete_student(&anna).await.unwrap();

    let slots = SlotStore::new(temp_dir.path()).await.unwrap();
    let students: Vec<Student> = slots.load(STUDENTS_SLOT).await.unwrap();
    let grades: Vec<Grade> = slots.load(GRADES_SLOT).await.unwrap();
    assert_eq!(students.len(), 1);
    assert_eq!(students[0].id, ben);
    assert_eq!(grades.len(), 1);
    assert_eq!(grades[0].student_id, ben);
}

/// A slot with one malformed entry is kept on disk, not overwritten by the
/// next write
#[tokio::test]
async fn test_unparsable_grades_survive_next_write() {
    let temp_dir = TempDir::new().unwrap();
    let mut entries: Vec<serde_json::Value> = (0..40)
        .map(|i| {
            serde_json::json!({
                "id": format!("g{i}"),
                "studentId": "s1",
                "subject": "Mathematik",
                "grade": 2.0,
                "comment": "",
                "date": "1.9.2026"
            })
        })
        .collect();
    entries.push(serde_json::json!({
        "id": "g40", "studentId": "s1", "subject": "Deutsch",
        "grade": "2", "comment": "", "date": "1.9.2026"
    }));
    let original = serde_json::to_string(&entries).unwrap();
    std::fs::write(temp_dir.path().join("la_grades.json"), &original).unwrap();

    let mut store = DomainStore::open(temp_dir.path()).await.unwrap();
    assert!(store.list_grades().is_empty());
    store.add_grade(grade("s1", "Kunst", 1.0)).await.unwrap();

    let backup = std::fs::read_to_string(temp_dir.path().join("la_grades.json.bak")).unwrap();
    assert_eq!(backup, original);
    let slots = SlotStore::new(temp_dir.path()).await.unwrap();
    let grades: Vec<Grade> = slots.load(GRADES_SLOT).await.unwrap();
    assert_eq!(grades.len(), 1);
}

/// Class list with mixed item shapes
#[tokio::test]
async fn test_fetch_classes_normalizes_items() {
    let (base_url, server) = serve_once(
        "200 OK",
        r#"["5b", {"id": "k1", "name": "6c"}, {"klasse": "7a"}, {"value": "x"}, 42]"#,
    )
    .await;

    let classes = ApiClient::new(base_url).fetch_classes().await.unwrap();
    let pairs: Vec<(&str, &str)> = classes
        .iter()
        .map(|c| (c.id.as_str(), c.name.as_str()))
        .collect();
    assert_eq!(pairs, vec![("5b", "5b"), ("k1", "6c"), ("7a", "7a")]);

    let request = server.await.unwrap();
    assert!(request.starts_with("GET /api/klassen "));
}

/// HTTP 500 on the class list: no options, inline error, no panic
#[tokio::test]
async fn test_class_list_server_error() {
    let (base_url, server) = serve_once("500 Internal Server Error", "{}").await;

    let result = ApiClient::new(base_url).fetch_classes().await;
    assert!(result.is_err());
    server.await.unwrap();

    let mut view = MailView::new();
    let RemoteRequest::LoadClasses { generation } = view.mount() else {
        panic!("mount must load classes");
    };
    view.apply_classes(generation, result);
    assert!(view.classes.is_empty());
    assert_eq!(view.classes_error.as_deref(), Some(CLASSES_ERROR_TEXT));
}

/// Mail generation for 10a / semester 2 answering `[]`: no cards, no error
#[tokio::test]
async fn test_generate_mails_empty_result() {
    let (base_url, server) = serve_once("200 OK", "[]").await;

    let result = ApiClient::new(base_url).generate_mails("10a", "2").await;

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /api/mails "));
    let body = request.split("\r\n\r\n").nth(1).unwrap_or_default();
    let body: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(
        body,
        serde_json::json!({"selectedClassId": "10a", "selectedSemester": "2"})
    );

    let mut view = MailView::new();
    view.class_id = Some("10a".to_string());
    view.semester = Some("2".to_string());
    assert!(matches!(view.request_mails(), ViewAction::Request(_)));
    assert_eq!(view.apply_mails(result), ViewAction::None);
    assert!(view.records.is_empty());
    assert!(!view.loading);
}

/// Records with encoded and structured grade entries
#[tokio::test]
async fn test_generate_mails_normalizes_records() {
    let body = r#"[
        {"vorname": "Eva", "nachname": "Huber", "email": "huber@beispiel.de",
         "noten": ["{\"fach\":\"Mathe\",\"note\":2}", {"fach": "Deutsch", "note": "1-"}]},
        {"vorname": 7, "nachname": null, "email": "x@y.de", "noten": "{\"fach\":\"Kunst\",\"note\":3}"},
        "kein Objekt"
    ]"#;
    let (base_url, server) = serve_once("200 OK", body).await;

    let records = ApiClient::new(base_url)
        .generate_mails("10a", "2")
        .await
        .unwrap();
    server.await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(
        records[0].noten,
        vec![
            NoteLine {
                fach: "Mathe".into(),
                note: "2".into()
            },
            NoteLine {
                fach: "Deutsch".into(),
                note: "1-".into()
            },
        ]
    );
    assert_eq!(records[1].vorname, "");
    assert_eq!(records[1].nachname, "");
    assert_eq!(records[1].noten.len(), 1);
}

/// Non-2xx mail generation is an error
#[tokio::test]
async fn test_generate_mails_rejected() {
    let (base_url, server) = serve_once("403 Forbidden", "{}").await;
    let result = ApiClient::new(base_url).generate_mails("10a", "2").await;
    server.await.unwrap();
    assert!(result.is_err());
}

/// The roster file goes up as multipart field `selectedFile`
#[tokio::test]
async fn test_upload_roster_multipart() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("klasse.csv");
    std::fs::write(&file, "Vorname;Nachname;Email\nLena;Kraus;k@b.de\n").unwrap();
    let (base_url, server) = serve_once("201 Created", r#"{"imported": 1}"#).await;

    let ack = ApiClient::new(base_url).upload_roster(&file).await.unwrap();
    assert_eq!(ack, serde_json::json!({"imported": 1}));

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /api/schueler "));
    assert!(request.contains("name=\"selectedFile\""));
    assert!(request.contains("filename=\"klasse.csv\""));
    assert!(request.contains("Lena;Kraus"));
}

#[test]
fn test_semester_mailto_encoding() {
    let record = MailRecord {
        vorname: "Jörg".into(),
        nachname: "Groß".into(),
        email: "eltern+groß@beispiel.de".into(),
        noten: vec![
            NoteLine {
                fach: "Mathe".into(),
                note: "2".into(),
            },
            NoteLine {
                fach: "Deutsch".into(),
                note: "1".into(),
            },
        ],
    };

    assert_eq!(
        semester_mailto("2", &record),
        "mailto:eltern%2Bgro%C3%9F%40beispiel.de\
?subject=Noten%20Semester%202%3A%20J%C3%B6rg%20Gro%C3%9F\
&body=Mathe%20%3A%202%0ADeutsch%20%3A%201"
    );
}

fn writer(base_url: String) -> MailWriter {
    MailWriter::new(AiConfig {
        base_url,
        model: "test-model".to_string(),
        api_key: Some("geheim".to_string()),
    })
}

fn draft_fixtures() -> (Student, Grade) {
    let student = Student {
        id: "s1".into(),
        first_name: "Mia".into(),
        last_name: "Schulz".into(),
        email: "schulz@beispiel.de".into(),
    };
    let grade = Grade {
        id: "g1".into(),
        student_id: "s1".into(),
        subject: "Physik".into(),
        grade: 2.5,
        comment: "Aufmerksam".into(),
        date: "3.9.2026".into(),
    };
    (student, grade)
}

/// The assistant message becomes the mail body
#[tokio::test]
async fn test_mail_writer_returns_answer() {
    let (base_url, server) = serve_once(
        "200 OK",
        r#"{"choices":[{"message":{"role":"assistant","content":"Sehr geehrte Familie Schulz"}}]}"#,
    )
    .await;
    let (student, grade) = draft_fixtures();

    let text = writer(base_url).generate_email_feedback(&student, &grade).await;
    assert_eq!(text, "Sehr geehrte Familie Schulz");

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /chat/completions "));
    assert!(request.to_ascii_lowercase().contains("authorization: bearer geheim"));
    assert!(request.contains("test-model"));
}

/// No choices at all
#[tokio::test]
async fn test_mail_writer_empty_choices() {
    let (base_url, server) = serve_once("200 OK", r#"{"choices":[]}"#).await;
    let (student, grade) = draft_fixtures();

    let text = writer(base_url).generate_email_feedback(&student, &grade).await;
    server.await.unwrap();
    assert_eq!(text, EMPTY_MAIL_TEXT);
}

/// A choice whose content is blank
#[tokio::test]
async fn test_mail_writer_blank_content() {
    let (base_url, server) = serve_once(
        "200 OK",
        r#"{"choices":[{"message":{"role":"assistant","content":"  "}}]}"#,
    )
    .await;
    let (student, grade) = draft_fixtures();

    let text = writer(base_url).generate_email_feedback(&student, &grade).await;
    server.await.unwrap();
    assert_eq!(text, EMPTY_MAIL_TEXT);
}

/// Non-2xx from the model endpoint
#[tokio::test]
async fn test_mail_writer_server_error() {
    let (base_url, server) = serve_once("429 Too Many Requests", r#"{"error":"quota"}"#).await;
    let (student, grade) = draft_fixtures();

    let text = writer(base_url).generate_email_feedback(&student, &grade).await;
    server.await.unwrap();
    assert_eq!(text, FAILED_MAIL_TEXT);
}
