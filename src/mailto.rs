//! `mailto:` links for server-composed semester mails.

use crate::remote::MailRecord;
use crate::{AppError, Result};
use std::process::{Command, Stdio};
use tracing::debug;

/// Subject line of a semester mail.
pub fn semester_subject(semester: &str, record: &MailRecord) -> String {
    format!(
        "Noten Semester {}: {} {}",
        semester, record.vorname, record.nachname
    )
}

/// Mail body: one `Fach : Note` line per grade entry.
pub fn semester_body(record: &MailRecord) -> String {
    record
        .noten
        .iter()
        .map(|line| line.display())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the full `mailto:` URL for a record.
pub fn semester_mailto(semester: &str, record: &MailRecord) -> String {
    format!(
        "mailto:{}?subject={}&body={}",
        encode_uri_component(&record.email),
        encode_uri_component(&semester_subject(semester, record)),
        encode_uri_component(&semester_body(record)),
    )
}

/// Percent-encode everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`,
/// matching JavaScript's `encodeURIComponent`.
pub fn encode_uri_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Program and arguments that open `url` with the default handler on `os`
/// (as in `std::env::consts::OS`).
///
/// Windows goes through `rundll32 url.dll,FileProtocolHandler`, which gets
/// the URL as one argument; `cmd /C start` would split it at `&`.
pub fn opener_command(os: &str, url: &str) -> (&'static str, Vec<String>) {
    match os {
        "macos" => ("open", vec![url.to_string()]),
        "windows" => (
            "rundll32",
            vec!["url.dll,FileProtocolHandler".to_string(), url.to_string()],
        ),
        _ => ("xdg-open", vec![url.to_string()]),
    }
}

/// Hand a URL to the platform's default handler (the mail client for
/// `mailto:`).
pub fn open_url(url: &str) -> Result<()> {
    debug!("Opening {}", url);
    let (program, args) = opener_command(std::env::consts::OS, url);

    Command::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
        .map_err(|e| AppError::MailClient(format!("{program}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::NoteLine;

    fn record() -> MailRecord {
        MailRecord {
            vorname: "Jonas".into(),
            nachname: "Weiß".into(),
            email: "weiss+eltern@beispiel.de".into(),
            noten: vec![
                NoteLine { fach: "Mathematik".into(), note: "2".into() },
                NoteLine { fach: "Deutsch".into(), note: "1.7".into() },
            ],
        }
    }

    #[test]
    fn test_subject_and_body() {
        let r = record();
        assert_eq!(semester_subject("2", &r), "Noten Semester 2: Jonas Weiß");
        assert_eq!(semester_body(&r), "Mathematik : 2\nDeutsch : 1.7");
    }

    #[test]
    fn test_encode_uri_component() {
        assert_eq!(encode_uri_component("a b&c=d"), "a%20b%26c%3Dd");
        assert_eq!(encode_uri_component("it's (ok)!"), "it's%20(ok)!");
        assert_eq!(encode_uri_component("ß"), "%C3%9F");
        assert_eq!(encode_uri_component("x\ny"), "x%0Ay");
        assert_eq!(encode_uri_component("a+b@c"), "a%2Bb%40c");
    }

    #[test]
    fn test_full_mailto() {
        let url = semester_mailto("2", &record());
        assert_eq!(
            url,
            "mailto:weiss%2Beltern%40beispiel.de\
?subject=Noten%20Semester%202%3A%20Jonas%20Wei%C3%9F\
&body=Mathematik%20%3A%202%0ADeutsch%20%3A%201.7"
        );
    }

    #[test]
    fn test_empty_noten_gives_empty_body() {
        let mut r = record();
        r.noten.clear();
        assert!(semester_mailto("1", &r).ends_with("&body="));
    }

    #[test]
    fn test_windows_opener_keeps_url_as_one_argument() {
        let url = semester_mailto("2", &record());
        let (program, args) = opener_command("windows", &url);
        assert_eq!(program, "rundll32");
        assert_eq!(args, vec!["url.dll,FileProtocolHandler".to_string(), url.clone()]);
        assert!(args[1].contains("&body="));
    }

    #[test]
    fn test_unix_openers() {
        assert_eq!(opener_command("macos", "mailto:a").0, "open");
        assert_eq!(opener_command("linux", "mailto:a"), ("xdg-open", vec!["mailto:a".to_string()]));
    }
}
