//! Domain records: students, grades and the fixed enumerations around them.

use serde::{Deserialize, Serialize};

/// Subjects offered by the grade form. The first entry is the form default.
pub const SUBJECTS: &[&str] = &[
    "Mathematik",
    "Deutsch",
    "Englisch",
    "Französisch",
    "Biologie",
    "Chemie",
    "Physik",
    "Geschichte",
    "Geographie",
    "Informatik",
    "Kunst",
    "Musik",
    "Sport",
];

/// Semesters selectable for server-composed mails.
pub const SEMESTERS: &[&str] = &["1", "2", "3", "4", "5", "6"];

pub const MIN_GRADE: f64 = 1.0;
pub const MAX_GRADE: f64 = 6.0;

/// Placeholder shown when a grade references a student that no longer exists.
pub const UNKNOWN_STUDENT: &str = "Unbekannt";

/// A roster entry with the guardian's mail address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Input for `DomainStore::add_student`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// A single subject evaluation tied to one student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    pub id: String,
    pub student_id: String,
    pub subject: String,
    pub grade: f64,
    pub comment: String,
    pub date: String,
}

impl Grade {
    pub fn severity(&self) -> SeverityBand {
        SeverityBand::of(self.grade)
    }
}

/// Input for `DomainStore::add_grade`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGrade {
    pub student_id: String,
    pub subject: String,
    pub grade: f64,
    pub comment: String,
    pub date: String,
}

/// Three-way classification of a grade value used for color emphasis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeverityBand {
    Favorable,
    Neutral,
    Unfavorable,
}

impl SeverityBand {
    pub fn of(grade: f64) -> Self {
        if grade <= 2.0 {
            SeverityBand::Favorable
        } else if grade <= 4.0 {
            SeverityBand::Neutral
        } else {
            SeverityBand::Unfavorable
        }
    }
}

/// Navigation destinations. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    GradeEntry,
    MailGenerator,
    StudentRoster,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::GradeEntry, Page::MailGenerator, Page::StudentRoster];

    /// Header title of the page.
    pub fn title(self) -> &'static str {
        match self {
            Page::GradeEntry => "Noten Einfügen",
            Page::MailGenerator => "KI Mail-Generator",
            Page::StudentRoster => "Schülerverwaltung",
        }
    }

    /// Sidebar label of the page.
    pub fn label(self) -> &'static str {
        match self {
            Page::GradeEntry => "Noten einfügen",
            Page::MailGenerator => "Mails generieren",
            Page::StudentRoster => "Schüler einfügen",
        }
    }
}

/// Parse a grade typed by the user. Accepts `.` or `,` as decimal separator
/// and requires a value in `[1, 6]` with at most one decimal.
pub fn parse_grade(input: &str) -> Option<f64> {
    let normalized = input.trim().replace(',', ".");
    if normalized.is_empty() {
        return None;
    }
    if let Some((_, decimals)) = normalized.split_once('.') {
        if decimals.len() > 1 {
            return None;
        }
    }
    let value: f64 = normalized.parse().ok()?;
    if !value.is_finite() || !(MIN_GRADE..=MAX_GRADE).contains(&value) {
        return None;
    }
    Some((value * 10.0).round() / 10.0)
}

/// Render a grade the way a number prints: `2`, `2.5`.
pub fn format_grade(grade: f64) -> String {
    if grade.fract() == 0.0 {
        format!("{grade:.0}")
    } else {
        format!("{grade:.1}")
    }
}

/// Today's date as a German calendar date, e.g. `3.9.2026`.
pub fn local_date_string() -> String {
    chrono::Local::now().format("%-d.%-m.%Y").to_string()
}
