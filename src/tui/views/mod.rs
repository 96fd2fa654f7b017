//! Page views
//!
//! Each view owns its form state and turns key presses into either a direct
//! `DomainStore` call or a [`ViewAction`] for the application to carry out
//! (open a picker, show an alert, start a remote request, ...).

mod grades;
mod mail;
mod students;

pub use grades::{GradeField, GradeSubmit, GradesView};
pub use mail::{MailField, MailMode, MailView, CLASSES_ERROR_TEXT};
pub use students::{RosterField, RosterMode, StudentsView};

use std::path::PathBuf;

use crate::model::{Grade, Student};

use super::picker::PickerItem;

/// Which select field a picker result belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickTarget {
    Student,
    Subject,
    Class,
    Semester,
    MailGrade,
}

/// Work that has to leave the event loop
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteRequest {
    /// Class list for the mail page mounted as `generation`
    LoadClasses { generation: u64 },
    GenerateMails { class_id: String, semester: String },
    UploadRoster { path: PathBuf },
    DraftMail { student: Student, grade: Grade },
}

/// What a view asks the application to do after a key press
#[derive(Debug, Clone, PartialEq)]
pub enum ViewAction {
    None,
    Pick {
        target: PickTarget,
        title: &'static str,
        items: Vec<PickerItem>,
        current: Option<String>,
    },
    Alert(String),
    Request(RemoteRequest),
    OpenUrl(String),
    Copy(String),
}

/// Move focus through `order`, wrapping at both ends.
pub(crate) fn cycle<T: Copy + PartialEq>(order: &[T], current: T, forward: bool) -> T {
    let Some(pos) = order.iter().position(|f| *f == current) else {
        return order.first().copied().unwrap_or(current);
    };
    let len = order.len();
    let next = if forward { (pos + 1) % len } else { (pos + len - 1) % len };
    order[next]
}
