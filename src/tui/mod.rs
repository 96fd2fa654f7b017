//! Terminal user interface

mod app;
mod clipboard;
mod input;
mod picker;
mod state;
mod theme;
mod views;
mod widgets;

pub use app::App;
pub use input::{FieldAction, TextField};
pub use picker::{Picker, PickerItem};
pub use state::{AppState, RemoteEvent};
pub use views::{
    GradeField, GradeSubmit, GradesView, MailField, MailMode, MailView, PickTarget,
    RemoteRequest, RosterField, RosterMode, StudentsView, ViewAction, CLASSES_ERROR_TEXT,
};
