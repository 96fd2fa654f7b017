//! Store module
//!
//! Owns the student and grade collections and mirrors them to the data
//! directory after every mutation.

mod domain;
mod slots;

pub use domain::DomainStore;
pub use slots::{SlotStore, GRADES_SLOT, STUDENTS_SLOT};
