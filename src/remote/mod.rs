//! Remote collaborators: the school API and the AI mail writer.

mod client;
mod mail_writer;
pub mod normalize;

pub use client::{ApiClient, UPLOAD_FIELD};
pub use mail_writer::{build_prompt, MailWriter, EMPTY_MAIL_TEXT, FAILED_MAIL_TEXT};
pub use normalize::{ClassInfo, MailRecord, NoteLine};
