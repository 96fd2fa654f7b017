//! Clipboard helpers for copying generated mails.

use crate::{AppError, Result};

/// Put `text` on the system clipboard.
pub fn copy_text(text: &str) -> Result<()> {
    let mut cb = arboard::Clipboard::new().map_err(|e| AppError::Clipboard(e.to_string()))?;
    cb.set_text(text.to_string())
        .map_err(|e| AppError::Clipboard(e.to_string()))
}
