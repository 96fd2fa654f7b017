//! Single-line text fields for the forms.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use unicode_width::UnicodeWidthChar;

/// Result of feeding a key to a text field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldAction {
    /// The key was not for the field (focus movement, shortcuts, ...)
    Ignored,
    /// Content or cursor changed
    Edited,
    /// Enter pressed: submit the surrounding form
    Submit,
}

/// Editable line of text.
///
/// Note: `cursor` is a CHARACTER index, not a byte index, so umlauts and
/// other multi-byte characters edit correctly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextField {
    buffer: String,
    cursor: usize,
}

impl TextField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: &str) -> Self {
        let mut field = Self::new();
        field.set(value);
        field
    }

    pub fn value(&self) -> &str {
        &self.buffer
    }

    pub fn is_blank(&self) -> bool {
        self.buffer.trim().is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Replace the content and move the cursor to the end
    pub fn set(&mut self, value: &str) {
        self.buffer = value.to_string();
        self.cursor = self.char_count();
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
    }

    /// Insert pasted text at the cursor. Line breaks are dropped.
    pub fn insert_str(&mut self, text: &str) {
        for c in text.chars().filter(|c| *c != '\n' && *c != '\r') {
            self.insert_char(c);
        }
    }

    fn char_count(&self) -> usize {
        self.buffer.chars().count()
    }

    fn char_to_byte_index(&self, char_idx: usize) -> usize {
        self.buffer
            .char_indices()
            .nth(char_idx)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.buffer.len())
    }

    fn insert_char(&mut self, c: char) {
        let byte_idx = self.char_to_byte_index(self.cursor);
        self.buffer.insert(byte_idx, c);
        self.cursor += 1;
    }

    fn remove_char_before_cursor(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.remove_char_at_cursor();
        }
    }

    fn remove_char_at_cursor(&mut self) {
        if self.cursor < self.char_count() {
            let byte_idx = self.char_to_byte_index(self.cursor);
            if let Some(ch) = self.buffer[byte_idx..].chars().next() {
                self.buffer.replace_range(byte_idx..byte_idx + ch.len_utf8(), "");
            }
        }
    }

    fn delete_word(&mut self) {
        while self.cursor > 0 && self.char_before_cursor() == Some(' ') {
            self.remove_char_before_cursor();
        }
        while self.cursor > 0 && self.char_before_cursor() != Some(' ') {
            self.remove_char_before_cursor();
        }
    }

    fn char_before_cursor(&self) -> Option<char> {
        self.cursor
            .checked_sub(1)
            .and_then(|idx| self.buffer.chars().nth(idx))
    }

    /// Handle a key event and return the action
    pub fn handle_key(&mut self, key: KeyEvent) -> FieldAction {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Enter => FieldAction::Submit,
            KeyCode::Char('u') if ctrl => {
                self.clear();
                FieldAction::Edited
            }
            KeyCode::Char('w') if ctrl => {
                self.delete_word();
                FieldAction::Edited
            }
            KeyCode::Char(_) if ctrl => FieldAction::Ignored,
            KeyCode::Char(c) => {
                self.insert_char(c);
                FieldAction::Edited
            }
            KeyCode::Backspace => {
                self.remove_char_before_cursor();
                FieldAction::Edited
            }
            KeyCode::Delete => {
                self.remove_char_at_cursor();
                FieldAction::Edited
            }
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                FieldAction::Edited
            }
            KeyCode::Right => {
                if self.cursor < self.char_count() {
                    self.cursor += 1;
                }
                FieldAction::Edited
            }
            KeyCode::Home => {
                self.cursor = 0;
                FieldAction::Edited
            }
            KeyCode::End => {
                self.cursor = self.char_count();
                FieldAction::Edited
            }
            _ => FieldAction::Ignored,
        }
    }

    /// Cursor position in terminal columns
    pub fn cursor_display_width(&self) -> usize {
        self.buffer
            .chars()
            .take(self.cursor)
            .map(|c| UnicodeWidthChar::width(c).unwrap_or(1))
            .sum()
    }
}
