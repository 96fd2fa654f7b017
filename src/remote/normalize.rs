//! Decoding of loosely shaped JSON from the school API.
//!
//! The server has shipped several payload shapes over time. Each payload type
//! has exactly one normalization function here, and each documents its
//! fallback order. Anything that does not fit is dropped or coerced to an
//! empty value; nothing in here fails.

use serde_json::Value;

/// A class as offered in the class picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInfo {
    pub id: String,
    pub name: String,
}

/// One subject/grade line of a mail record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteLine {
    pub fach: String,
    pub note: String,
}

impl NoteLine {
    /// `Fach : Note`, as used on cards and in the mail body.
    pub fn display(&self) -> String {
        format!("{} : {}", self.fach, self.note)
    }
}

/// One student's entry in a mail-generation response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MailRecord {
    pub vorname: String,
    pub nachname: String,
    pub email: String,
    pub noten: Vec<NoteLine>,
}

/// Normalize a `/api/klassen` payload.
///
/// - non-array payload: no classes
/// - string item `s`: `{ id: s, name: s }`
/// - object item: `id` = first string of `id`, `value`, `klasse`;
///   `name` = first string of `name`, `label`, `klasse`;
///   dropped unless both are non-empty
/// - anything else: dropped
pub fn normalize_classes(data: &Value) -> Vec<ClassInfo> {
    let Some(items) = data.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(ClassInfo {
                id: s.clone(),
                name: s.clone(),
            }),
            Value::Object(_) => {
                let id = first_string(item, &["id", "value", "klasse"])?;
                let name = first_string(item, &["name", "label", "klasse"])?;
                if id.is_empty() || name.is_empty() {
                    return None;
                }
                Some(ClassInfo { id, name })
            }
            _ => None,
        })
        .collect()
}

/// Normalize a `/api/mails` payload.
///
/// - non-array payload: no records
/// - `vorname`, `nachname`, `email`: taken when strings, otherwise empty
/// - `noten`: see [`normalize_noten`]
pub fn normalize_mail_records(data: &Value) -> Vec<MailRecord> {
    let Some(items) = data.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .filter(|item| item.is_object())
        .map(|item| MailRecord {
            vorname: string_field(item, "vorname"),
            nachname: string_field(item, "nachname"),
            email: string_field(item, "email"),
            noten: normalize_noten(item.get("noten").unwrap_or(&Value::Null)),
        })
        .collect()
}

/// Normalize the `noten` field of a mail record.
///
/// - array: each entry is either a JSON-encoded string of `{fach, note}` or
///   that object itself
/// - single string: treated as a one-entry array
/// - anything else: empty
///
/// Entries that do not decode to an object are dropped. `note` may be a
/// number or a string.
pub fn normalize_noten(noten: &Value) -> Vec<NoteLine> {
    let entries: Vec<&Value> = match noten {
        Value::Array(items) => items.iter().collect(),
        Value::String(_) => vec![noten],
        _ => return Vec::new(),
    };

    entries
        .into_iter()
        .filter_map(|entry| match entry {
            Value::String(raw) => serde_json::from_str::<Value>(raw)
                .ok()
                .and_then(|decoded| note_line(&decoded)),
            other => note_line(other),
        })
        .collect()
}

fn note_line(value: &Value) -> Option<NoteLine> {
    if !value.is_object() {
        return None;
    }
    Some(NoteLine {
        fach: scalar_field(value, "fach"),
        note: scalar_field(value, "note"),
    })
}

fn first_string(item: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| item.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

fn string_field(item: &Value, key: &str) -> String {
    item.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn scalar_field(item: &Value, key: &str) -> String {
    match item.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}
