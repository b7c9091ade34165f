use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// A single to-do entry.
///
/// Identity is `id`: two items with the same id are the same logical item
/// regardless of their text or completion state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub done: bool,
}

impl TodoItem {
    /// Creates an open to-do with a freshly generated id. Text is trimmed.
    pub fn new(text: impl AsRef<str>) -> Self {
        Self {
            id: generate_todo_id(),
            text: text.as_ref().trim().to_string(),
            done: false,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_done(mut self, done: bool) -> Self {
        self.done = done;
        self
    }

    /// True when the item has a non-empty id and non-blank text.
    pub fn is_valid(&self) -> bool {
        !self.id.is_empty() && !self.text.trim().is_empty()
    }

    /// Reads an item out of loosely-typed JSON.
    ///
    /// Returns `None` for non-objects, a missing/non-string id or text, and
    /// blank text. `done` follows JSON truthiness.
    pub fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let id = obj.get("id").and_then(Value::as_str).unwrap_or_default();
        let text = obj
            .get("text")
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default();
        if id.is_empty() || text.is_empty() {
            return None;
        }
        Some(Self {
            id: id.to_string(),
            text: text.to_string(),
            done: obj.get("done").map(is_truthy).unwrap_or(false),
        })
    }
}

impl fmt::Display for TodoItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.done { "x" } else { " " };
        write!(f, "[{}] {}", mark, self.text)
    }
}

/// Generates an opaque, unique to-do id.
pub fn generate_todo_id() -> String {
    Uuid::new_v4().to_string()
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_trims_and_generates_id() {
        let item = TodoItem::new("  buy milk  ");
        assert_eq!(item.text, "buy milk");
        assert!(!item.id.is_empty());
        assert!(!item.done);
        assert!(item.is_valid());
    }

    #[test]
    fn test_ids_are_unique() {
        let a = TodoItem::new("a");
        let b = TodoItem::new("a");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_is_valid() {
        assert!(!TodoItem::new("x").with_id("").is_valid());
        assert!(!TodoItem::new("   ").is_valid());
    }

    #[test]
    fn test_from_json_lenient_done() {
        let item = TodoItem::from_json(&json!({"id": "1", "text": " a ", "done": 1})).unwrap();
        assert_eq!(item, TodoItem::new("a").with_id("1").with_done(true));

        let item = TodoItem::from_json(&json!({"id": "2", "text": "b"})).unwrap();
        assert!(!item.done);

        let item = TodoItem::from_json(&json!({"id": "3", "text": "c", "done": ""})).unwrap();
        assert!(!item.done);
    }

    #[test]
    fn test_from_json_rejects_malformed() {
        assert!(TodoItem::from_json(&json!("text")).is_none());
        assert!(TodoItem::from_json(&json!({"id": 5, "text": "a"})).is_none());
        assert!(TodoItem::from_json(&json!({"id": "5", "text": "   "})).is_none());
        assert!(TodoItem::from_json(&json!({"id": "5"})).is_none());
    }

    #[test]
    fn test_display() {
        let item = TodoItem::new("call mom").with_done(true);
        assert_eq!(item.to_string(), "[x] call mom");
    }
}
