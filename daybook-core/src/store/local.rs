use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::KeyValueStore;
use crate::models::note::NOTES_PREFIX;
use crate::models::todo::{generate_todo_id, TodoItem};

/// Storage key holding the JSON array of to-dos.
pub const TODOS_KEY: &str = "daybook_todos_v1";

/// Typed access to to-dos and day notes.
///
/// Never returns storage errors: failed reads look like missing data and
/// failed writes return `false`. Each failure is logged.
#[derive(Clone)]
pub struct LocalStore {
    backend: Arc<dyn KeyValueStore>,
}

impl LocalStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn KeyValueStore> {
        &self.backend
    }

    /// Loads the to-do list.
    ///
    /// Missing, corrupt and non-array values all yield an empty list.
    /// Entries without usable text are dropped. Entries without an id get
    /// one, and the list is written back so the id stays stable.
    pub fn load_todos(&self) -> Vec<TodoItem> {
        let raw = match self.backend.get(TODOS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Failed to read to-dos: {}", e);
                return Vec::new();
            }
        };

        let items = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(items)) => items,
            Ok(_) => return Vec::new(),
            Err(e) => {
                warn!("Ignoring corrupt to-do list: {}", e);
                return Vec::new();
            }
        };

        let mut assigned = 0;
        let todos: Vec<TodoItem> = items
            .iter()
            .filter_map(stored_todo)
            .map(|(todo, new_id)| {
                if new_id {
                    assigned += 1;
                }
                todo
            })
            .collect();

        if assigned > 0 && self.save_todos(&todos) {
            debug!("Assigned ids to {} stored to-do(s)", assigned);
        }
        todos
    }

    pub fn save_todos(&self, items: &[TodoItem]) -> bool {
        let raw = match serde_json::to_string(items) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to serialize to-dos: {}", e);
                return false;
            }
        };
        match self.backend.set(TODOS_KEY, &raw) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to save to-dos: {}", e);
                false
            }
        }
    }

    /// Every note key in the store, sorted.
    pub fn list_note_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = match self.backend.keys() {
            Ok(keys) => keys
                .into_iter()
                .filter(|k| k.starts_with(NOTES_PREFIX))
                .collect(),
            Err(e) => {
                warn!("Failed to list note keys: {}", e);
                Vec::new()
            }
        };
        keys.sort();
        keys
    }

    pub fn load_note(&self, key: &str) -> Option<String> {
        match self.backend.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to read note {}: {}", key, e);
                None
            }
        }
    }

    pub fn save_note(&self, key: &str, text: &str) -> bool {
        match self.backend.set(key, text) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to save note {}: {}", key, e);
                false
            }
        }
    }

    /// True if there is at least one to-do or one note.
    pub fn has_any_data(&self) -> bool {
        !self.load_todos().is_empty() || !self.list_note_keys().is_empty()
    }
}

/// Parses one stored entry; the flag is set when the id had to be generated.
fn stored_todo(value: &Value) -> Option<(TodoItem, bool)> {
    let obj = value.as_object()?;
    let text = obj.get("text")?.as_str()?.trim();
    if text.is_empty() {
        return None;
    }
    let (id, new_id) = match obj.get("id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => (id.to_string(), false),
        _ => (generate_todo_id(), true),
    };
    let done = obj.get("done").and_then(Value::as_bool).unwrap_or(false);
    let todo = TodoItem {
        id,
        text: text.to_string(),
        done,
    };
    Some((todo, new_id))
}
