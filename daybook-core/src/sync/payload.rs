//! The versioned JSON document exchanged with the remote store.
//!
//! ```json
//! { "schema": 1, "updatedAt": "<ISO-8601>",
//!   "data": { "todos": [ {"id","text","done"} ], "notes": { "<note key>": "<text>" } } }
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::error::SyncError;
use super::merge::merge_todos;
use crate::events::{EventBus, SyncEvent};
use crate::models::{NoteKey, TodoItem};
use crate::store::LocalStore;

/// The only schema version this build reads or writes.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPayload {
    pub schema: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub data: PayloadData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PayloadData {
    pub todos: Vec<TodoItem>,
    pub notes: BTreeMap<String, String>,
}

/// What [`PayloadCodec::apply`] wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplySummary {
    /// Size of the merged to-do list.
    pub todos: usize,
    pub notes_written: usize,
    /// Writes the local store rejected.
    pub storage_failures: usize,
}

/// Moves state between the local store and [`SyncPayload`]s.
#[derive(Clone)]
pub struct PayloadCodec {
    store: LocalStore,
    events: EventBus,
}

impl PayloadCodec {
    pub fn new(store: LocalStore, events: EventBus) -> Self {
        Self { store, events }
    }

    /// Snapshot of every local to-do and note, stamped with the current time.
    pub fn encode(&self) -> SyncPayload {
        let notes = self
            .store
            .list_note_keys()
            .into_iter()
            .filter_map(|key| {
                let text = self.store.load_note(&key)?;
                Some((key, text))
            })
            .collect();

        SyncPayload {
            schema: SCHEMA_VERSION,
            updated_at: Some(Utc::now()),
            data: PayloadData {
                todos: self.store.load_todos(),
                notes,
            },
        }
    }

    /// Parses and validates a remote document.
    ///
    /// The document is rejected as a whole when it is not JSON, not an
    /// object, has a schema other than 1, or has no `data` object. Within an
    /// accepted document, malformed to-dos are dropped and non-string note
    /// values are stringified.
    pub fn decode(raw: &str) -> Result<SyncPayload, SyncError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| SyncError::format(format!("invalid JSON: {}", e)))?;
        let obj = value
            .as_object()
            .ok_or_else(|| SyncError::format("document is not a JSON object"))?;

        match obj.get("schema").and_then(Value::as_f64) {
            Some(v) if v == f64::from(SCHEMA_VERSION) => {}
            _ => {
                return Err(SyncError::format(format!(
                    "unsupported schema {}",
                    obj.get("schema").unwrap_or(&Value::Null)
                )))
            }
        }

        let data = obj
            .get("data")
            .and_then(Value::as_object)
            .ok_or_else(|| SyncError::format("missing data section"))?;

        let todos = data
            .get("todos")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(TodoItem::from_json).collect())
            .unwrap_or_default();

        let notes = data
            .get("notes")
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .map(|(k, v)| (k.clone(), note_text(v)))
                    .collect()
            })
            .unwrap_or_default();

        let updated_at = obj
            .get("updatedAt")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Ok(SyncPayload {
            schema: SCHEMA_VERSION,
            updated_at,
            data: PayloadData { todos, notes },
        })
    }

    /// Pretty-printed wire form of a payload.
    pub fn to_json(payload: &SyncPayload) -> Result<String, SyncError> {
        serde_json::to_string_pretty(payload)
            .map_err(|e| SyncError::format(format!("failed to serialize payload: {}", e)))
    }

    /// Writes a decoded payload into the local store and emits `DataApplied`.
    ///
    /// To-dos are merged with the local list (remote wins per id). Each note
    /// in the payload replaces the local note with the same key; local notes
    /// absent from the payload are left alone. Keys without the note prefix
    /// are ignored.
    pub fn apply(&self, payload: &SyncPayload) -> ApplySummary {
        let mut summary = ApplySummary::default();

        let merged = merge_todos(&self.store.load_todos(), &payload.data.todos);
        summary.todos = merged.len();
        if !self.store.save_todos(&merged) {
            summary.storage_failures += 1;
        }

        for (key, text) in &payload.data.notes {
            if !NoteKey::is_note_key(key) {
                debug!("Skipping non-note key in payload: {}", key);
                continue;
            }
            if self.store.save_note(key, text) {
                summary.notes_written += 1;
            } else {
                summary.storage_failures += 1;
            }
        }

        if summary.storage_failures > 0 {
            warn!(
                "Applied remote data with {} rejected local write(s)",
                summary.storage_failures
            );
        }

        self.events.emit(SyncEvent::DataApplied);
        summary
    }
}

fn note_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{KeyValueStore, MemoryStore};
    use serde_json::json;
    use std::sync::Arc;

    const NOTE_A: &str = "daybook_day_notes_v1:dana/journal/main:2026-02-09";
    const NOTE_B: &str = "daybook_day_notes_v1:dana/journal/main:2026-02-10";

    fn setup() -> (PayloadCodec, LocalStore, Arc<MemoryStore>, EventBus) {
        let backend = Arc::new(MemoryStore::new());
        let store = LocalStore::new(backend.clone());
        let bus = EventBus::new();
        (
            PayloadCodec::new(store.clone(), bus.clone()),
            store,
            backend,
            bus,
        )
    }

    #[test]
    fn test_encode_snapshots_local_state() {
        let (codec, store, backend, _) = setup();
        store.save_todos(&[TodoItem::new("one").with_id("1")]);
        store.save_note(NOTE_B, "b");
        store.save_note(NOTE_A, "a");
        backend.set("unrelated", "x").unwrap();

        let payload = codec.encode();
        assert_eq!(payload.schema, 1);
        assert!(payload.updated_at.is_some());
        assert_eq!(payload.data.todos, vec![TodoItem::new("one").with_id("1")]);
        assert_eq!(
            payload.data.notes.keys().collect::<Vec<_>>(),
            vec![NOTE_A, NOTE_B]
        );
    }

    #[test]
    fn test_codec_roundtrip() {
        let (codec, store, _, _) = setup();
        store.save_todos(&[
            TodoItem::new("buy milk").with_id("1"),
            TodoItem::new("call mom").with_id("2").with_done(true),
        ]);
        store.save_note(NOTE_A, "line one\nline two");

        let payload = codec.encode();
        let raw = PayloadCodec::to_json(&payload).unwrap();
        let decoded = PayloadCodec::decode(&raw).unwrap();

        assert_eq!(decoded.schema, 1);
        assert_eq!(decoded.data, payload.data);
        assert_eq!(decoded.updated_at, payload.updated_at);
    }

    #[test]
    fn test_wire_field_names() {
        let (codec, _, _, _) = setup();
        let value: Value =
            serde_json::from_str(&PayloadCodec::to_json(&codec.encode()).unwrap()).unwrap();
        assert_eq!(value["schema"], json!(1));
        assert!(value["updatedAt"].is_string());
        assert!(value["data"]["todos"].is_array());
        assert!(value["data"]["notes"].is_object());
    }

    #[test]
    fn test_decode_fails_closed() {
        for raw in [
            r#"{"schema":2,"data":{}}"#,
            "not json",
            r#"{"schema":1}"#,
            r#"{"schema":1,"data":null}"#,
            r#"{"schema":"1","data":{}}"#,
            "[1,2,3]",
            "null",
            "",
        ] {
            let err = PayloadCodec::decode(raw).unwrap_err();
            assert!(matches!(err, SyncError::Format(_)), "accepted {:?}", raw);
        }
    }

    #[test]
    fn test_decode_is_lenient_inside_valid_document() {
        let raw = json!({
            "schema": 1,
            "data": {
                "todos": [
                    {"id": "1", "text": " ok ", "done": true},
                    {"id": "", "text": "no id"},
                    "garbage"
                ],
                "notes": { NOTE_A: 42, NOTE_B: null }
            }
        })
        .to_string();

        let payload = PayloadCodec::decode(&raw).unwrap();
        assert_eq!(payload.updated_at, None);
        assert_eq!(
            payload.data.todos,
            vec![TodoItem::new("ok").with_id("1").with_done(true)]
        );
        assert_eq!(payload.data.notes[NOTE_A], "42");
        assert_eq!(payload.data.notes[NOTE_B], "");

        let empty = PayloadCodec::decode(r#"{"schema":1,"data":{}}"#).unwrap();
        assert!(empty.data.todos.is_empty());
        assert!(empty.data.notes.is_empty());
    }

    #[test]
    fn test_apply_merges_todos_and_overwrites_notes() {
        let (codec, store, backend, bus) = setup();
        let mut rx = bus.subscribe();
        store.save_todos(&[TodoItem::new("buy milk").with_id("1")]);
        store.save_note(NOTE_A, "local a");
        store.save_note(NOTE_B, "local b");

        let payload = SyncPayload {
            schema: 1,
            updated_at: None,
            data: PayloadData {
                todos: vec![
                    TodoItem::new("buy milk").with_id("1").with_done(true),
                    TodoItem::new("call mom").with_id("2"),
                ],
                notes: BTreeMap::from([
                    (NOTE_A.to_string(), "remote a".to_string()),
                    ("not_a_note".to_string(), "x".to_string()),
                ]),
            },
        };

        let summary = codec.apply(&payload);
        assert_eq!(summary.todos, 2);
        assert_eq!(summary.notes_written, 1);
        assert_eq!(summary.storage_failures, 0);

        assert_eq!(
            store.load_todos(),
            vec![
                TodoItem::new("buy milk").with_id("1").with_done(true),
                TodoItem::new("call mom").with_id("2"),
            ]
        );
        assert_eq!(store.load_note(NOTE_A), Some("remote a".to_string()));
        assert_eq!(store.load_note(NOTE_B), Some("local b".to_string()));
        assert_eq!(backend.get("not_a_note").unwrap(), None);
        assert_eq!(rx.try_recv().unwrap(), SyncEvent::DataApplied);
    }

    #[test]
    fn test_apply_with_rejected_writes_degrades() {
        let (codec, store, backend, _) = setup();
        store.save_todos(&[TodoItem::new("keep").with_id("1")]);
        backend.set_reject_writes(true);

        let payload = PayloadCodec::decode(
            &json!({"schema": 1, "data": {"todos": [{"id": "2", "text": "new"}], "notes": {NOTE_A: "x"}}})
                .to_string(),
        )
        .unwrap();

        let summary = codec.apply(&payload);
        assert_eq!(summary.storage_failures, 2);
        assert_eq!(store.load_todos(), vec![TodoItem::new("keep").with_id("1")]);
    }
}
