//! Editing API for to-dos and day notes.
//!
//! Every successful mutation emits [`SyncEvent::DataChanged`] so the sync
//! engine can schedule a push.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use thiserror::Error;

use crate::events::{EventBus, SyncEvent};
use crate::models::note::{parse_iso_date, NoteKey, NotesScope};
use crate::models::TodoItem;
use crate::store::LocalStore;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum JournalError {
    #[error("To-do text cannot be empty")]
    EmptyText,

    #[error("To-do not found: {0}")]
    NotFound(String),

    #[error("Local storage is unavailable; the change was not saved")]
    StorageUnavailable,
}

/// To-dos plus the notes of one scope.
#[derive(Clone)]
pub struct Journal {
    store: LocalStore,
    events: EventBus,
    scope: NotesScope,
}

impl Journal {
    pub fn new(store: LocalStore, events: EventBus, scope: NotesScope) -> Self {
        Self {
            store,
            events,
            scope,
        }
    }

    pub fn scope(&self) -> &NotesScope {
        &self.scope
    }

    pub fn todos(&self) -> Vec<TodoItem> {
        self.store.load_todos()
    }

    /// Adds a to-do at the top of the list.
    pub fn add_todo(&self, text: &str) -> Result<TodoItem, JournalError> {
        let item = TodoItem::new(text);
        if item.text.is_empty() {
            return Err(JournalError::EmptyText);
        }
        let mut todos = self.store.load_todos();
        todos.insert(0, item.clone());
        self.save_todos(&todos)?;
        Ok(item)
    }

    /// Marks a to-do done or open. Ids may be abbreviated to a unique prefix.
    pub fn set_done(&self, id: &str, done: bool) -> Result<TodoItem, JournalError> {
        let mut todos = self.store.load_todos();
        let idx = find_todo(&todos, id)?;
        todos[idx].done = done;
        let item = todos[idx].clone();
        self.save_todos(&todos)?;
        Ok(item)
    }

    pub fn remove_todo(&self, id: &str) -> Result<TodoItem, JournalError> {
        let mut todos = self.store.load_todos();
        let idx = find_todo(&todos, id)?;
        let removed = todos.remove(idx);
        self.save_todos(&todos)?;
        Ok(removed)
    }

    pub fn note(&self, date: NaiveDate) -> Option<String> {
        self.store.load_note(&self.scope.key_for(date).to_string())
    }

    /// Replaces the note of `date` with `text`, verbatim.
    pub fn set_note(&self, date: NaiveDate, text: &str) -> Result<(), JournalError> {
        let key = self.scope.key_for(date).to_string();
        if !self.store.save_note(&key, text) {
            return Err(JournalError::StorageUnavailable);
        }
        self.events.emit(SyncEvent::DataChanged);
        Ok(())
    }

    /// Non-empty notes of this scope within `from..=to`, by date.
    pub fn notes_between(&self, from: NaiveDate, to: NaiveDate) -> Vec<(NaiveDate, String)> {
        self.store
            .list_note_keys()
            .iter()
            .filter_map(|k| NoteKey::parse(k).ok())
            .filter(|k| k.scope == self.scope && from <= k.date && k.date <= to)
            .filter_map(|k| {
                let text = self.store.load_note(&k.to_string())?;
                (!text.trim().is_empty()).then_some((k.date, text))
            })
            .collect()
    }

    /// Writes configured seed notes into days that have no note yet.
    ///
    /// Keys must be `YYYY-MM-DD`; blank seeds are skipped and existing
    /// non-blank notes are never overwritten. Emits `DataApplied` when
    /// anything was written. Returns the number of notes written.
    pub fn apply_seed_notes(&self, seeds: &BTreeMap<String, String>) -> usize {
        let mut written = 0;
        for (iso, text) in seeds {
            let Ok(date) = parse_iso_date(iso) else {
                continue;
            };
            let text = text.trim();
            if text.is_empty() {
                continue;
            }
            let key = self.scope.key_for(date).to_string();
            let existing = self.store.load_note(&key).unwrap_or_default();
            if !existing.trim().is_empty() {
                continue;
            }
            if self.store.save_note(&key, text) {
                written += 1;
            }
        }
        if written > 0 {
            self.events.emit(SyncEvent::DataApplied);
        }
        written
    }

    fn save_todos(&self, todos: &[TodoItem]) -> Result<(), JournalError> {
        if !self.store.save_todos(todos) {
            return Err(JournalError::StorageUnavailable);
        }
        self.events.emit(SyncEvent::DataChanged);
        Ok(())
    }
}

fn find_todo(todos: &[TodoItem], id: &str) -> Result<usize, JournalError> {
    if let Some(idx) = todos.iter().position(|t| t.id == id) {
        return Ok(idx);
    }
    let mut matches = todos
        .iter()
        .enumerate()
        .filter(|(_, t)| !id.is_empty() && t.id.starts_with(id));
    match (matches.next(), matches.next()) {
        (Some((idx, _)), None) => Ok(idx),
        _ => Err(JournalError::NotFound(id.to_string())),
    }
}
