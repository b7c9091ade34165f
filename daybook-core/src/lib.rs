//! Core library for daybook: to-dos and day notes kept in a local store and
//! synced to a GitHub Gist.

pub mod events;
pub mod journal;
pub mod models;
pub mod store;
pub mod sync;

pub use events::{EventBus, SyncEvent};
pub use journal::{Journal, JournalError};
pub use models::{
    CalendarEvent, DayColor, EventEntry, EventStyle, NoteKey, NoteKeyError, NotesScope, TodoItem,
    NOTES_PREFIX,
};
pub use store::{FileStore, KeyValueStore, LocalStore, MemoryStore, StorageError};
pub use sync::{
    GistClient, SkipReason, SyncEngine, SyncError, SyncOutcome, SyncStatus, SyncTarget,
    SyncTiming,
};

/// Library version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
