//! Synchronization with a remote document store.
//!
//! The engine pulls the remote payload and merges it into the local store,
//! and pushes local snapshots back. Automatic pushes follow local edits
//! after a short debounce; automatic pulls run on an interval when the
//! user has been idle for a while.

pub mod client;
pub mod engine;
pub mod error;
pub mod merge;
pub mod payload;
pub mod schedule;
pub mod target;

pub use client::{DocumentStore, GistClient, RemoteDocument, RemoteFile, GITHUB_API_URL};
pub use engine::{
    try_silently, SkipReason, SyncEngine, SyncOutcome, SyncState, SyncStatus,
    DOCUMENT_DESCRIPTION, SYNC_FILE_NAME,
};
pub use error::{ErrorKind, SyncError};
pub use merge::merge_todos;
pub use payload::{ApplySummary, PayloadCodec, PayloadData, SyncPayload, SCHEMA_VERSION};
pub use schedule::{AutoPullGate, Debouncer, PullBlocked, SyncTiming};
pub use target::{SyncTarget, TargetSource};
