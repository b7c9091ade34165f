//! In-process notifications between the editing code, the sync engine and
//! whatever renders the data.

use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

/// Signals exchanged over the [`EventBus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    /// A to-do or note was changed locally.
    DataChanged,
    /// Remote or seeded data was written into the local store.
    DataApplied,
    /// The front end came back to the foreground.
    Resumed,
}

/// Broadcast bus; cloning shares the same channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SyncEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Sends an event. Having no subscribers is not an error.
    pub fn emit(&self, event: SyncEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
