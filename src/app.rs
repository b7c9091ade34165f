//! Wiring shared by the commands: local store, journal and sync engine.

use std::sync::Arc;

use daybook_core::models::calendar::normalize_all;
use daybook_core::sync::SyncTarget;
use daybook_core::{
    CalendarEvent, EventBus, FileStore, GistClient, Journal, KeyValueStore, LocalStore,
    MemoryStore, SyncEngine,
};
use tracing::debug;

use crate::config::Config;

pub struct App {
    pub config: Config,
    pub store: LocalStore,
    pub events: EventBus,
    pub journal: Journal,
    pub engine: Arc<SyncEngine>,
    pub calendar: Vec<CalendarEvent>,
}

impl App {
    pub fn open(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        let durable: Arc<dyn KeyValueStore> =
            Arc::new(FileStore::new(config.data_dir.value.clone()));
        // The token lives here and dies with the process.
        let session: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

        let store = LocalStore::new(durable.clone());
        let events = EventBus::new();
        let journal = Journal::new(store.clone(), events.clone(), config.notes_scope.clone());

        let target = SyncTarget::resolve(
            durable,
            session,
            config.gist_id.as_ref().map(|v| v.value.as_str()),
            config.sync.default_gist_id.as_deref(),
        );
        let client = GistClient::new(&config.sync.api_url)?;
        let engine = SyncEngine::new(Arc::new(client), store.clone(), events.clone(), target)
            .with_timing(config.sync.timing.to_timing())
            .with_file_name(config.sync.file_name.clone());
        if let Some(token) = &config.token {
            engine.set_credential(token);
        }

        let calendar = normalize_all(&config.calendar_events);
        debug!(
            "Opened store at {} ({} calendar event(s))",
            config.data_dir.value.display(),
            calendar.len()
        );

        Ok(Self {
            config,
            store,
            events,
            journal,
            engine: Arc::new(engine),
            calendar,
        })
    }

    /// Pulls once if nothing is stored locally, then fills in configured
    /// seed notes for days that still have none.
    pub async fn prepare(&self) {
        self.engine.pull_if_empty().await;
        let seeded = self.journal.apply_seed_notes(&self.config.seed_notes);
        if seeded > 0 {
            debug!("Seeded {} note(s) from config", seeded);
        }
    }
}
