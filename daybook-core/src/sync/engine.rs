//! The sync engine: pulls and pushes the payload and drives the automatic
//! triggers.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::client::DocumentStore;
use super::error::SyncError;
use super::payload::{PayloadCodec, SyncPayload};
use super::schedule::{AutoPullGate, Debouncer, SyncTiming};
use super::target::{SyncTarget, TargetSource};
use crate::events::{EventBus, SyncEvent};
use crate::store::LocalStore;

/// Name of the file inside the remote document.
pub const SYNC_FILE_NAME: &str = "daybook-sync.json";

/// Description given to documents created by a first push.
pub const DOCUMENT_DESCRIPTION: &str = "daybook synced data";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Pulling,
    Pushing,
}

/// Why a pull or push did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoTarget,
    NoCredential,
    /// The remote document failed validation during a silent pull.
    InvalidDocument,
    /// Another pull or push was already running.
    InFlight,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Pulled { todos: usize, notes: usize },
    Pushed { doc_id: String, created: bool },
    Skipped(SkipReason),
}

/// Snapshot of the engine for status displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncStatus {
    pub state: SyncState,
    pub target: Option<String>,
    pub target_source: Option<TargetSource>,
    pub has_credential: bool,
    pub last_pull_at: Option<DateTime<Utc>>,
    pub last_push_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

struct EngineState {
    phase: SyncState,
    gate: AutoPullGate,
    last_pull_at: Option<DateTime<Utc>>,
    last_push_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

/// Owns the sync target and runs pulls and pushes against a
/// [`DocumentStore`]. At most one pull or push runs at a time; a request
/// made while one is running is skipped, not queued.
pub struct SyncEngine {
    client: Arc<dyn DocumentStore>,
    store: LocalStore,
    codec: PayloadCodec,
    target: Mutex<SyncTarget>,
    file_name: String,
    timing: SyncTiming,
    in_flight: AtomicBool,
    state: Mutex<EngineState>,
}

/// Clears the in-flight flag when the operation ends, however it ends.
struct InFlightGuard<'a> {
    engine: &'a SyncEngine,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.engine.state().phase = SyncState::Idle;
        self.engine.in_flight.store(false, Ordering::Release);
    }
}

impl SyncEngine {
    pub fn new(
        client: Arc<dyn DocumentStore>,
        store: LocalStore,
        events: EventBus,
        target: SyncTarget,
    ) -> Self {
        let timing = SyncTiming::default();
        Self {
            client,
            codec: PayloadCodec::new(store.clone(), events),
            store,
            target: Mutex::new(target),
            file_name: SYNC_FILE_NAME.to_string(),
            timing,
            in_flight: AtomicBool::new(false),
            state: Mutex::new(EngineState {
                phase: SyncState::Idle,
                gate: AutoPullGate::new(timing),
                last_pull_at: None,
                last_push_at: None,
                last_error: None,
            }),
        }
    }

    pub fn with_timing(mut self, timing: SyncTiming) -> Self {
        self.timing = timing;
        self.state().gate = AutoPullGate::new(timing);
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    pub fn timing(&self) -> SyncTiming {
        self.timing
    }

    pub fn target_id(&self) -> Option<String> {
        self.target().remote_doc_id().map(String::from)
    }

    /// Adopts a new target id and persists it. Returns `false` if it could
    /// not be persisted (it is still used for this session).
    pub fn set_target(&self, id: &str) -> bool {
        self.target().set_target(id)
    }

    /// Stores the credential for this session. A blank token removes it.
    pub fn set_credential(&self, token: &str) -> bool {
        self.target().set_credential(token)
    }

    pub fn has_credential(&self) -> bool {
        self.target().has_credential()
    }

    pub fn status(&self) -> SyncStatus {
        let (target, target_source, has_credential) = {
            let t = self.target();
            (
                t.remote_doc_id().map(String::from),
                t.source(),
                t.has_credential(),
            )
        };
        let state = self.state();
        SyncStatus {
            state: state.phase,
            target,
            target_source,
            has_credential,
            last_pull_at: state.last_pull_at,
            last_push_at: state.last_push_at,
            last_error: state.last_error.clone(),
        }
    }

    /// Fetches the remote document and merges it into the local store.
    ///
    /// With `silent`, a document that fails validation is skipped instead of
    /// reported. Transport errors are returned either way.
    pub async fn pull(&self, silent: bool) -> Result<SyncOutcome, SyncError> {
        let Some(id) = self.target_id() else {
            debug!("Pull skipped: no sync target");
            return Ok(SyncOutcome::Skipped(SkipReason::NoTarget));
        };
        let Some(_guard) = self.begin(SyncState::Pulling) else {
            debug!("Pull skipped: sync already in progress");
            return Ok(SyncOutcome::Skipped(SkipReason::InFlight));
        };

        {
            let mut state = self.state();
            state.gate.record_pull_attempt(Instant::now());
            state.last_pull_at = Some(Utc::now());
        }

        let credential = self.target().credential();
        let payload = match self.fetch_payload(&id, credential.as_deref()).await {
            Ok(payload) => payload,
            Err(SyncError::Format(reason)) if silent => {
                warn!("Ignoring remote document {}: {}", id, reason);
                self.record_result(Some(SyncError::Format(reason).to_string()));
                return Ok(SyncOutcome::Skipped(SkipReason::InvalidDocument));
            }
            Err(e) => {
                self.record_result(Some(e.to_string()));
                return Err(e);
            }
        };

        let summary = self.codec.apply(&payload);
        self.record_result(None);
        info!(
            "Pulled {} to-do(s) and {} note(s) from {}",
            summary.todos, summary.notes_written, id
        );
        Ok(SyncOutcome::Pulled {
            todos: summary.todos,
            notes: summary.notes_written,
        })
    }

    /// Uploads a snapshot of local data, replacing the remote content.
    ///
    /// Without a target a new private document is created and adopted as the
    /// target. With `silent`, a missing credential is skipped instead of
    /// reported.
    pub async fn push(&self, silent: bool) -> Result<SyncOutcome, SyncError> {
        let Some(credential) = self.target().credential() else {
            if silent {
                debug!("Push skipped: no credential");
                return Ok(SyncOutcome::Skipped(SkipReason::NoCredential));
            }
            return Err(SyncError::Credential);
        };
        let Some(_guard) = self.begin(SyncState::Pushing) else {
            debug!("Push skipped: sync already in progress");
            return Ok(SyncOutcome::Skipped(SkipReason::InFlight));
        };

        {
            let mut state = self.state();
            state.gate.record_push_attempt(Instant::now());
            state.last_push_at = Some(Utc::now());
        }

        let result = self.upload(&credential).await;
        self.record_result(result.as_ref().err().map(ToString::to_string));
        if let Ok(SyncOutcome::Pushed { doc_id, created }) = &result {
            if *created {
                info!("Created remote document {}", doc_id);
            } else {
                info!("Pushed local data to {}", doc_id);
            }
        }
        result
    }

    /// Pulls once when nothing is stored locally and a target is known.
    ///
    /// Returns `None` when local data exists or the pull failed.
    pub async fn pull_if_empty(&self) -> Option<SyncOutcome> {
        if self.target_id().is_none() || self.store.has_any_data() {
            return None;
        }
        try_silently(self.pull(true)).await
    }

    /// Automatic push after the debounce fires: needs both target and
    /// credential, never creates a document.
    pub async fn auto_push(&self) -> Option<SyncOutcome> {
        if self.target_id().is_none() || !self.has_credential() {
            debug!("Auto-push skipped: target or credential missing");
            return None;
        }
        try_silently(self.push(true)).await
    }

    /// Automatic pull, if the pull gate allows one right now.
    pub async fn auto_pull(&self) -> Option<SyncOutcome> {
        let has_target = self.target_id().is_some();
        if let Err(reason) = self.state().gate.check(Instant::now(), has_target) {
            debug!("Auto-pull held back: {:?}", reason);
            return None;
        }
        if self.in_flight.load(Ordering::Acquire) {
            return None;
        }
        try_silently(self.pull(true)).await
    }

    /// Notes a local edit so automatic pulls hold back for a while.
    pub fn record_change(&self) {
        self.state().gate.record_change(Instant::now());
    }

    /// Drives the automatic triggers until `shutdown` resolves or the event
    /// channel closes.
    ///
    /// `DataChanged` restarts the push debounce; the pull interval and
    /// `Resumed` attempt a gated pull.
    pub async fn run<F>(&self, mut events: broadcast::Receiver<SyncEvent>, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut debouncer = Debouncer::new(self.timing.debounce);
        let mut interval = time::interval_at(
            Instant::now() + self.timing.pull_interval,
            self.timing.pull_interval,
        );
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!("Sync loop started");
        loop {
            let deadline = debouncer.deadline();
            tokio::select! {
                _ = &mut shutdown => break,
                event = events.recv() => match event {
                    Ok(SyncEvent::DataChanged) => {
                        self.record_change();
                        debouncer.touch(Instant::now());
                    }
                    Ok(SyncEvent::Resumed) => {
                        self.auto_pull().await;
                    }
                    Ok(SyncEvent::DataApplied) => {}
                    Err(RecvError::Lagged(missed)) => {
                        warn!("Sync loop missed {} event(s)", missed);
                        self.record_change();
                        debouncer.touch(Instant::now());
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if debouncer.fire(Instant::now()) {
                        self.auto_push().await;
                    }
                }
                _ = interval.tick() => {
                    self.auto_pull().await;
                }
            }
        }
        info!("Sync loop stopped");
    }

    async fn fetch_payload(
        &self,
        id: &str,
        credential: Option<&str>,
    ) -> Result<SyncPayload, SyncError> {
        let document = self.client.get(id, credential).await?;
        let content = document
            .sync_content(&self.file_name)
            .ok_or_else(|| SyncError::format("no JSON file in remote document"))?;
        PayloadCodec::decode(content)
    }

    async fn upload(&self, credential: &str) -> Result<SyncOutcome, SyncError> {
        let payload = self.codec.encode();
        let files = BTreeMap::from([(self.file_name.clone(), PayloadCodec::to_json(&payload)?)]);

        if let Some(id) = self.target_id() {
            self.client.update(&id, &files, Some(credential)).await?;
            return Ok(SyncOutcome::Pushed {
                doc_id: id,
                created: false,
            });
        }

        let created = self
            .client
            .create(DOCUMENT_DESCRIPTION, false, &files, Some(credential))
            .await?;
        let id = created.id.trim().to_string();
        if id.is_empty() {
            return Err(SyncError::format("document store returned no id"));
        }
        self.target().set_target(&id);
        Ok(SyncOutcome::Pushed {
            doc_id: id,
            created: true,
        })
    }

    fn begin(&self, phase: SyncState) -> Option<InFlightGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        self.state().phase = phase;
        Some(InFlightGuard { engine: self })
    }

    fn record_result(&self, error: Option<String>) {
        self.state().last_error = error;
    }

    fn target(&self) -> MutexGuard<'_, SyncTarget> {
        self.target.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Runs an automatic operation: errors are logged and dropped.
pub async fn try_silently<F>(operation: F) -> Option<SyncOutcome>
where
    F: Future<Output = Result<SyncOutcome, SyncError>>,
{
    match operation.await {
        Ok(outcome) => Some(outcome),
        Err(e) => {
            warn!("Background sync failed ({:?}): {}", e.kind(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::Journal;
    use crate::models::{NotesScope, TodoItem};
    use crate::store::{KeyValueStore, MemoryStore};
    use crate::sync::client::{RemoteDocument, RemoteFile};
    use crate::sync::error::ErrorKind;
    use crate::sync::target::{CREDENTIAL_KEY, TARGET_KEY};
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;
    use tokio::sync::{oneshot, Notify};

    /// Document store double that records calls and can hold an update
    /// open until released.
    #[derive(Default)]
    struct StubStore {
        docs: Mutex<BTreeMap<String, RemoteDocument>>,
        calls: Mutex<Vec<String>>,
        fail: Mutex<Option<(u16, String)>>,
        hold_updates: AtomicBool,
        entered: Notify,
        release: Notify,
    }

    impl StubStore {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn put(&self, id: &str, content: &str) {
            let file = RemoteFile {
                filename: Some(SYNC_FILE_NAME.to_string()),
                content: Some(content.to_string()),
            };
            self.docs.lock().unwrap().insert(
                id.to_string(),
                RemoteDocument {
                    id: id.to_string(),
                    files: BTreeMap::from([(SYNC_FILE_NAME.to_string(), file)]),
                },
            );
        }

        fn content(&self, id: &str) -> Option<String> {
            self.docs
                .lock()
                .unwrap()
                .get(id)
                .and_then(|d| d.sync_content(SYNC_FILE_NAME).map(String::from))
        }

        fn record(&self, call: &str) -> Result<(), SyncError> {
            self.calls.lock().unwrap().push(call.to_string());
            match self.fail.lock().unwrap().clone() {
                Some((status, message)) => Err(SyncError::http(status, message)),
                None => Ok(()),
            }
        }

        fn store_files(&self, id: &str, files: &BTreeMap<String, String>) {
            let files = files
                .iter()
                .map(|(name, content)| {
                    (
                        name.clone(),
                        RemoteFile {
                            filename: Some(name.clone()),
                            content: Some(content.clone()),
                        },
                    )
                })
                .collect();
            self.docs.lock().unwrap().insert(
                id.to_string(),
                RemoteDocument {
                    id: id.to_string(),
                    files,
                },
            );
        }
    }

    #[async_trait]
    impl DocumentStore for StubStore {
        async fn get(
            &self,
            id: &str,
            _credential: Option<&str>,
        ) -> Result<RemoteDocument, SyncError> {
            self.record("get")?;
            self.docs
                .lock()
                .unwrap()
                .get(id)
                .cloned()
                .ok_or_else(|| SyncError::http(404, "Not Found"))
        }

        async fn create(
            &self,
            _description: &str,
            public: bool,
            files: &BTreeMap<String, String>,
            credential: Option<&str>,
        ) -> Result<RemoteDocument, SyncError> {
            self.record("create")?;
            assert!(!public);
            assert!(credential.is_some());
            let id = format!("new-{}", self.docs.lock().unwrap().len() + 1);
            self.store_files(&id, files);
            Ok(RemoteDocument {
                id,
                files: BTreeMap::new(),
            })
        }

        async fn update(
            &self,
            id: &str,
            files: &BTreeMap<String, String>,
            _credential: Option<&str>,
        ) -> Result<(), SyncError> {
            self.record("update")?;
            if self.hold_updates.load(Ordering::SeqCst) {
                self.entered.notify_one();
                self.release.notified().await;
            }
            self.store_files(id, files);
            Ok(())
        }
    }

    struct Harness {
        engine: Arc<SyncEngine>,
        remote: Arc<StubStore>,
        durable: Arc<MemoryStore>,
        store: LocalStore,
        bus: EventBus,
    }

    fn harness(target: Option<&str>, token: Option<&str>) -> Harness {
        let durable = Arc::new(MemoryStore::new());
        let session = Arc::new(MemoryStore::new());
        if let Some(token) = token {
            session.set(CREDENTIAL_KEY, token).unwrap();
        }
        let remote = Arc::new(StubStore::default());
        let store = LocalStore::new(durable.clone());
        let bus = EventBus::new();
        let engine = SyncEngine::new(
            remote.clone(),
            store.clone(),
            bus.clone(),
            SyncTarget::resolve(durable.clone(), session, target, None),
        );
        Harness {
            engine: Arc::new(engine),
            remote,
            durable,
            store,
            bus,
        }
    }

    fn remote_payload(todos: serde_json::Value) -> String {
        json!({"schema": 1, "updatedAt": "2026-02-09T10:00:00Z", "data": {"todos": todos, "notes": {}}})
            .to_string()
    }

    #[tokio::test]
    async fn test_pull_merges_remote_todos() {
        let h = harness(Some("gist1"), None);
        h.store
            .save_todos(&[TodoItem::new("buy milk").with_id("1")]);
        h.remote.put(
            "gist1",
            &remote_payload(json!([
                {"id": "1", "text": "buy milk", "done": true},
                {"id": "2", "text": "call mom", "done": false}
            ])),
        );
        let mut rx = h.bus.subscribe();

        let outcome = h.engine.pull(false).await.unwrap();
        assert_eq!(outcome, SyncOutcome::Pulled { todos: 2, notes: 0 });
        assert_eq!(
            h.store.load_todos(),
            vec![
                TodoItem::new("buy milk").with_id("1").with_done(true),
                TodoItem::new("call mom").with_id("2"),
            ]
        );
        assert_eq!(rx.try_recv().unwrap(), SyncEvent::DataApplied);
        assert!(h.engine.status().last_pull_at.is_some());
    }

    #[tokio::test]
    async fn test_pull_without_target_is_skipped() {
        let h = harness(None, Some("token"));
        for silent in [true, false] {
            assert_eq!(
                h.engine.pull(silent).await.unwrap(),
                SyncOutcome::Skipped(SkipReason::NoTarget)
            );
        }
        assert!(h.remote.calls().is_empty());
    }

    #[tokio::test]
    async fn test_pull_invalid_document() {
        let h = harness(Some("gist1"), None);
        h.store.save_todos(&[TodoItem::new("keep").with_id("1")]);
        h.remote.put("gist1", r#"{"schema":2,"data":{"todos":[]}}"#);

        let err = h.engine.pull(false).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);

        assert_eq!(
            h.engine.pull(true).await.unwrap(),
            SyncOutcome::Skipped(SkipReason::InvalidDocument)
        );
        assert_eq!(h.store.load_todos(), vec![TodoItem::new("keep").with_id("1")]);
        assert!(h.engine.status().last_error.is_some());
    }

    #[tokio::test]
    async fn test_pull_transport_error_keeps_message() {
        let h = harness(Some("gist1"), Some("token"));
        *h.remote.fail.lock().unwrap() = Some((401, "Bad credentials".to_string()));

        let err = h.engine.pull(true).await.unwrap_err();
        assert_eq!(err.to_string(), "Bad credentials");
        assert_eq!(err.status_code(), Some(401));
        assert_eq!(try_silently(h.engine.pull(true)).await, None);
        assert_eq!(h.engine.status().state, SyncState::Idle);
    }

    #[tokio::test]
    async fn test_push_requires_credential() {
        let h = harness(Some("gist1"), None);
        assert!(matches!(
            h.engine.push(false).await,
            Err(SyncError::Credential)
        ));
        assert_eq!(
            h.engine.push(true).await.unwrap(),
            SyncOutcome::Skipped(SkipReason::NoCredential)
        );
        assert!(h.remote.calls().is_empty());
    }

    #[tokio::test]
    async fn test_push_without_target_creates_once() {
        let h = harness(None, Some("token"));
        h.store.save_todos(&[TodoItem::new("buy milk").with_id("1")]);

        let outcome = h.engine.push(false).await.unwrap();
        assert_eq!(
            outcome,
            SyncOutcome::Pushed {
                doc_id: "new-1".to_string(),
                created: true
            }
        );
        assert_eq!(h.engine.target_id(), Some("new-1".to_string()));
        assert_eq!(
            h.durable.get(TARGET_KEY).unwrap(),
            Some("new-1".to_string())
        );

        h.engine.push(false).await.unwrap();
        assert_eq!(h.remote.calls(), vec!["create", "update"]);

        let pushed = PayloadCodec::decode(&h.remote.content("new-1").unwrap()).unwrap();
        assert_eq!(pushed.data.todos, vec![TodoItem::new("buy milk").with_id("1")]);
    }

    #[tokio::test]
    async fn test_push_overwrites_without_merging() {
        let h = harness(Some("gist1"), Some("token"));
        h.remote.put(
            "gist1",
            &remote_payload(json!([{"id": "9", "text": "remote only"}])),
        );
        h.store.save_todos(&[TodoItem::new("local").with_id("1")]);

        h.engine.push(false).await.unwrap();
        let pushed = PayloadCodec::decode(&h.remote.content("gist1").unwrap()).unwrap();
        assert_eq!(pushed.data.todos, vec![TodoItem::new("local").with_id("1")]);
        assert_eq!(h.store.load_todos(), vec![TodoItem::new("local").with_id("1")]);
    }

    #[tokio::test]
    async fn test_pull_while_push_in_flight_is_dropped() {
        let h = harness(Some("gist1"), Some("token"));
        h.remote.hold_updates.store(true, Ordering::SeqCst);

        let engine = h.engine.clone();
        let push = tokio::spawn(async move { engine.push(false).await });
        h.remote.entered.notified().await;

        assert_eq!(h.engine.status().state, SyncState::Pushing);
        assert_eq!(
            h.engine.pull(false).await.unwrap(),
            SyncOutcome::Skipped(SkipReason::InFlight)
        );
        assert_eq!(
            h.engine.push(false).await.unwrap(),
            SyncOutcome::Skipped(SkipReason::InFlight)
        );

        h.remote.release.notify_one();
        push.await.unwrap().unwrap();
        assert_eq!(h.remote.calls(), vec!["update"]);
        assert_eq!(h.engine.status().state, SyncState::Idle);
    }

    #[tokio::test]
    async fn test_pull_if_empty() {
        let h = harness(Some("gist1"), None);
        h.remote.put(
            "gist1",
            &remote_payload(json!([{"id": "1", "text": "from remote"}])),
        );

        assert_eq!(
            h.engine.pull_if_empty().await,
            Some(SyncOutcome::Pulled { todos: 1, notes: 0 })
        );
        assert_eq!(h.engine.pull_if_empty().await, None);
        assert_eq!(h.remote.calls(), vec!["get"]);

        let h = harness(None, None);
        assert_eq!(h.engine.pull_if_empty().await, None);
    }

    #[tokio::test]
    async fn test_auto_push_needs_target() {
        let h = harness(None, Some("token"));
        assert_eq!(h.engine.auto_push().await, None);
        assert!(h.remote.calls().is_empty());
    }

    fn journal(h: &Harness) -> Journal {
        Journal::new(h.store.clone(), h.bus.clone(), NotesScope::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_coalesces_edits_into_one_push() {
        let h = harness(Some("gist1"), Some("token"));
        let journal = journal(&h);
        let (stop, stopped) = oneshot::channel::<()>();
        let runner = tokio::spawn({
            let engine = h.engine.clone();
            let events = h.bus.subscribe();
            async move {
                engine
                    .run(events, async {
                        let _ = stopped.await;
                    })
                    .await
            }
        });

        for text in ["one", "two", "three"] {
            journal.add_todo(text).unwrap();
            time::sleep(Duration::from_millis(500)).await;
        }
        assert!(h.remote.calls().is_empty());

        time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(h.remote.calls(), vec!["update"]);
        let pushed = PayloadCodec::decode(&h.remote.content("gist1").unwrap()).unwrap();
        assert_eq!(pushed.data.todos.len(), 3);

        stop.send(()).unwrap();
        runner.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_pulls_on_interval_and_resume() {
        let h = harness(Some("gist1"), None);
        h.remote.put("gist1", &remote_payload(json!([])));
        let (stop, stopped) = oneshot::channel::<()>();
        let runner = tokio::spawn({
            let engine = h.engine.clone();
            let events = h.bus.subscribe();
            async move {
                engine
                    .run(events, async {
                        let _ = stopped.await;
                    })
                    .await
            }
        });

        h.bus.emit(SyncEvent::Resumed);
        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(h.remote.calls(), vec!["get"]);

        // Too soon after the previous pull.
        time::sleep(Duration::from_millis(4_900)).await;
        h.bus.emit(SyncEvent::Resumed);
        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(h.remote.calls(), vec!["get"]);

        time::sleep(Duration::from_millis(7_000)).await;
        assert_eq!(h.remote.calls(), vec!["get", "get"]);

        stop.send(()).unwrap();
        runner.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_holds_pulls_after_edits() {
        let h = harness(Some("gist1"), None);
        h.remote.put("gist1", &remote_payload(json!([])));
        let journal = journal(&h);
        let (stop, stopped) = oneshot::channel::<()>();
        let runner = tokio::spawn({
            let engine = h.engine.clone();
            let events = h.bus.subscribe();
            async move {
                engine
                    .run(events, async {
                        let _ = stopped.await;
                    })
                    .await
            }
        });

        time::sleep(Duration::from_secs(8)).await;
        journal.add_todo("typing").unwrap();
        time::sleep(Duration::from_secs(5)).await;
        // The 12 s tick landed 4 s after the edit; no credential so no push.
        assert!(h.remote.calls().is_empty());

        time::sleep(Duration::from_secs(2)).await;
        h.bus.emit(SyncEvent::Resumed);
        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(h.remote.calls(), vec!["get"]);

        stop.send(()).unwrap();
        runner.await.unwrap();
    }
}
