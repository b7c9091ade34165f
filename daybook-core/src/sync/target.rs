//! Where to sync and with which token.

use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use crate::store::KeyValueStore;

/// Durable key holding the remote document id.
pub const TARGET_KEY: &str = "daybook_sync_gist_id_v1";

/// Session key holding the bearer token. Never written to durable storage.
pub const CREDENTIAL_KEY: &str = "daybook_sync_token_session_v1";

/// Where the resolved target id came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSource {
    /// Passed in for this run (command-line flag, environment).
    Explicit,
    /// Saved by an earlier run.
    Persisted,
    /// The configured default.
    Default,
}

impl fmt::Display for TargetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetSource::Explicit => write!(f, "explicit"),
            TargetSource::Persisted => write!(f, "persisted"),
            TargetSource::Default => write!(f, "default"),
        }
    }
}

/// The remote document id plus the session credential.
pub struct SyncTarget {
    durable: Arc<dyn KeyValueStore>,
    session: Arc<dyn KeyValueStore>,
    remote_doc_id: Option<String>,
    source: Option<TargetSource>,
}

impl SyncTarget {
    /// Resolves the target id: explicit, then persisted, then the default.
    ///
    /// An explicit id is persisted so later runs pick it up. The default is
    /// persisted too when nothing is stored yet, so a later config change
    /// does not move an existing device to another document.
    pub fn resolve(
        durable: Arc<dyn KeyValueStore>,
        session: Arc<dyn KeyValueStore>,
        explicit: Option<&str>,
        default: Option<&str>,
    ) -> Self {
        let mut target = Self {
            durable,
            session,
            remote_doc_id: None,
            source: None,
        };

        if let Some(id) = normalize(explicit) {
            target.set_target(&id);
            target.source = Some(TargetSource::Explicit);
        } else if let Some(id) = target.persisted_id() {
            target.remote_doc_id = Some(id);
            target.source = Some(TargetSource::Persisted);
        } else if let Some(id) = normalize(default) {
            target.set_target(&id);
            target.source = Some(TargetSource::Default);
        }

        target
    }

    pub fn remote_doc_id(&self) -> Option<&str> {
        self.remote_doc_id.as_deref()
    }

    pub fn source(&self) -> Option<TargetSource> {
        self.source
    }

    /// Adopts `id` as the target and persists it.
    ///
    /// Returns `false` when the id could not be persisted; it is still used
    /// for the rest of this session. A blank id is ignored.
    pub fn set_target(&mut self, id: &str) -> bool {
        let Some(id) = normalize(Some(id)) else {
            return false;
        };

        let persisted = match self.durable.set(TARGET_KEY, &id) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to persist sync target: {}", e);
                false
            }
        };

        if self.remote_doc_id.as_deref() != Some(id.as_str()) {
            info!("Sync target set to {}", id);
        }
        self.remote_doc_id = Some(id);
        self.source = Some(TargetSource::Persisted);
        persisted
    }

    /// Forgets the target, persisted copy included.
    pub fn clear_target(&mut self) -> bool {
        self.remote_doc_id = None;
        self.source = None;
        match self.durable.remove(TARGET_KEY) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to clear sync target: {}", e);
                false
            }
        }
    }

    /// The session credential, if one is set.
    pub fn credential(&self) -> Option<String> {
        match self.session.get(CREDENTIAL_KEY) {
            Ok(value) => normalize(value.as_deref()),
            Err(e) => {
                warn!("Failed to read sync credential: {}", e);
                None
            }
        }
    }

    pub fn has_credential(&self) -> bool {
        self.credential().is_some()
    }

    /// Stores the credential for this session. A blank token removes it.
    pub fn set_credential(&self, token: &str) -> bool {
        let result = match normalize(Some(token)) {
            Some(token) => self.session.set(CREDENTIAL_KEY, &token),
            None => self.session.remove(CREDENTIAL_KEY),
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to store sync credential: {}", e);
                false
            }
        }
    }

    fn persisted_id(&self) -> Option<String> {
        match self.durable.get(TARGET_KEY) {
            Ok(value) => normalize(value.as_deref()),
            Err(e) => {
                warn!("Failed to read persisted sync target: {}", e);
                None
            }
        }
    }
}

fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn stores() -> (Arc<MemoryStore>, Arc<MemoryStore>) {
        (Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_resolve_precedence() {
        let (durable, session) = stores();
        durable.set(TARGET_KEY, "persisted").unwrap();

        let target = SyncTarget::resolve(
            durable.clone(),
            session.clone(),
            Some(" explicit "),
            Some("default"),
        );
        assert_eq!(target.remote_doc_id(), Some("explicit"));
        assert_eq!(target.source(), Some(TargetSource::Explicit));
        assert_eq!(durable.get(TARGET_KEY).unwrap(), Some("explicit".to_string()));

        let target = SyncTarget::resolve(durable.clone(), session.clone(), None, Some("default"));
        assert_eq!(target.remote_doc_id(), Some("explicit"));
        assert_eq!(target.source(), Some(TargetSource::Persisted));
    }

    #[test]
    fn test_resolve_default_persisted_when_nothing_stored() {
        let (durable, session) = stores();
        let target =
            SyncTarget::resolve(durable.clone(), session.clone(), Some("  "), Some("default"));
        assert_eq!(target.remote_doc_id(), Some("default"));
        assert_eq!(target.source(), Some(TargetSource::Default));
        assert_eq!(durable.get(TARGET_KEY).unwrap(), Some("default".to_string()));

        let target = SyncTarget::resolve(durable, session, None, Some("changed-default"));
        assert_eq!(target.remote_doc_id(), Some("default"));
        assert_eq!(target.source(), Some(TargetSource::Persisted));
    }

    #[test]
    fn test_resolve_default_survives_rejected_persist() {
        let (durable, session) = stores();
        durable.set_reject_writes(true);
        let target = SyncTarget::resolve(durable, session, None, Some("default"));
        assert_eq!(target.remote_doc_id(), Some("default"));
        assert_eq!(target.source(), Some(TargetSource::Default));
    }

    #[test]
    fn test_resolve_nothing() {
        let (durable, session) = stores();
        let target = SyncTarget::resolve(durable, session, None, None);
        assert_eq!(target.remote_doc_id(), None);
        assert_eq!(target.source(), None);
    }

    #[test]
    fn test_set_target_overrides_default() {
        let (durable, session) = stores();
        let mut target = SyncTarget::resolve(durable.clone(), session, None, Some("default"));

        assert!(target.set_target("new-id"));
        assert_eq!(target.remote_doc_id(), Some("new-id"));
        assert_eq!(durable.get(TARGET_KEY).unwrap(), Some("new-id".to_string()));

        assert!(!target.set_target("   "));
        assert_eq!(target.remote_doc_id(), Some("new-id"));

        assert!(target.clear_target());
        assert_eq!(target.remote_doc_id(), None);
        assert_eq!(durable.get(TARGET_KEY).unwrap(), None);
    }

    #[test]
    fn test_set_target_survives_rejected_persist() {
        let (durable, session) = stores();
        durable.set_reject_writes(true);
        let mut target = SyncTarget::resolve(durable, session, None, None);

        assert!(!target.set_target("abc"));
        assert_eq!(target.remote_doc_id(), Some("abc"));
    }

    #[test]
    fn test_credential_lives_in_session_only() {
        let (durable, session) = stores();
        let target = SyncTarget::resolve(durable.clone(), session.clone(), None, None);
        assert!(!target.has_credential());

        assert!(target.set_credential(" ghp_token "));
        assert_eq!(target.credential(), Some("ghp_token".to_string()));
        assert!(durable.keys().unwrap().is_empty());
        assert_eq!(
            session.get(CREDENTIAL_KEY).unwrap(),
            Some("ghp_token".to_string())
        );

        assert!(target.set_credential(""));
        assert_eq!(target.credential(), None);
        assert_eq!(session.get(CREDENTIAL_KEY).unwrap(), None);
    }
}
