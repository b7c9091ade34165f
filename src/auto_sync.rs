//! Auto-sync for CLI commands.
//!
//! Pushes after write operations when `auto_sync` is enabled in the
//! configuration.

use daybook_core::SyncOutcome;
use tracing::debug;

use crate::app::App;

/// Pushes local data if auto-sync is enabled and a target and token exist.
///
/// Failures are logged and never fail the command, so the CLI keeps working
/// offline.
pub async fn try_auto_sync(app: &App) {
    if !app.config.sync.auto_sync {
        return;
    }

    match app.engine.auto_push().await {
        Some(SyncOutcome::Pushed { doc_id, .. }) => debug!("Auto-sync pushed to {}", doc_id),
        Some(outcome) => debug!("Auto-sync did nothing: {:?}", outcome),
        None => {}
    }
}
