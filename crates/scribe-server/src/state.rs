use std::path::PathBuf;

use scribe_core::reload::ReloadMessage;
use tokio::sync::broadcast;

use crate::session::SessionStore;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub root: PathBuf,
    pub sessions: SessionStore,
    pub reload_tx: broadcast::Sender<ReloadMessage>,
}

impl AppState {
    pub fn new(root: PathBuf) -> Self {
        let (tx, _) = broadcast::channel(64);
        let state = Self {
            root,
            sessions: SessionStore::new(),
            reload_tx: tx.clone(),
        };

        // Watch the project tree and broadcast coalesced reload frames.
        // Guard: only spawn if inside a Tokio runtime (skipped in sync unit tests).
        if tokio::runtime::Handle::try_current().is_ok() {
            crate::watch::spawn(state.root.clone(), tx);
        }

        state
    }
}
