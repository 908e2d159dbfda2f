use std::collections::HashMap;
use std::sync::Arc;

use axum::http::HeaderMap;
use chrono::{DateTime, Duration, Utc};
use scribe_core::wizard::WizardState;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Cookie carrying the wizard session id.
pub const SESSION_COOKIE: &str = "scribe_wizard";

/// Sessions idle for longer than this are dropped the next time one is created.
const IDLE_TTL_HOURS: i64 = 24;

struct Session {
    state: WizardState,
    touched: DateTime<Utc>,
}

/// In-memory wizard sessions keyed by cookie id. State is intentionally not
/// persisted server-side; the browser mirrors it in sessionStorage and can
/// restore it through `POST /wizard/restore` after a server restart.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a fresh session. Idle sessions are pruned here so the map
    /// cannot grow without bound on a long-running server.
    pub async fn create(&self) -> (Uuid, WizardState) {
        let mut map = self.inner.write().await;
        prune_idle(&mut map, Utc::now());
        let id = Uuid::new_v4();
        let state = WizardState::new();
        map.insert(
            id,
            Session {
                state: state.clone(),
                touched: Utc::now(),
            },
        );
        (id, state)
    }

    pub async fn get(&self, id: Uuid) -> Option<WizardState> {
        let mut map = self.inner.write().await;
        let session = map.get_mut(&id)?;
        session.touched = Utc::now();
        Some(session.state.clone())
    }

    pub async fn put(&self, id: Uuid, state: WizardState) {
        let mut map = self.inner.write().await;
        map.insert(
            id,
            Session {
                state,
                touched: Utc::now(),
            },
        );
    }

    /// Mutate a session's state in place under the write lock and return a
    /// clone of the result. Returns None for unknown ids.
    pub async fn with_state<F, T>(&self, id: Uuid, f: F) -> Option<(WizardState, T)>
    where
        F: FnOnce(&mut WizardState) -> T,
    {
        let mut map = self.inner.write().await;
        let session = map.get_mut(&id)?;
        let out = f(&mut session.state);
        session.touched = Utc::now();
        Some((session.state.clone(), out))
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

fn prune_idle(map: &mut HashMap<Uuid, Session>, now: DateTime<Utc>) {
    let cutoff = now - Duration::hours(IDLE_TTL_HOURS);
    map.retain(|_, session| session.touched >= cutoff);
}

// ---------------------------------------------------------------------------
// Cookie plumbing
// ---------------------------------------------------------------------------

/// Pull the wizard session id out of the `Cookie` header, if any.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    let raw = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    for pair in raw.split(';') {
        let Some((name, value)) = pair.trim().split_once('=') else {
            continue;
        };
        if name == SESSION_COOKIE {
            return Uuid::parse_str(value.trim()).ok();
        }
    }
    None
}

/// `Set-Cookie` value for a new session. Session-scoped on purpose: the
/// browser half of the state lives in sessionStorage with the same lifetime.
pub fn set_cookie_value(id: Uuid) -> String {
    format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax")
}

/// Resolve the session named by the request cookie, creating one when the
/// cookie is missing or stale. The bool is true when a session was created
/// and the response needs a `Set-Cookie`.
pub async fn ensure_session(
    store: &SessionStore,
    headers: &HeaderMap,
) -> (Uuid, WizardState, bool) {
    if let Some(id) = session_id_from_headers(headers) {
        if let Some(state) = store.get(id).await {
            return (id, state, false);
        }
    }
    let (id, state) = store.create().await;
    (id, state, true)
}
