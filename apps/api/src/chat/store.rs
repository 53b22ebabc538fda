//! Session store — explicit per-user session lifecycle.
//!
//! Each session sits behind its own async mutex. Handlers hold it for the
//! whole action (including the model call), which serializes actions within a
//! session while other sessions proceed independently.
//!
//! Sessions end on `remove`, or, when an idle TTL is set, once they have not
//! been looked up for longer than the TTL. Idle sessions are swept whenever a
//! new session is created; a session whose handle is still held by a request
//! is never swept.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

use crate::chat::session::ChatSession;

pub type SessionHandle = Arc<Mutex<ChatSession>>;

struct SessionEntry {
    handle: SessionHandle,
    last_active: DateTime<Utc>,
}

#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
    idle_ttl: Option<Duration>,
}

impl SessionStore {
    /// Sessions live until removed.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_ttl(idle_ttl: Duration) -> Self {
        Self {
            idle_ttl: Some(idle_ttl),
            ..Self::default()
        }
    }

    pub async fn create(&self) -> SessionHandle {
        let session = ChatSession::new();
        let id = session.id();
        let handle = Arc::new(Mutex::new(session));

        let mut sessions = self.sessions.write().await;
        self.evict_idle(&mut sessions);
        sessions.insert(
            id,
            SessionEntry {
                handle: handle.clone(),
                last_active: Utc::now(),
            },
        );
        info!("Session {id} created");
        handle
    }

    /// Looks a session up and marks it active.
    pub async fn get(&self, id: Uuid) -> Option<SessionHandle> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(&id)?;
        entry.last_active = Utc::now();
        Some(entry.handle.clone())
    }

    /// Returns false when the session did not exist.
    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            info!("Session {id} destroyed");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    fn evict_idle(&self, sessions: &mut HashMap<Uuid, SessionEntry>) {
        let Some(ttl) = self.idle_ttl else {
            return;
        };
        let now = Utc::now();
        let before = sessions.len();
        sessions.retain(|_, entry| {
            Arc::strong_count(&entry.handle) > 1 || now - entry.last_active < ttl
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!("Evicted {evicted} idle sessions");
        }
    }
}
