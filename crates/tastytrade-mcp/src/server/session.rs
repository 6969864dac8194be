//! MCP session management for the HTTP transport.
//!
//! Each session buffers the events it has produced in a ring buffer and
//! broadcasts live events to connected SSE streams, so a reconnecting
//! client can replay what it missed via `Last-Event-ID`.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use axum::response::sse::Event;
use tokio::sync::{RwLock, broadcast};

/// Maximum number of events kept for replay per session.
const HISTORY_SIZE: usize = 100;

/// Sessions idle longer than this are swept.
const SESSION_TIMEOUT: Duration = Duration::from_secs(3600);

/// Interval between stale-session sweeps.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// A buffered SSE event with an ID for replay support.
#[derive(Clone, Debug)]
pub struct BufferedEvent {
    /// Monotonically increasing per-session event ID.
    pub id: u64,
    /// Event type (e.g., "message").
    pub event_type: String,
    /// JSON payload.
    pub data: String,
}

impl BufferedEvent {
    /// Convert to an Axum SSE event.
    #[must_use]
    pub fn to_sse_event(&self) -> Event {
        Event::default().id(self.id.to_string()).event(self.event_type.clone()).data(self.data.clone())
    }
}

/// A single MCP session.
pub struct Session {
    /// Unique session identifier, carried in the `Mcp-Session-Id` header.
    pub id: String,
    tx: broadcast::Sender<BufferedEvent>,
    history: RwLock<VecDeque<BufferedEvent>>,
    next_event_id: AtomicU64,
    last_active: RwLock<Instant>,
}

impl Session {
    fn new(id: String) -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            id,
            tx,
            history: RwLock::new(VecDeque::with_capacity(HISTORY_SIZE)),
            next_event_id: AtomicU64::new(1),
            last_active: RwLock::new(Instant::now()),
        }
    }

    /// Buffer an event for replay and broadcast it to live subscribers.
    pub async fn push_event(&self, event_type: impl Into<String>, data: impl Into<String>) -> u64 {
        let id = self.next_event_id.fetch_add(1, Ordering::SeqCst);
        let event = BufferedEvent { id, event_type: event_type.into(), data: data.into() };

        {
            let mut history = self.history.write().await;
            if history.len() >= HISTORY_SIZE {
                history.pop_front();
            }
            history.push_back(event.clone());
        }

        let _ = self.tx.send(event);
        *self.last_active.write().await = Instant::now();
        id
    }

    /// Events after the given ID, for replay on reconnection.
    pub async fn get_events_after(&self, last_event_id: u64) -> Vec<BufferedEvent> {
        self.history.read().await.iter().filter(|e| e.id > last_event_id).cloned().collect()
    }

    /// Subscribe to live events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BufferedEvent> {
        self.tx.subscribe()
    }

    async fn is_stale(&self) -> bool {
        self.last_active.read().await.elapsed() > SESSION_TIMEOUT
    }

    /// Record activity so the session is not swept.
    pub async fn touch(&self) {
        *self.last_active.write().await = Instant::now();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("id", &self.id).finish()
    }
}

/// Session registry for the HTTP transport.
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<String, Arc<Session>>>>,
}

impl SessionManager {
    #[must_use]
    pub fn new() -> Self {
        Self { sessions: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Create a new session.
    pub async fn create_session(&self) -> Arc<Session> {
        let id = uuid::Uuid::new_v4().to_string();
        let session = Arc::new(Session::new(id.clone()));
        self.sessions.write().await.insert(id, Arc::clone(&session));
        tracing::info!(session_id = %session.id, "Created new session");
        session
    }

    /// Get an existing session by ID.
    pub async fn get_session(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Get the session named by the header, or create a fresh one.
    pub async fn get_or_create_session(&self, id: Option<&str>) -> Arc<Session> {
        if let Some(id) = id {
            if let Some(session) = self.get_session(id).await {
                session.touch().await;
                return session;
            }
        }
        self.create_session().await
    }

    /// Remove a session.
    pub async fn remove_session(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            tracing::info!(session_id = %id, "Removed session");
        }
        removed
    }

    /// Number of live sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Start the background stale-session sweep.
    pub fn start_cleanup_task(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                let mut stale = Vec::new();
                {
                    let sessions = self.sessions.read().await;
                    for (id, session) in sessions.iter() {
                        if session.is_stale().await {
                            stale.push(id.clone());
                        }
                    }
                }
                if !stale.is_empty() {
                    let mut sessions = self.sessions.write().await;
                    for id in &stale {
                        sessions.remove(id);
                    }
                    tracing::debug!(count = stale.len(), "Swept stale sessions");
                }
            }
        });
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_session_creation_and_lookup() {
        let manager = SessionManager::new();
        let session = manager.create_session().await;

        assert!(!session.id.is_empty());
        assert_eq!(manager.session_count().await, 1);
        assert!(manager.get_session(&session.id).await.is_some());
        assert!(manager.get_session("nonexistent").await.is_none());
    }

    #[tokio::test]
    async fn test_event_push_and_replay() {
        let manager = SessionManager::new();
        let session = manager.create_session().await;

        assert_eq!(session.push_event("message", r#"{"n":1}"#).await, 1);
        assert_eq!(session.push_event("message", r#"{"n":2}"#).await, 2);
        assert_eq!(session.push_event("message", r#"{"n":3}"#).await, 3);

        let replayed = session.get_events_after(1).await;
        assert_eq!(replayed.len(), 2);
        assert_eq!(replayed[0].id, 2);
    }

    #[tokio::test]
    async fn test_ring_buffer_bounds_history() {
        let manager = SessionManager::new();
        let session = manager.create_session().await;

        for i in 0..150 {
            session.push_event("message", format!(r#"{{"n":{i}}}"#)).await;
        }

        let events = session.get_events_after(0).await;
        assert_eq!(events.len(), HISTORY_SIZE);
        assert_eq!(events[0].id, 51);
    }

    #[tokio::test]
    async fn test_remove_session() {
        let manager = SessionManager::new();
        let session = manager.create_session().await;

        assert!(manager.remove_session(&session.id).await);
        assert!(!manager.remove_session(&session.id).await);
        assert_eq!(manager.session_count().await, 0);
    }
}
