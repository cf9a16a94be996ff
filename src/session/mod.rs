//! Chat Sessions
//!
//! A session owns one user's transcript, expert selection, theme and last
//! upload result. Sessions are created on first visit, mutated only through
//! [`SessionEvent`]s, and dropped from the store when the user ends them or
//! when they sit idle past the configured timeout.
//!
//! ```text
//!   HTTP handler ──► SessionStore::dispatch(id, event)
//!                          │  lock session
//!                          ▼
//!                    Session::apply(event)  ──► dispatch::chat_turn / process_upload
//!                          │
//!                          ▼
//!                    EventOutcome (Ended ⇒ removed from store)
//!
//!   idle sweeper ──► SessionStore::evict_idle  (every SESSION_SWEEP_SECS)
//! ```

pub mod dispatch;
pub mod events;

pub use dispatch::{chat_turn, process_upload, TurnOutcome, FAILED_REPLY_PREFIX, UPLOAD_FAILED};
pub use events::{EventOutcome, SessionEvent};

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};
use uuid::Uuid;

use crate::agents::ExpertAgents;
use crate::models::{ChatMessage, Expert, SessionSnapshot, Theme, UploadStatus};
use crate::types::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub history: Vec<ChatMessage>,
    pub expert: Expert,
    pub theme: Theme,
    pub upload: Option<UploadStatus>,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    /// Set once the session is ended or evicted; waiters must not apply further events
    pub ended: bool,
}

impl Session {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            history: Vec::new(),
            expert: Expert::default(),
            theme: Theme::default(),
            upload: None,
            created_at: now,
            last_active: now,
            ended: false,
        }
    }

    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }

    pub fn idle_for(&self, now: DateTime<Utc>) -> Duration {
        (now - self.last_active).to_std().unwrap_or(Duration::ZERO)
    }

    pub fn ensure_live(&self) -> AppResult<()> {
        if self.ended {
            Err(AppError::NotFound(format!("session {} not found", self.id)))
        } else {
            Ok(())
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            expert: self.expert,
            theme: self.theme,
            history: self.history.clone(),
            upload: self.upload.clone(),
            created_at: self.created_at,
            last_active: self.last_active,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Live sessions keyed by id
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, Arc<Mutex<Session>>>>>,
}

impl SessionStore {
    pub async fn create(&self) -> Uuid {
        let session = Session::new();
        let id = session.id;
        let mut guard = self.inner.write().await;
        guard.insert(id, Arc::new(Mutex::new(session)));
        info!(session_id = %id, sessions = guard.len(), "Session started");
        id
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Arc<Mutex<Session>>> {
        let guard = self.inner.read().await;
        guard
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("session {} not found", id)))
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        let mut guard = self.inner.write().await;
        let removed = guard.remove(&id).is_some();
        if removed {
            info!(session_id = %id, sessions = guard.len(), "Session ended");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Copy of the session's current state
    pub async fn snapshot(&self, id: Uuid) -> AppResult<SessionSnapshot> {
        let session = self.get(id).await?;
        let guard = session.lock().await;
        guard.ensure_live()?;
        Ok(guard.snapshot())
    }

    /// Apply one event with the session locked for its whole duration.
    ///
    /// Returns the outcome and the session as it stands afterwards, so the
    /// caller can render it even when the event ended the session.
    pub async fn dispatch(
        &self,
        id: Uuid,
        event: SessionEvent,
        agents: &ExpertAgents,
    ) -> AppResult<(EventOutcome, Session)> {
        let session = self.get(id).await?;
        let mut guard = session.lock().await;
        // The session may have ended while this request waited for the lock
        guard.ensure_live()?;
        guard.touch();
        debug!(session_id = %id, event = event.kind(), "Applying session event");

        let outcome = guard.apply(event, agents).await;
        if matches!(outcome, EventOutcome::Ended) {
            guard.ended = true;
        }
        let state = guard.clone();
        drop(guard);

        if state.ended {
            self.remove(id).await;
        }
        Ok((outcome, state))
    }

    /// Drop sessions idle for at least `max_idle`. Sessions busy with an
    /// event are skipped. Returns how many were evicted.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let now = Utc::now();
        let mut expired = Vec::new();
        {
            let guard = self.inner.read().await;
            for (id, session) in guard.iter() {
                if let Ok(mut session) = session.try_lock() {
                    if session.idle_for(now) >= max_idle {
                        session.ended = true;
                        expired.push(*id);
                    }
                }
            }
        }

        if expired.is_empty() {
            return 0;
        }

        let mut guard = self.inner.write().await;
        for id in &expired {
            guard.remove(id);
        }
        info!(evicted = expired.len(), sessions = guard.len(), "Evicted idle sessions");
        expired.len()
    }

    /// Run `evict_idle` every `every` until the returned task is aborted
    pub fn spawn_idle_sweeper(&self, every: Duration, max_idle: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                store.evict_idle(max_idle).await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::ChatAgent;
    use crate::types::LLMMessage;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingAgent {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ChatAgent for CountingAgent {
        async fn invoke(&self, _messages: Vec<LLMMessage>) -> AppResult<Vec<LLMMessage>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![LLMMessage::assistant("answer")])
        }
    }

    async fn age(store: &SessionStore, id: Uuid, by: chrono::Duration) {
        let session = store.get(id).await.unwrap();
        session.lock().await.last_active = Utc::now() - by;
    }

    #[tokio::test]
    async fn test_create_get_remove() {
        let store = SessionStore::default();
        assert!(store.is_empty().await);

        let id = store.create().await;
        assert_eq!(store.len().await, 1);

        let session = store.get(id).await.unwrap();
        {
            let guard = session.lock().await;
            assert_eq!(guard.id, id);
            assert!(guard.history.is_empty());
            assert_eq!(guard.expert, Expert::HistoryExpert);
            assert_eq!(guard.theme, Theme::Light);
        }

        assert!(store.remove(id).await);
        assert!(!store.remove(id).await);
        assert!(matches!(store.get(id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = SessionStore::default();
        let a = store.create().await;
        let b = store.create().await;
        assert_ne!(a, b);

        store
            .get(a)
            .await
            .unwrap()
            .lock()
            .await
            .history
            .push(ChatMessage::user("only in a"));

        assert_eq!(store.snapshot(a).await.unwrap().history.len(), 1);
        assert!(store.snapshot(b).await.unwrap().history.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_session_snapshot() {
        let store = SessionStore::default();
        let err = store.snapshot(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_idle_sessions_are_evicted() {
        let store = SessionStore::default();
        let stale = store.create().await;
        let fresh = store.create().await;
        age(&store, stale, chrono::Duration::hours(2)).await;

        let evicted = store.evict_idle(Duration::from_secs(3600)).await;

        assert_eq!(evicted, 1);
        assert_eq!(store.len().await, 1);
        assert!(matches!(store.get(stale).await, Err(AppError::NotFound(_))));
        assert!(store.get(fresh).await.is_ok());
    }

    #[tokio::test]
    async fn test_events_keep_session_alive() {
        let store = SessionStore::default();
        let agents = ExpertAgents::uniform(Arc::new(CountingAgent::default()));
        let id = store.create().await;
        age(&store, id, chrono::Duration::hours(2)).await;

        store.dispatch(id, SessionEvent::ClearHistory, &agents).await.unwrap();

        assert_eq!(store.evict_idle(Duration::from_secs(3600)).await, 0);
        assert!(store.get(id).await.is_ok());
    }

    #[tokio::test]
    async fn test_busy_session_is_not_evicted() {
        let store = SessionStore::default();
        let id = store.create().await;
        age(&store, id, chrono::Duration::hours(2)).await;

        let session = store.get(id).await.unwrap();
        let guard = session.lock().await;
        assert_eq!(store.evict_idle(Duration::from_secs(3600)).await, 0);
        drop(guard);

        assert_eq!(store.evict_idle(Duration::from_secs(3600)).await, 1);
    }

    #[tokio::test]
    async fn test_sweeper_reclaims_abandoned_sessions() {
        let store = SessionStore::default();
        for _ in 0..5 {
            store.create().await;
        }

        let sweeper = store.spawn_idle_sweeper(Duration::from_millis(10), Duration::ZERO);
        tokio::time::sleep(Duration::from_millis(200)).await;
        sweeper.abort();

        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_event_waiting_on_ended_session_is_dropped() {
        let store = SessionStore::default();
        let agent = Arc::new(CountingAgent::default());
        let agents = ExpertAgents::uniform(agent.clone());
        let id = store.create().await;

        // Hold the session so both requests queue up behind it: end first, then ask
        let session = store.get(id).await.unwrap();
        let guard = session.lock().await;

        let end = {
            let (store, agents) = (store.clone(), agents.clone());
            tokio::spawn(async move { store.dispatch(id, SessionEvent::EndSession, &agents).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        let ask = {
            let (store, agents) = (store.clone(), agents.clone());
            tokio::spawn(async move {
                store
                    .dispatch(id, SessionEvent::Ask("still there?".into()), &agents)
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        drop(guard);

        let (outcome, _) = end.await.unwrap().unwrap();
        assert_eq!(outcome, EventOutcome::Ended);
        assert!(matches!(ask.await.unwrap(), Err(AppError::NotFound(_))));
        assert_eq!(agent.calls.load(Ordering::SeqCst), 0);
        assert!(store.is_empty().await);
    }
}
