//! In-memory session store.

use crate::error::CoreError;
use crate::types::{Session, SessionId, SessionSummary};
use log::{debug, info};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Sessions for the lifetime of the process.
#[derive(Clone, Default)]
pub(crate) struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
}

impl SessionStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Insert a session and return its id.
    pub(crate) fn insert(&self, session: Session) -> SessionId {
        let session_id = session.id;
        info!(
            "created session (session_id={}, topic={})",
            session_id, session.topic_id
        );
        self.sessions.write().insert(session_id, session);
        session_id
    }

    /// Snapshot of a session.
    pub(crate) fn get(&self, session_id: SessionId) -> Result<Session, CoreError> {
        self.sessions
            .read()
            .get(&session_id)
            .cloned()
            .ok_or(CoreError::UnknownSession(session_id))
    }

    /// Run `apply` against the session under the write lock.
    ///
    /// The lock is released when `apply` returns; callers must not await inside it.
    pub(crate) fn update<R>(
        &self,
        session_id: SessionId,
        apply: impl FnOnce(&mut Session) -> R,
    ) -> Result<R, CoreError> {
        let mut sessions = self.sessions.write();
        let session = sessions
            .get_mut(&session_id)
            .ok_or(CoreError::UnknownSession(session_id))?;
        Ok(apply(session))
    }

    /// Summaries ordered newest first.
    pub(crate) fn list(&self) -> Vec<SessionSummary> {
        let mut summaries: Vec<SessionSummary> = self
            .sessions
            .read()
            .values()
            .map(SessionSummary::from)
            .collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        summaries
    }

    pub(crate) fn remove(&self, session_id: SessionId) -> bool {
        let removed = self.sessions.write().remove(&session_id).is_some();
        debug!(
            "removed session (session_id={}, existed={})",
            session_id, removed
        );
        removed
    }
}
