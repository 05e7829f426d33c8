use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, PoisonError, RwLock},
};

use log::info;
use serde::{Deserialize, Serialize};

use crate::session::ui_session::UiSession;

use super::session_context::SessionContext;

const GENERATED_ID_LENGTH: usize = 24;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh random alphanumeric id
    pub fn generate() -> Self {
        Self(
            std::iter::repeat_with(fastrand::alphanumeric)
                .take(GENERATED_ID_LENGTH)
                .collect(),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where session contexts live between requests
pub trait SessionStore: Send + Sync {
    fn get_or_create_context(&self, session_id: &SessionId) -> Arc<SessionContext>;

    /// Ends a session. Transactions already holding the context finish
    /// normally.
    fn remove_context(&self, session_id: &SessionId) -> Option<Arc<SessionContext>>;

    fn contains(&self, session_id: &SessionId) -> bool;
}

type UiFactory = Box<dyn Fn(&SessionId) -> UiSession + Send + Sync>;

/// Keeps every session in memory, building its UI with `factory` on first
/// access. The store lock is only held while looking a context up, never
/// while a transaction runs.
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Arc<SessionContext>>>,
    factory: UiFactory,
}

impl InMemorySessionStore {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(&SessionId) -> UiSession + Send + Sync + 'static,
    {
        Self {
            sessions: RwLock::new(HashMap::new()),
            factory: Box::new(factory),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for InMemorySessionStore {
    fn get_or_create_context(&self, session_id: &SessionId) -> Arc<SessionContext> {
        if let Some(context) = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_id)
        {
            return context.clone();
        }

        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        sessions
            .entry(session_id.clone())
            .or_insert_with(|| {
                info!("SessionStore: creating session {}", session_id);
                Arc::new(SessionContext::new(
                    session_id.clone(),
                    (self.factory)(session_id),
                ))
            })
            .clone()
    }

    fn remove_context(&self, session_id: &SessionId) -> Option<Arc<SessionContext>> {
        let removed = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(session_id);
        if removed.is_some() {
            info!("SessionStore: removed session {}", session_id);
        }
        removed
    }

    fn contains(&self, session_id: &SessionId) -> bool {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(session_id)
    }
}
