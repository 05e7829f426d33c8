use std::sync::Arc;

use super::{
    error::TransactionError,
    session_context::SessionContext,
    session_store::{SessionId, SessionStore},
    transaction::TransactionReport,
};
use crate::session::ui_session::UiSession;

/// Runs work on sessions, one transaction per session at a time
#[derive(Clone)]
pub struct TransactionManager {
    store: Arc<dyn SessionStore>,
}

impl TransactionManager {
    pub fn new<S: SessionStore + 'static>(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    pub fn store(&self) -> &dyn SessionStore {
        self.store.as_ref()
    }

    /// The session's context, created on first access
    pub fn session(&self, session_id: &SessionId) -> Arc<SessionContext> {
        self.store.get_or_create_context(session_id)
    }

    /// Waits for exclusive access to the session, then runs `work` inside a
    /// transaction on it
    pub fn with_transaction<R, F>(
        &self,
        session_id: &SessionId,
        work: F,
    ) -> Result<(R, TransactionReport), TransactionError>
    where
        F: FnOnce(&mut UiSession) -> R,
    {
        let context = self.session(session_id);
        let mut transaction = context.start_transaction()?;
        let result = work(&mut *transaction);
        Ok((result, transaction.end()))
    }

    /// Like `with_transaction`, but fails with `SessionBusy` instead of
    /// waiting
    pub fn try_with_transaction<R, F>(
        &self,
        session_id: &SessionId,
        work: F,
    ) -> Result<(R, TransactionReport), TransactionError>
    where
        F: FnOnce(&mut UiSession) -> R,
    {
        let context = self.session(session_id);
        let mut transaction = context.try_start_transaction()?;
        let result = work(&mut *transaction);
        Ok((result, transaction.end()))
    }
}
