use std::sync::Arc;

use log::{debug, info};

use trellis_shared::decode_client_message;

use crate::{
    error::TrellisServerError,
    session::ui_session::{InvocationReport, Response, UiSession},
    transaction::{
        manager::TransactionManager,
        session_context::SessionContext,
        session_store::{InMemorySessionStore, SessionId, SessionStore},
        transaction::TransactionReport,
    },
    ServerConfig,
};

/// Everything one client request produced
#[derive(Debug)]
pub struct RequestOutcome {
    pub invocations: InvocationReport,
    pub response: Response,
    pub transaction: TransactionReport,
}

/// Entry point for a transport: takes encoded client messages for a session
/// and returns the encoded response, one transaction per request
pub struct Server {
    config: ServerConfig,
    transactions: TransactionManager,
}

impl Server {
    /// Create a new Server over the given session store
    pub fn new<S: SessionStore + 'static>(config: ServerConfig, store: S) -> Self {
        Self {
            config,
            transactions: TransactionManager::new(store),
        }
    }

    /// Create a new Server keeping sessions in memory, building each new
    /// session's UI with `build_ui`
    pub fn in_memory<F>(config: ServerConfig, build_ui: F) -> Self
    where
        F: Fn(&SessionId, &ServerConfig) -> UiSession + Send + Sync + 'static,
    {
        let session_config = config.clone();
        let store = InMemorySessionStore::new(move |id| build_ui(id, &session_config));
        Self::new(config, store)
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn transactions(&self) -> &TransactionManager {
        &self.transactions
    }

    pub fn session(&self, session_id: &SessionId) -> Arc<SessionContext> {
        self.transactions.session(session_id)
    }

    pub fn end_session(&self, session_id: &SessionId) -> bool {
        let removed = self.transactions.store().remove_context(session_id).is_some();
        if removed {
            info!("Server: session {} ended", session_id);
        }
        removed
    }

    /// Applies one encoded client message to its session and writes the
    /// response, waiting for any transaction already running on the session
    pub fn handle_request(
        &self,
        session_id: &SessionId,
        payload: &[u8],
    ) -> Result<RequestOutcome, TrellisServerError> {
        self.process(session_id, payload, false)
    }

    /// Like `handle_request`, but fails with `SessionBusy` instead of waiting
    pub fn try_handle_request(
        &self,
        session_id: &SessionId,
        payload: &[u8],
    ) -> Result<RequestOutcome, TrellisServerError> {
        self.process(session_id, payload, true)
    }

    fn process(
        &self,
        session_id: &SessionId,
        payload: &[u8],
        try_only: bool,
    ) -> Result<RequestOutcome, TrellisServerError> {
        let message = decode_client_message(payload)?;
        debug!(
            "Server: request for {} with {} invocations",
            session_id,
            message.invocations.len()
        );

        let work = |ui: &mut UiSession| {
            let invocations = ui.handle_client_message(message);
            ui.write_response()
                .map(|response| (invocations, response))
        };
        let (result, transaction) = if try_only {
            self.transactions.try_with_transaction(session_id, work)?
        } else {
            self.transactions.with_transaction(session_id, work)?
        };

        let (invocations, response) = result?;
        Ok(RequestOutcome {
            invocations,
            response,
            transaction,
        })
    }
}
