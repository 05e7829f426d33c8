use std::fmt;

use thiserror::Error;

use super::session_store::SessionId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    /// The calling thread already runs a transaction for this session;
    /// waiting for it would never return
    #[error("Thread already holds the transaction of session {session}")]
    Reentrant { session: SessionId },

    /// Another request holds the session and the caller chose not to wait
    #[error("Session {session} is busy with another transaction")]
    SessionBusy { session: SessionId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionPhase {
    Start,
    End,
}

impl fmt::Display for TransactionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionPhase::Start => write!(f, "start"),
            TransactionPhase::End => write!(f, "end"),
        }
    }
}

/// A transaction listener returned an error or panicked. The failure stays
/// with that listener: the others still run and the transaction still ends.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Transaction listener {listener} failed on {phase}: {message}")]
pub struct TransactionListenerFailure {
    pub listener: String,
    pub phase: TransactionPhase,
    pub message: String,
}
