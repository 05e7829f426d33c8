use thiserror::Error;

use trellis_shared::{ProtocolError, SerializationError};

use crate::{finalizer::FinalizeError, transaction::error::TransactionError};

/// Errors that fail a whole response cycle. Nothing is sent; every component
/// that was about to be synchronized stays dirty for the next cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResponseError {
    #[error("Response aborted: {0}")]
    Finalize(#[from] FinalizeError),

    #[error("Response aborted: {0}")]
    Serialization(#[from] SerializationError),
}

/// Errors surfaced by [`Server::handle_request`](crate::Server::handle_request)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrellisServerError {
    #[error("Could not decode client request: {0}")]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Transaction(#[from] TransactionError),

    #[error(transparent)]
    Response(#[from] ResponseError),
}
