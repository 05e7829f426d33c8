use thiserror::Error;

/// A response could not be turned into bytes. Nothing is sent and the client
/// keeps its previous state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerializationError {
    #[error("Failed to encode {message_kind}: {message}")]
    Encode {
        message_kind: &'static str,
        message: String,
    },

    #[error("Encoded {message_kind} is {size} bytes, exceeding the configured limit of {limit} bytes")]
    PayloadTooLarge {
        message_kind: &'static str,
        size: usize,
        limit: usize,
    },
}

/// Incoming bytes could not be decoded into a protocol message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Malformed {message_kind} at line {line}, column {column}: {message}")]
    Malformed {
        message_kind: &'static str,
        line: usize,
        column: usize,
        message: String,
    },
}
