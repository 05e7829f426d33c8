use log::warn;
use serde::{de::DeserializeOwned, Serialize};

use super::{
    error::{ProtocolError, SerializationError},
    messages::{ClientMessage, ServerMessage},
};

fn encode<M: Serialize>(
    message: &M,
    message_kind: &'static str,
    limit: Option<usize>,
) -> Result<Vec<u8>, SerializationError> {
    let bytes = serde_json::to_vec(message).map_err(|err| SerializationError::Encode {
        message_kind,
        message: err.to_string(),
    })?;

    if let Some(limit) = limit {
        if bytes.len() > limit {
            return Err(SerializationError::PayloadTooLarge {
                message_kind,
                size: bytes.len(),
                limit,
            });
        }
    }

    Ok(bytes)
}

fn decode<M: DeserializeOwned>(bytes: &[u8], message_kind: &'static str) -> Result<M, ProtocolError> {
    serde_json::from_slice(bytes).map_err(|err| {
        warn!("Dropping malformed {} of {} bytes: {}", message_kind, bytes.len(), err);
        ProtocolError::Malformed {
            message_kind,
            line: err.line(),
            column: err.column(),
            message: err.to_string(),
        }
    })
}

/// Encodes a response; `limit` bounds the encoded size in bytes
pub fn encode_server_message(
    message: &ServerMessage,
    limit: Option<usize>,
) -> Result<Vec<u8>, SerializationError> {
    encode(message, "ServerMessage", limit)
}

pub fn decode_server_message(bytes: &[u8]) -> Result<ServerMessage, ProtocolError> {
    decode(bytes, "ServerMessage")
}

pub fn encode_client_message(message: &ClientMessage) -> Result<Vec<u8>, SerializationError> {
    encode(message, "ClientMessage", None)
}

pub fn decode_client_message(bytes: &[u8]) -> Result<ClientMessage, ProtocolError> {
    decode(bytes, "ClientMessage")
}
