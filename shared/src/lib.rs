//! # Trellis Shared
//! Wire protocol, component state and sequence handling shared between
//! trellis-server & trellis-client crates.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod caption;
mod context_help;
mod protocol;
mod state;
mod types;
mod wrapping_number;

pub use caption::caption_from_property_id;
pub use context_help::{MouseButton, MouseEventDetails, CONTEXT_HELP_RPC, ICON_CLICK};
pub use protocol::{
    codec::{
        decode_client_message, decode_server_message, encode_client_message,
        encode_server_message,
    },
    error::{ProtocolError, SerializationError},
    messages::{
        ClientMessage, ClientRpcCall, HierarchyChange, ServerMessage, ServerRpcCall, StateChange,
    },
};
pub use state::{
    capabilities::{
        field, FieldRules, HasCaption, HasDescription, HasEnabled, HasErrorMessage, HasModified,
        HasReadOnly, HasRequired, HasState,
    },
    error::StateError,
    shared_state::{SharedState, StateDiff},
};
pub use types::{ComponentId, InterfaceName, MethodName};
pub use wrapping_number::{sequence_greater_than, sequence_less_than, SequenceNumber};

pub use serde_json::{json, Value};
