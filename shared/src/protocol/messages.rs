use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ComponentId, InterfaceName, MethodName, SequenceNumber, StateDiff};

/// Structural change of the component tree, replayed by the client in order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HierarchyChange {
    Attached {
        id: ComponentId,
        parent: Option<ComponentId>,
        kind: String,
    },
    Detached {
        id: ComponentId,
    },
}

/// The fields of one Component that changed since its previous send
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateChange {
    pub component: ComponentId,
    /// State version after this change was applied
    pub version: u64,
    pub diff: StateDiff,
}

/// A server -> client method call targeting one Component's client-side peer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRpcCall {
    pub component: ComponentId,
    pub interface: InterfaceName,
    pub method: MethodName,
    pub args: Vec<Value>,
}

/// A client -> server event, delivered to the handler registered for
/// `(component, interface)`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerRpcCall {
    pub component: ComponentId,
    pub interface: InterfaceName,
    pub method: MethodName,
    pub args: Vec<Value>,
    pub sequence: SequenceNumber,
}

/// Everything one response cycle delivers to the client
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerMessage {
    pub sequence: SequenceNumber,
    /// The client must drop its mirrored tree and rebuild it from this
    /// message, which then carries every component in full
    #[serde(default)]
    pub resynchronize: bool,
    pub hierarchy: Vec<HierarchyChange>,
    pub changes: Vec<StateChange>,
    pub calls: Vec<ClientRpcCall>,
}

impl ServerMessage {
    /// True when the response carries nothing the client must apply
    pub fn is_empty(&self) -> bool {
        !self.resynchronize
            && self.hierarchy.is_empty()
            && self.changes.is_empty()
            && self.calls.is_empty()
    }
}

/// One client request: the user interactions since the previous request
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientMessage {
    /// Sequence of the last server response the client applied
    pub last_response: Option<SequenceNumber>,
    pub invocations: Vec<ServerRpcCall>,
}
