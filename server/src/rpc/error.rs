use thiserror::Error;

use trellis_shared::ComponentId;

use crate::component::error::TreeError;

/// Errors raised while delivering a client -> server invocation. Each one is
/// isolated to its invocation; the rest of the request is still processed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    /// No handler is registered for the component / interface pair
    #[error("No RPC handler for interface '{interface}' on component {component}")]
    UnknownRpcTarget {
        component: ComponentId,
        interface: String,
    },

    /// The invocation's sequence number does not follow the last applied one
    #[error("Dropped invocation with sequence {sequence}: last applied sequence is {last_applied}")]
    StaleSequence { sequence: u16, last_applied: u16 },

    /// The interface has no method with this name
    #[error("Interface '{interface}' has no method '{method}'")]
    UnknownMethod { interface: String, method: String },

    /// An argument could not be decoded into the type the handler expects
    #[error("Argument {index} of '{method}' is invalid: {message}")]
    InvalidArguments {
        method: String,
        index: usize,
        message: String,
    },

    /// The handler was registered for another component type
    #[error("Component {component} is not a {expected}")]
    TargetTypeMismatch {
        component: ComponentId,
        expected: &'static str,
    },

    /// The handler ran and reported a failure of its own
    #[error("Handler for '{interface}.{method}' on component {component} failed: {message}")]
    HandlerFailed {
        component: ComponentId,
        interface: String,
        method: String,
        message: String,
    },

    /// The handler succeeded but one of the tree changes it requested could
    /// not be applied. Changes requested before it stay applied.
    #[error("Tree change requested by component {component} failed: {error}")]
    StructureRejected {
        component: ComponentId,
        error: TreeError,
    },
}
