use thiserror::Error;

use trellis_shared::{ComponentId, ProtocolError, SerializationError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrellisClientError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    /// The response refers to a component the mirror does not know. The
    /// whole response is rejected and the mirror left as it was.
    #[error("Response references unknown component {component}")]
    UnknownComponent { component: ComponentId },

    #[error("Response attaches {component} under unknown parent {parent}")]
    ParentNotFound {
        component: ComponentId,
        parent: ComponentId,
    },
}
