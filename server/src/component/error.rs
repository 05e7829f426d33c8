use thiserror::Error;

use trellis_shared::ComponentId;

/// Errors that can occur while changing the component tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// Attempted to attach a component under a parent that is not in the tree
    #[error("Cannot attach under {parent} - parent is not attached")]
    ParentNotFound { parent: ComponentId },

    /// Attempted to operate on a component that is not (or no longer) attached
    #[error("Component {component} is not attached")]
    NotAttached { component: ComponentId },

    /// The root component lives as long as its session
    #[error("Component {component} is the root and cannot be detached")]
    CannotDetachRoot { component: ComponentId },
}
