//! Deferred state finalization.
//!
//! Right before a response is written, every dirty component reachable from
//! the root gets its `before_client_response` hook, parents before children.
//! Hooks may mark other components dirty; passes repeat until no component is
//! left dirty, so cascading derived updates land in the same response.

use std::collections::HashSet;

use log::{debug, warn};
use thiserror::Error;

use trellis_shared::ComponentId;

use crate::{
    component::{component::ComponentContext, tree::ComponentTree},
    dirty_tracker::DirtyTracker,
    rpc::client_calls::ClientCallQueue,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FinalizeError {
    /// Hooks kept re-marking components dirty past the configured bound
    #[error("Finalize cascade did not settle after {passes} passes; {still_dirty} components still dirty")]
    CascadeOverflow { passes: usize, still_dirty: usize },
    /// A hook asked to attach or detach a component
    #[error("Component {component} requested a tree change from its finalize hook")]
    StructureChangeInHook { component: ComponentId },
}

/// Result of one finalize run
#[derive(Debug, Default)]
pub struct FinalizeOutcome {
    /// Every finalized component, in tree pre-order, each listed once
    pub finalized: Vec<ComponentId>,
    /// Number of hook invocations, counting re-finalized components again
    pub invocations: usize,
    pub passes: usize,
}

pub(crate) fn finalize(
    tree: &mut ComponentTree,
    dirty: &mut DirtyTracker,
    client_calls: &mut ClientCallQueue,
    max_passes: usize,
) -> Result<FinalizeOutcome, FinalizeError> {
    let mut collected: HashSet<ComponentId> = HashSet::new();
    let mut outcome = FinalizeOutcome::default();

    loop {
        let pending: Vec<ComponentId> = tree
            .pre_order()
            .into_iter()
            .filter(|id| dirty.is_dirty(id))
            .collect();

        if pending.is_empty() {
            break;
        }

        if outcome.passes == max_passes {
            warn!(
                "Finalizer: cascade overflow after {} passes, {} components still dirty",
                outcome.passes,
                pending.len()
            );
            for id in collected {
                dirty.mark(id);
            }
            return Err(FinalizeError::CascadeOverflow {
                passes: outcome.passes,
                still_dirty: pending.len(),
            });
        }
        outcome.passes += 1;

        for id in pending {
            if !dirty.clear(&id) {
                continue;
            }
            let Some(component) = tree.get_mut(&id) else {
                continue;
            };

            let initial = !component.state().has_been_sent();
            let mut marks = Vec::new();
            let mut structure = Vec::new();
            {
                let mut cx = ComponentContext::new(id, &mut marks, &mut structure, client_calls);
                component.before_client_response(&mut cx, initial);
            }
            outcome.invocations += 1;
            collected.insert(id);

            if !structure.is_empty() {
                warn!(
                    "Finalizer: {} requested {} tree changes from its hook, failing the response",
                    id,
                    structure.len()
                );
                for id in collected {
                    dirty.mark(id);
                }
                return Err(FinalizeError::StructureChangeInHook { component: id });
            }

            for target in marks {
                if target == id || !tree.contains(&target) {
                    continue;
                }
                if dirty.mark(target) && collected.contains(&target) {
                    debug!(
                        "Finalizer: {} re-marked {} after it was finalized, running it again",
                        id, target
                    );
                }
            }
        }
    }

    outcome.finalized = tree
        .pre_order()
        .into_iter()
        .filter(|id| collected.contains(id))
        .collect();

    Ok(outcome)
}
