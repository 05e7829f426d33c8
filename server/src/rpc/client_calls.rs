use std::collections::HashMap;

use trellis_shared::{ClientRpcCall, ComponentId, Value};

/// Queue lengths per component at one point in time, see
/// [`ClientCallQueue::checkpoint`]
#[derive(Debug, Default)]
pub struct CallCheckpoint {
    lengths: HashMap<ComponentId, usize>,
}

/// Server -> client calls waiting for the next response, kept per component
/// in invocation order
#[derive(Default)]
pub struct ClientCallQueue {
    calls: HashMap<ComponentId, Vec<ClientRpcCall>>,
}

impl ClientCallQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, component: ComponentId, interface: &str, method: &str, args: Vec<Value>) {
        self.calls.entry(component).or_default().push(ClientRpcCall {
            component,
            interface: interface.to_string(),
            method: method.to_string(),
            args,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.calls.values().all(Vec::is_empty)
    }

    pub fn len_for(&self, component: &ComponentId) -> usize {
        self.calls.get(component).map_or(0, Vec::len)
    }

    /// Drops everything queued for a component that left the tree
    pub fn remove_component(&mut self, component: &ComponentId) {
        self.calls.remove(component);
    }

    /// Copies the queued calls, grouped by component following `order`. Calls
    /// of one component keep their invocation order. The queue is untouched
    /// until [`clear`](Self::clear) confirms delivery.
    pub fn pending_in_order(&self, order: &[ComponentId]) -> Vec<ClientRpcCall> {
        order
            .iter()
            .filter_map(|id| self.calls.get(id))
            .flat_map(|calls| calls.iter().cloned())
            .collect()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    pub fn checkpoint(&self) -> CallCheckpoint {
        CallCheckpoint {
            lengths: self
                .calls
                .iter()
                .map(|(id, calls)| (*id, calls.len()))
                .collect(),
        }
    }

    /// Drops every call queued after `checkpoint` was taken
    pub fn rollback(&mut self, checkpoint: CallCheckpoint) {
        self.calls.retain(|id, calls| {
            calls.truncate(checkpoint.lengths.get(id).copied().unwrap_or(0));
            !calls.is_empty()
        });
    }
}
