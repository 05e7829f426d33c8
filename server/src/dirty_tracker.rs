use std::collections::HashSet;

use trellis_shared::ComponentId;

/// Session-scoped set of components awaiting resynchronization.
///
/// The tracker knows nothing about the tree: callers only mark components
/// that are attached (see `UiSession::mark_dirty`).
#[derive(Default)]
pub struct DirtyTracker {
    dirty: HashSet<ComponentId>,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the component was not dirty before
    pub fn mark(&mut self, id: ComponentId) -> bool {
        self.dirty.insert(id)
    }

    /// Returns true if the component was dirty before
    pub fn clear(&mut self, id: &ComponentId) -> bool {
        self.dirty.remove(id)
    }

    pub fn is_dirty(&self, id: &ComponentId) -> bool {
        self.dirty.contains(id)
    }

    pub fn len(&self) -> usize {
        self.dirty.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirty.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentId> {
        self.dirty.iter()
    }

    /// Empties the set, returning its former members
    pub fn drain(&mut self) -> HashSet<ComponentId> {
        std::mem::take(&mut self.dirty)
    }
}
