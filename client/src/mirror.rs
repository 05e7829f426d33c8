use std::collections::{BTreeMap, HashMap};

use trellis_shared::{ComponentId, HierarchyChange, StateChange, Value};

use crate::error::TrellisClientError;

/// Client-side copy of one server component
#[derive(Clone, Debug, PartialEq)]
pub struct MirroredComponent {
    pub kind: String,
    pub parent: Option<ComponentId>,
    pub children: Vec<ComponentId>,
    pub state: BTreeMap<String, Value>,
    pub version: u64,
}

/// The component tree as the client last received it
#[derive(Clone, Debug, Default)]
pub struct StateMirror {
    components: HashMap<ComponentId, MirroredComponent>,
    root: Option<ComponentId>,
}

impl StateMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> Option<ComponentId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn get(&self, id: &ComponentId) -> Option<&MirroredComponent> {
        self.components.get(id)
    }

    pub fn field(&self, id: &ComponentId, name: &str) -> Option<&Value> {
        self.components.get(id)?.state.get(name)
    }

    pub fn children(&self, id: &ComponentId) -> &[ComponentId] {
        self.components
            .get(id)
            .map(|component| component.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn clear(&mut self) {
        self.components.clear();
        self.root = None;
    }

    pub(crate) fn apply_hierarchy(&mut self, change: &HierarchyChange) -> Result<(), TrellisClientError> {
        match change {
            HierarchyChange::Attached { id, parent, kind } => {
                if let Some(parent) = parent {
                    let Some(parent_component) = self.components.get_mut(parent) else {
                        return Err(TrellisClientError::ParentNotFound {
                            component: *id,
                            parent: *parent,
                        });
                    };
                    parent_component.children.push(*id);
                } else {
                    self.root = Some(*id);
                }
                self.components.insert(
                    *id,
                    MirroredComponent {
                        kind: kind.clone(),
                        parent: *parent,
                        children: Vec::new(),
                        state: BTreeMap::new(),
                        version: 0,
                    },
                );
            }
            HierarchyChange::Detached { id } => {
                let Some(component) = self.components.get(id) else {
                    return Err(TrellisClientError::UnknownComponent { component: *id });
                };
                if let Some(parent) = component.parent {
                    if let Some(parent_component) = self.components.get_mut(&parent) {
                        parent_component.children.retain(|child| child != id);
                    }
                }
                let mut stack = vec![*id];
                while let Some(next) = stack.pop() {
                    if let Some(removed) = self.components.remove(&next) {
                        stack.extend(removed.children);
                    }
                }
            }
        }
        Ok(())
    }

    /// Merges a diff into the mirrored state. A null value removes the field.
    pub(crate) fn apply_change(&mut self, change: &StateChange) -> Result<(), TrellisClientError> {
        let Some(component) = self.components.get_mut(&change.component) else {
            return Err(TrellisClientError::UnknownComponent {
                component: change.component,
            });
        };
        for (name, value) in &change.diff {
            if value.is_null() {
                component.state.remove(name);
            } else {
                component.state.insert(name.clone(), value.clone());
            }
        }
        component.version = change.version;
        Ok(())
    }
}
