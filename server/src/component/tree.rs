use std::collections::HashMap;

use trellis_shared::ComponentId;

use super::{component::Component, error::TreeError};

struct Node {
    component: Box<dyn Component>,
    parent: Option<ComponentId>,
    children: Vec<ComponentId>,
}

/// Parent-owns-children tree of the components of one session. The tree is
/// the only record of structure; a component exists exactly as long as it is
/// attached.
pub struct ComponentTree {
    nodes: HashMap<ComponentId, Node>,
    root: ComponentId,
    next_id: u64,
}

impl ComponentTree {
    pub fn new(root: Box<dyn Component>) -> Self {
        let root_id = ComponentId::new(1);
        let mut nodes = HashMap::new();
        nodes.insert(
            root_id,
            Node {
                component: root,
                parent: None,
                children: Vec::new(),
            },
        );

        Self {
            nodes,
            root: root_id,
            next_id: 2,
        }
    }

    pub fn root(&self) -> ComponentId {
        self.root
    }

    pub fn contains(&self, id: &ComponentId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: &ComponentId) -> Option<&(dyn Component + 'static)> {
        self.nodes.get(id).map(|node| node.component.as_ref())
    }

    pub fn get_mut(&mut self, id: &ComponentId) -> Option<&mut (dyn Component + 'static)> {
        self.nodes.get_mut(id).map(|node| node.component.as_mut())
    }

    pub fn parent(&self, id: &ComponentId) -> Option<ComponentId> {
        self.nodes.get(id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: &ComponentId) -> &[ComponentId] {
        self.nodes
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Adds `component` as the last child of `parent` and returns its new id
    pub fn attach(
        &mut self,
        parent: &ComponentId,
        component: Box<dyn Component>,
    ) -> Result<ComponentId, TreeError> {
        let Some(parent_node) = self.nodes.get_mut(parent) else {
            return Err(TreeError::ParentNotFound { parent: *parent });
        };

        let id = ComponentId::new(self.next_id);
        self.next_id += 1;

        parent_node.children.push(id);
        self.nodes.insert(
            id,
            Node {
                component,
                parent: Some(*parent),
                children: Vec::new(),
            },
        );

        Ok(id)
    }

    /// Removes `id` and its whole subtree. Returns the removed ids in
    /// pre-order.
    pub fn detach(&mut self, id: &ComponentId) -> Result<Vec<ComponentId>, TreeError> {
        if *id == self.root {
            return Err(TreeError::CannotDetachRoot { component: *id });
        }
        let Some(node) = self.nodes.get(id) else {
            return Err(TreeError::NotAttached { component: *id });
        };

        if let Some(parent) = node.parent {
            if let Some(parent_node) = self.nodes.get_mut(&parent) {
                parent_node.children.retain(|child| child != id);
            }
        }

        let removed = self.subtree_pre_order(id);
        for removed_id in &removed {
            self.nodes.remove(removed_id);
        }

        Ok(removed)
    }

    /// Every attached id, parents before children, siblings in attach order
    pub fn pre_order(&self) -> Vec<ComponentId> {
        self.subtree_pre_order(&self.root)
    }

    /// Visits `id` and then all of its descendants in pre-order
    pub fn for_each_descendant<F>(&self, id: &ComponentId, mut visit: F)
    where
        F: FnMut(ComponentId, &dyn Component),
    {
        for descendant in self.subtree_pre_order(id) {
            if let Some(node) = self.nodes.get(&descendant) {
                visit(descendant, node.component.as_ref());
            }
        }
    }

    fn subtree_pre_order(&self, id: &ComponentId) -> Vec<ComponentId> {
        let mut order = Vec::new();
        if !self.nodes.contains_key(id) {
            return order;
        }

        let mut stack = vec![*id];
        while let Some(next) = stack.pop() {
            order.push(next);
            if let Some(node) = self.nodes.get(&next) {
                for child in node.children.iter().rev() {
                    stack.push(*child);
                }
            }
        }

        order
    }
}
