use std::any::Any;

use trellis_shared::{ComponentId, HasState, Value};

use crate::{rpc::client_calls::ClientCallQueue, session::ui_session::UiSession};

use super::error::TreeError;

/// Upcasting helper so stored components can be downcast to their concrete
/// type. Implemented for every `'static` type.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A server-side UI element whose [`SharedState`](trellis_shared::SharedState)
/// is mirrored by the client runtime.
pub trait Component: HasState + AsAny + Send + 'static {
    /// Client-side type the runtime instantiates for this component
    fn kind(&self) -> &'static str;

    /// Runs once per response cycle while the component is dirty, right
    /// before its state is diffed. `initial` is true until the first
    /// response carrying this component has been delivered.
    ///
    /// The hook may update its own state, queue client calls and mark other
    /// components dirty through `cx`. Attach or detach requests made from a
    /// hook are rejected and fail the response.
    fn before_client_response(&mut self, cx: &mut ComponentContext<'_>, initial: bool) {
        let _ = (cx, initial);
    }
}

type AttachSetup = Box<dyn FnOnce(&mut UiSession, ComponentId) -> Result<(), TreeError> + Send>;

/// A tree change requested through a [`ComponentContext`], applied once the
/// RPC handler that asked for it has returned
pub(crate) enum StructureRequest {
    Attach {
        parent: ComponentId,
        component: Box<dyn Component>,
        setup: Option<AttachSetup>,
    },
    Detach {
        component: ComponentId,
    },
}

/// What a component may touch outside itself while a finalize hook or an RPC
/// handler runs for it
pub struct ComponentContext<'a> {
    id: ComponentId,
    marks: &'a mut Vec<ComponentId>,
    structure: &'a mut Vec<StructureRequest>,
    client_calls: &'a mut ClientCallQueue,
}

impl<'a> ComponentContext<'a> {
    pub(crate) fn new(
        id: ComponentId,
        marks: &'a mut Vec<ComponentId>,
        structure: &'a mut Vec<StructureRequest>,
        client_calls: &'a mut ClientCallQueue,
    ) -> Self {
        Self {
            id,
            marks,
            structure,
            client_calls,
        }
    }

    /// The component this context was opened for
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Requests a resync of `component`. Applied once the hook returns;
    /// detached targets are ignored.
    pub fn mark_dirty(&mut self, component: ComponentId) {
        self.marks.push(component);
    }

    pub fn mark_self_dirty(&mut self) {
        self.marks.push(self.id);
    }

    /// Queues a call to this component's client-side peer, delivered with
    /// the next response
    pub fn call_client(&mut self, interface: &str, method: &str, args: Vec<Value>) {
        self.client_calls.push(self.id, interface, method, args);
    }

    /// Requests attaching `component` under `parent` once the RPC handler
    /// returns. Only honoured from RPC handlers.
    pub fn attach<C: Component>(&mut self, parent: ComponentId, component: C) {
        self.structure.push(StructureRequest::Attach {
            parent,
            component: Box::new(component),
            setup: None,
        });
    }

    /// Like `attach`, then runs `setup` with the new component's id, e.g. to
    /// register its RPC handlers
    pub fn attach_with<C, S>(&mut self, parent: ComponentId, component: C, setup: S)
    where
        C: Component,
        S: FnOnce(&mut UiSession, ComponentId) -> Result<(), TreeError> + Send + 'static,
    {
        self.structure.push(StructureRequest::Attach {
            parent,
            component: Box::new(component),
            setup: Some(Box::new(setup)),
        });
    }

    /// Requests detaching `component` with its subtree once the RPC handler
    /// returns. Only honoured from RPC handlers.
    pub fn detach(&mut self, component: ComponentId) {
        self.structure.push(StructureRequest::Detach { component });
    }
}
