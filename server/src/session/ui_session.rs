use log::{debug, info, warn};

use trellis_shared::{
    encode_server_message, ClientMessage, ComponentId, HierarchyChange, SequenceNumber,
    ServerMessage, ServerRpcCall, StateChange, Value,
};

use crate::{
    component::{
        component::{Component, ComponentContext, StructureRequest},
        error::TreeError,
        tree::ComponentTree,
    },
    dirty_tracker::DirtyTracker,
    error::ResponseError,
    finalizer::{self, FinalizeOutcome},
    rpc::{
        client_calls::ClientCallQueue, error::RpcError, registry::RpcRegistry,
        sequence_guard::SequenceGuard,
    },
    ServerConfig,
};

/// One encoded response, ready for the transport
#[derive(Debug)]
pub struct Response {
    pub message: ServerMessage,
    pub payload: Vec<u8>,
}

/// What became of the invocations of one client message
#[derive(Debug, Default)]
pub struct InvocationReport {
    pub applied: usize,
    pub failures: Vec<RpcError>,
    /// The client reported a response sequence the server did not send last,
    /// so the next response rebuilds the client's tree from scratch
    pub resynchronized: bool,
}

impl InvocationReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Everything that is synchronized for one session: its component tree,
/// dirty set, RPC registry and pending client calls.
///
/// All access happens inside that session's transaction, so a `UiSession`
/// is single-writer and needs no locking of its own.
pub struct UiSession {
    config: ServerConfig,
    tree: ComponentTree,
    dirty: DirtyTracker,
    client_calls: ClientCallQueue,
    registry: RpcRegistry,
    sequence_guard: SequenceGuard,
    hierarchy: Vec<HierarchyChange>,
    last_response: Option<SequenceNumber>,
    resync_pending: bool,
}

impl UiSession {
    /// Creates a session around its root component. The root goes out with
    /// the first response.
    pub fn new<C: Component>(root: C, config: &ServerConfig) -> Self {
        let kind = root.kind();
        let tree = ComponentTree::new(Box::new(root));
        let root_id = tree.root();

        let mut dirty = DirtyTracker::new();
        dirty.mark(root_id);

        Self {
            config: config.clone(),
            tree,
            dirty,
            client_calls: ClientCallQueue::new(),
            registry: RpcRegistry::new(),
            sequence_guard: SequenceGuard::new(config.allow_duplicate_sequence),
            hierarchy: vec![HierarchyChange::Attached {
                id: root_id,
                parent: None,
                kind: kind.to_string(),
            }],
            last_response: None,
            resync_pending: false,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn root(&self) -> ComponentId {
        self.tree.root()
    }

    pub fn tree(&self) -> &ComponentTree {
        &self.tree
    }

    /// Sequence of the last response that was successfully written
    pub fn last_response(&self) -> Option<SequenceNumber> {
        self.last_response
    }

    // Structure

    /// Attaches `component` under `parent`. The new component is dirty so
    /// that its full state goes out with the next response.
    pub fn attach<C: Component>(
        &mut self,
        parent: ComponentId,
        component: C,
    ) -> Result<ComponentId, TreeError> {
        self.attach_boxed(parent, Box::new(component))
    }

    pub fn attach_boxed(
        &mut self,
        parent: ComponentId,
        component: Box<dyn Component>,
    ) -> Result<ComponentId, TreeError> {
        let kind = component.kind();
        let id = self.tree.attach(&parent, component)?;

        self.dirty.mark(id);
        self.hierarchy.push(HierarchyChange::Attached {
            id,
            parent: Some(parent),
            kind: kind.to_string(),
        });
        debug!("UiSession: attached {} {} under {}", kind, id, parent);

        Ok(id)
    }

    /// Detaches `id` with its subtree, releasing their dirty flags, queued
    /// client calls and RPC handlers
    pub fn detach(&mut self, id: ComponentId) -> Result<(), TreeError> {
        let removed = self.tree.detach(&id)?;
        for removed_id in &removed {
            self.dirty.clear(removed_id);
            self.client_calls.remove_component(removed_id);
            self.registry.remove_component(removed_id);
        }

        self.hierarchy.push(HierarchyChange::Detached { id });
        debug!("UiSession: detached {} ({} components)", id, removed.len());

        Ok(())
    }

    // Components

    pub fn component<C: Component>(&self, id: ComponentId) -> Option<&C> {
        self.tree.get(&id)?.as_any().downcast_ref::<C>()
    }

    /// Mutable access to a component. Changes reach the client only after
    /// the component is marked dirty.
    pub fn component_mut<C: Component>(&mut self, id: ComponentId) -> Option<&mut C> {
        self.tree.get_mut(&id)?.as_any_mut().downcast_mut::<C>()
    }

    // Dirty tracking

    /// Marks an attached component for resync. Returns false, doing nothing,
    /// if the component is not attached.
    pub fn mark_dirty(&mut self, id: ComponentId) -> bool {
        if !self.tree.contains(&id) {
            debug!("UiSession: ignoring mark_dirty on detached {}", id);
            return false;
        }
        self.dirty.mark(id);
        true
    }

    pub fn clear_dirty(&mut self, id: ComponentId) -> bool {
        self.dirty.clear(&id)
    }

    pub fn is_dirty(&self, id: ComponentId) -> bool {
        self.dirty.is_dirty(&id)
    }

    /// Dirty components in tree pre-order
    pub fn dirty_components(&self) -> Vec<ComponentId> {
        self.tree
            .pre_order()
            .into_iter()
            .filter(|id| self.dirty.is_dirty(id))
            .collect()
    }

    // RPC

    /// Registers the handler for client calls to `interface` on `id`
    pub fn register_rpc<C, F>(
        &mut self,
        id: ComponentId,
        interface: &str,
        handler: F,
    ) -> Result<(), TreeError>
    where
        C: Component,
        F: FnMut(&mut C, &mut ComponentContext<'_>, &ServerRpcCall) -> Result<(), RpcError>
            + Send
            + 'static,
    {
        if !self.tree.contains(&id) {
            return Err(TreeError::NotAttached { component: id });
        }
        if self.registry.register::<C, F>(id, interface, handler) {
            debug!("UiSession: replaced RPC handler {} on {}", interface, id);
        }
        Ok(())
    }

    pub fn unregister_rpc(&mut self, id: ComponentId, interface: &str) -> bool {
        self.registry.unregister(&id, interface)
    }

    /// Queues a call to the client-side peer of `id`
    pub fn call_client(
        &mut self,
        id: ComponentId,
        interface: &str,
        method: &str,
        args: Vec<Value>,
    ) -> Result<(), TreeError> {
        if !self.tree.contains(&id) {
            return Err(TreeError::NotAttached { component: id });
        }
        self.client_calls.push(id, interface, method, args);
        Ok(())
    }

    /// Delivers one client invocation. Stale invocations are dropped before
    /// anything is touched.
    pub fn handle_invocation(&mut self, call: ServerRpcCall) -> Result<(), RpcError> {
        self.sequence_guard.check(&call.sequence)?;
        self.sequence_guard.record(call.sequence);

        let unknown_target = || RpcError::UnknownRpcTarget {
            component: call.component,
            interface: call.interface.clone(),
        };
        let Some(handler) = self.registry.handler_mut(&call.component, &call.interface) else {
            return Err(unknown_target());
        };
        let Some(component) = self.tree.get_mut(&call.component) else {
            return Err(unknown_target());
        };

        let mut marks = Vec::new();
        let mut structure = Vec::new();
        let result = {
            let mut cx = ComponentContext::new(
                call.component,
                &mut marks,
                &mut structure,
                &mut self.client_calls,
            );
            handler(component, &mut cx, &call)
        };

        for target in marks {
            self.mark_dirty(target);
        }

        result?;
        self.apply_structure(call.component, structure)
    }

    /// Applies tree changes requested by the handler of `requester`, in
    /// request order. Stops at the first change that fails.
    fn apply_structure(
        &mut self,
        requester: ComponentId,
        requests: Vec<StructureRequest>,
    ) -> Result<(), RpcError> {
        let rejected = |error: TreeError| RpcError::StructureRejected {
            component: requester,
            error,
        };

        for request in requests {
            match request {
                StructureRequest::Attach {
                    parent,
                    component,
                    setup,
                } => {
                    let id = self.attach_boxed(parent, component).map_err(rejected)?;
                    if let Some(setup) = setup {
                        setup(self, id).map_err(rejected)?;
                    }
                }
                StructureRequest::Detach { component } => {
                    self.detach(component).map_err(rejected)?;
                }
            }
        }

        Ok(())
    }

    /// Applies every invocation of a client message. A failing invocation is
    /// logged and skipped; it never stops the ones after it.
    pub fn handle_client_message(&mut self, message: ClientMessage) -> InvocationReport {
        let mut report = InvocationReport::default();

        if let Some(seen) = message.last_response {
            if Some(seen) != self.last_response {
                warn!(
                    "UiSession: client applied response {} but last sent was {:?}, resynchronizing",
                    seen.value(),
                    self.last_response.map(|s| s.value())
                );
                self.request_resync();
                report.resynchronized = true;
            }
        }

        for call in message.invocations {
            match self.handle_invocation(call) {
                Ok(()) => report.applied += 1,
                Err(err) => {
                    match &err {
                        RpcError::StaleSequence { .. } => debug!("UiSession: {}", err),
                        _ => warn!("UiSession: {}", err),
                    }
                    report.failures.push(err);
                }
            }
        }

        report
    }

    /// Makes the next response rebuild the client's tree and resend every
    /// component in full
    pub fn request_resync(&mut self) {
        self.hierarchy.clear();
        for id in self.tree.pre_order() {
            let parent = self.tree.parent(&id);
            if let Some(component) = self.tree.get_mut(&id) {
                component.state_mut().mark_for_full_resend();
                self.hierarchy.push(HierarchyChange::Attached {
                    id,
                    parent,
                    kind: component.kind().to_string(),
                });
            }
            self.dirty.mark(id);
        }
        self.resync_pending = true;
    }

    // Response

    /// Runs the finalize cascade, then diffs and encodes everything pending
    /// into one response.
    ///
    /// The response is all or nothing: state snapshots, queued calls and the
    /// response sequence are only committed once encoding succeeded. Calls
    /// queued by hooks of a failed cycle are dropped, since the hooks run
    /// again with the next cycle.
    pub fn write_response(&mut self) -> Result<Response, ResponseError> {
        let checkpoint = self.client_calls.checkpoint();
        let outcome = match finalizer::finalize(
            &mut self.tree,
            &mut self.dirty,
            &mut self.client_calls,
            self.config.max_finalize_passes,
        ) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.client_calls.rollback(checkpoint);
                return Err(err.into());
            }
        };

        let sequence = self
            .last_response
            .map(|last| last.next())
            .unwrap_or_default();
        let message = ServerMessage {
            sequence,
            resynchronize: self.resync_pending,
            hierarchy: self.hierarchy.clone(),
            changes: self.collect_changes(&outcome),
            calls: self.client_calls.pending_in_order(&self.tree.pre_order()),
        };

        match encode_server_message(&message, self.config.max_response_bytes) {
            Ok(payload) => {
                for id in &outcome.finalized {
                    if let Some(component) = self.tree.get_mut(id) {
                        component.state_mut().commit_sent();
                    }
                }
                self.client_calls.clear();
                self.hierarchy.clear();
                self.resync_pending = false;
                self.last_response = Some(sequence);

                info!(
                    "UiSession: response {} with {} changes, {} calls, {} finalize hooks",
                    sequence.value(),
                    message.changes.len(),
                    message.calls.len(),
                    outcome.invocations
                );
                Ok(Response { message, payload })
            }
            Err(err) => {
                warn!("UiSession: response {} not sent: {}", sequence.value(), err);
                for id in outcome.finalized {
                    self.dirty.mark(id);
                }
                self.client_calls.rollback(checkpoint);
                Err(err.into())
            }
        }
    }

    fn collect_changes(&self, outcome: &FinalizeOutcome) -> Vec<StateChange> {
        outcome
            .finalized
            .iter()
            .filter_map(|id| {
                let state = self.tree.get(id)?.state();
                let diff = state.pending_diff()?;
                Some(StateChange {
                    component: *id,
                    version: state.version() + 1,
                    diff,
                })
            })
            .collect()
    }
}
