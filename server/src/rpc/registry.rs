use std::{any::type_name, collections::HashMap};

use serde::Deserialize;

use trellis_shared::{ComponentId, ServerRpcCall};

use crate::component::component::{Component, ComponentContext};

use super::error::RpcError;

pub(crate) type RpcHandler = Box<
    dyn FnMut(&mut (dyn Component + 'static), &mut ComponentContext<'_>, &ServerRpcCall) -> Result<(), RpcError>
        + Send,
>;

fn boxed_handler<F>(handler: F) -> RpcHandler
where
    F: FnMut(&mut (dyn Component + 'static), &mut ComponentContext<'_>, &ServerRpcCall) -> Result<(), RpcError>
        + Send
        + 'static,
{
    Box::new(handler)
}

/// Explicit `(component, interface) -> handler` table for client -> server
/// calls. Handlers are plain closures over the concrete component type.
#[derive(Default)]
pub struct RpcRegistry {
    handlers: HashMap<(ComponentId, String), RpcHandler>,
}

impl RpcRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for calls to `interface` on `component`, replacing
    /// any previous handler for the pair. Returns true if one was replaced.
    pub fn register<C, F>(&mut self, component: ComponentId, interface: &str, mut handler: F) -> bool
    where
        C: Component,
        F: FnMut(&mut C, &mut ComponentContext<'_>, &ServerRpcCall) -> Result<(), RpcError>
            + Send
            + 'static,
    {
        let wrapped = boxed_handler(move |target, cx, call| {
            let Some(typed) = target.as_any_mut().downcast_mut::<C>() else {
                return Err(RpcError::TargetTypeMismatch {
                    component: call.component,
                    expected: type_name::<C>(),
                });
            };
            handler(typed, cx, call)
        });

        self.handlers
            .insert((component, interface.to_string()), wrapped)
            .is_some()
    }

    pub fn unregister(&mut self, component: &ComponentId, interface: &str) -> bool {
        self.handlers
            .remove(&(*component, interface.to_string()))
            .is_some()
    }

    pub fn contains(&self, component: &ComponentId, interface: &str) -> bool {
        self.handlers
            .contains_key(&(*component, interface.to_string()))
    }

    /// Drops every handler of a component that left the tree
    pub fn remove_component(&mut self, component: &ComponentId) {
        self.handlers.retain(|(id, _), _| id != component);
    }

    pub(crate) fn handler_mut(
        &mut self,
        component: &ComponentId,
        interface: &str,
    ) -> Option<&mut RpcHandler> {
        self.handlers.get_mut(&(*component, interface.to_string()))
    }
}

/// Decodes argument `index` of an invocation into `T`
pub fn decode_arg<T>(call: &ServerRpcCall, index: usize) -> Result<T, RpcError>
where
    T: for<'de> Deserialize<'de>,
{
    let Some(value) = call.args.get(index) else {
        return Err(RpcError::InvalidArguments {
            method: call.method.clone(),
            index,
            message: format!("expected at least {} arguments, got {}", index + 1, call.args.len()),
        });
    };

    T::deserialize(value).map_err(|err| RpcError::InvalidArguments {
        method: call.method.clone(),
        index,
        message: err.to_string(),
    })
}
