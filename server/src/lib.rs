//! # Trellis Server
//! Keeps server-side component state synchronized with a client runtime:
//! tracks dirty components, runs their deferred finalize hooks, diffs their
//! state into responses, relays RPC calls both ways, and serializes requests
//! per session with transactions.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod component;
mod data;
mod dirty_tracker;
mod error;
mod finalizer;
mod rpc;
mod server;
mod session;
mod transaction;

pub use component::{
    component::{AsAny, Component, ComponentContext},
    error::TreeError,
    tree::ComponentTree,
};
pub use data::{
    callback_provider::CallbackDataProvider,
    filter::{ConfigurableFilterDataProvider, ConvertedFilterDataProvider, DataProviderExt},
    list_provider::{ItemFilter, ListDataProvider},
    provider::{
        DataChangeEvent, DataListeners, DataProvider, DataProviderListener, Item, Registration,
    },
    query::{ItemComparator, Query, QuerySortOrder, SortDirection},
    window::DataWindow,
};
pub use dirty_tracker::DirtyTracker;
pub use error::{ResponseError, TrellisServerError};
pub use finalizer::{FinalizeError, FinalizeOutcome};
pub use rpc::{
    client_calls::{CallCheckpoint, ClientCallQueue},
    error::RpcError,
    registry::decode_arg,
    sequence_guard::SequenceGuard,
};
pub use server::{RequestOutcome, Server, ServerConfig};
pub use session::ui_session::{InvocationReport, Response, UiSession};
pub use transaction::{
    error::{TransactionError, TransactionListenerFailure, TransactionPhase},
    listener::{ListenerError, TransactionListener},
    manager::TransactionManager,
    session_context::SessionContext,
    session_store::{InMemorySessionStore, SessionId, SessionStore},
    transaction::{Transaction, TransactionInfo, TransactionReport},
};

pub mod shared {
    pub use trellis_shared::*;
}
