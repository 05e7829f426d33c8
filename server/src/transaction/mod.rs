pub mod error;
pub mod listener;
pub mod manager;
pub mod session_context;
pub mod session_store;
pub mod transaction;
