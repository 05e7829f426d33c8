pub mod client_calls;
pub mod error;
pub mod registry;
pub mod sequence_guard;
