pub mod capabilities;
pub mod error;
pub mod shared_state;
