pub mod component;
pub mod error;
pub mod tree;
