pub mod callback_provider;
pub mod filter;
pub mod list_provider;
pub mod provider;
pub mod query;
pub mod window;
