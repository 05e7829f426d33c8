mod server;
pub use server::{RequestOutcome, Server};

mod server_config;
pub use server_config::ServerConfig;
