pub mod api;
pub mod config;
pub mod handlers;
pub mod server;

pub use config::{load_config, ConfigError, ServerConfig};
pub use handlers::AppState;
pub use server::{build_router, start, ServerHandle};
