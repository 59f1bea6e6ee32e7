pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::ServerError;
pub use server::{build_router, start_server};
pub use state::ServerState;
