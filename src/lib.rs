pub mod algorithms;
pub mod concurrency;
pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod protocol;
pub mod server;

pub use config::{EngineKind, ServerConfig};
pub use engine::build_engine;
pub use error::{Result, ServerError};
pub use server::Server;
