//! HTTP server for Quire.
//!
//! A single fallback handler serves every path: the path names a document
//! and the query string or form body selects what to do with it.

pub mod config;
pub mod cookie;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::AppState;
pub use router::build_router;
pub use server::QuireServer;
