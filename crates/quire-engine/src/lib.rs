//! The version-controlled document engine.
//!
//! A request names a document by URL path and carries form parameters. The
//! engine decides which single operation the request represents
//! ([`Mode::resolve`]), runs it against the [`Repository`](quire_vcs::Repository)
//! as one serialized chain, and assembles the resulting
//! [`Node`](quire_types::Node) for presentation.

pub mod engine;
pub mod error;
pub mod mode;
pub mod request;

pub use engine::{Engine, EngineConfig, Outcome};
pub use error::{EngineError, EngineResult};
pub use mode::{is_ignored_path, Mode, FAVICON_PATH};
pub use request::{Params, WikiRequest};
