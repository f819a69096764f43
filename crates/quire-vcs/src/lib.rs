//! Version-control storage for Quire.
//!
//! Every document mutation is a VCS operation against a shared working tree
//! and every read is answered from the VCS history. This crate defines the
//! narrow primitive set the rest of Quire needs and the serialization
//! discipline around it.
//!
//! # Backends
//!
//! All backends implement the [`Vcs`] trait:
//!
//! - [`GitCli`] -- drives the `git` executable in a working tree
//! - [`MemoryVcs`] -- in-memory fake with the same staging and history rules
//!
//! # Serialization
//!
//! Staging is tree-wide, so two write chains touching different documents
//! can still corrupt each other. [`Repository`] owns a readers-writer lock
//! and only hands the primitives out through sessions:
//!
//! 1. A [`WriteSession`] holds the lock exclusively for a whole chain
//!    (write-file, stage, commit) and is the only way to mutate.
//! 2. A [`ReadSession`] shares the lock with other readers and never observes
//!    a half-finished chain.
//! 3. Chains stop at the first failing primitive and return its error; the
//!    lock is released when the session drops, on every exit path.

pub mod error;
pub mod git;
pub mod memory;
pub mod repository;
pub mod traits;

pub use error::{VcsError, VcsOp, VcsResult};
pub use git::GitCli;
pub use memory::MemoryVcs;
pub use repository::{ReadSession, Repository, WriteSession};
pub use traits::Vcs;
