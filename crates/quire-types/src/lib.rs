//! Foundation types for Quire.
//!
//! Quire stores every document as a file in a git working tree and uses the
//! commit log as the document's history. This crate holds the vocabulary the
//! other crates share; it performs no I/O.
//!
//! # Key Types
//!
//! - [`DocPath`] -- canonical document identifier and its working-tree file mapping
//! - [`Revision`] -- one commit touching a document
//! - [`RevisionLog`] -- the newest-first revision sequence of a document
//! - [`Node`] -- request-scoped view of one document at one point in history
//! - [`DirEntry`] / [`TreeEntry`] -- navigation listing entries
//! - [`parse_flag`] -- boolean-like request parameter parsing

pub mod error;
pub mod flag;
pub mod node;
pub mod path;
pub mod revision;

pub use error::{TypeError, TypeResult};
pub use flag::{parse_flag, TRUTHY_VALUES};
pub use node::{DirEntry, EntryKind, Node, TreeEntry};
pub use path::{DocPath, DOCUMENT_EXTENSION, INDEX_DOCUMENT};
pub use revision::{validate_revision, Revision, RevisionLog};
