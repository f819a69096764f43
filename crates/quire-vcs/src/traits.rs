//! The [`Vcs`] trait defining the storage primitive set.

use async_trait::async_trait;
use quire_types::{DocPath, RevisionLog, TreeEntry};

use crate::error::VcsResult;

/// A version-controlled working tree.
///
/// Each method maps to one VCS primitive. Implementations are not required
/// to serialize anything themselves: callers go through
/// [`Repository`](crate::Repository), which runs whole chains under its lock.
///
/// Implementations must uphold:
/// - `commit` with nothing staged for the document succeeds without
///   creating a revision, and never records other documents' changes.
/// - `log` is newest first and includes the commit that deleted a document.
/// - `show` with an empty revision reads the head; a missing path or
///   revision is [`VcsError::NotFound`](crate::VcsError::NotFound), never a
///   backend failure.
/// - `revert` stages the restored content but does not commit it.
#[async_trait]
pub trait Vcs: Send + Sync {
    /// Make sure the working tree and its history exist.
    async fn init(&self) -> VcsResult<()>;

    /// Replace a document's working file, creating directories as needed.
    async fn write_file(&self, doc: &DocPath, bytes: &[u8]) -> VcsResult<()>;

    /// Stage the document's current working content (or its removal).
    ///
    /// Fails when the file does not exist and nothing about it is tracked.
    async fn stage(&self, doc: &DocPath) -> VcsResult<()>;

    /// Record the document's staged change as a new revision.
    ///
    /// Only `doc` is committed; anything else staged stays out of the
    /// revision. Returns the new revision id, or `None` when nothing was
    /// staged for `doc`.
    async fn commit(&self, doc: &DocPath, message: &str, author: &str) -> VcsResult<Option<String>>;

    /// Revisions that touched the document, newest first.
    async fn log(&self, doc: &DocPath) -> VcsResult<RevisionLog>;

    /// Document bytes as of `revision`; empty revision means head.
    async fn show(&self, doc: &DocPath, revision: &str) -> VcsResult<Vec<u8>>;

    /// Restore and stage the working file as of `revision`.
    async fn revert(&self, doc: &DocPath, revision: &str) -> VcsResult<()>;

    /// Delete the working file and stage the deletion.
    async fn remove(&self, doc: &DocPath) -> VcsResult<()>;

    /// Reset the document's index entry and working file to head. A
    /// document absent from head is unstaged and its working file removed.
    async fn discard(&self, doc: &DocPath) -> VcsResult<()>;

    /// Entries of a working-tree directory (`""` is the root), sorted with
    /// directories first. A missing directory lists as empty.
    async fn list(&self, dir: &str) -> VcsResult<Vec<TreeEntry>>;
}
