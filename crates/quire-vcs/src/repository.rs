//! The serializing facade over a [`Vcs`] backend.

use std::sync::Arc;

use quire_types::{DocPath, RevisionLog, TreeEntry};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

use crate::error::VcsResult;
use crate::traits::Vcs;

/// A [`Vcs`] backend plus the readers-writer lock that serializes access to
/// its working tree.
///
/// The lock is fair: once a writer is queued, new readers wait behind it, so
/// no reader starts while a write chain holds or awaits the tree.
pub struct Repository {
    backend: Arc<dyn Vcs>,
    lock: RwLock<()>,
}

impl Repository {
    pub fn new(backend: Arc<dyn Vcs>) -> Self {
        Self { backend, lock: RwLock::new(()) }
    }

    /// Create the working tree and history if they do not exist yet.
    pub async fn init(&self) -> VcsResult<()> {
        let _guard = self.lock.write().await;
        self.backend.init().await
    }

    /// Acquire shared access for read-only primitives.
    pub async fn reader(&self) -> ReadSession<'_> {
        let guard = self.lock.read().await;
        ReadSession { _guard: guard, backend: self.backend.as_ref() }
    }

    /// Acquire exclusive access for a write chain.
    pub async fn writer(&self) -> WriteSession<'_> {
        let guard = self.lock.write().await;
        debug!("write session opened");
        WriteSession { _guard: guard, backend: self.backend.as_ref() }
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository").finish_non_exhaustive()
    }
}

/// Shared access to the read-only primitives.
pub struct ReadSession<'a> {
    _guard: RwLockReadGuard<'a, ()>,
    backend: &'a dyn Vcs,
}

impl ReadSession<'_> {
    pub async fn log(&self, doc: &DocPath) -> VcsResult<RevisionLog> {
        self.backend.log(doc).await
    }

    pub async fn show(&self, doc: &DocPath, revision: &str) -> VcsResult<Vec<u8>> {
        self.backend.show(doc, revision).await
    }

    pub async fn list(&self, dir: &str) -> VcsResult<Vec<TreeEntry>> {
        self.backend.list(dir).await
    }
}

/// Exclusive access to every primitive, held for a whole chain.
///
/// The chain helpers stop at the first failing step and return its error;
/// later steps never run, and the document's index entry and working file
/// are reset to head so nothing of the failed chain reaches a later commit.
pub struct WriteSession<'a> {
    _guard: RwLockWriteGuard<'a, ()>,
    backend: &'a dyn Vcs,
}

impl WriteSession<'_> {
    pub async fn write_file(&self, doc: &DocPath, bytes: &[u8]) -> VcsResult<()> {
        self.backend.write_file(doc, bytes).await
    }

    pub async fn stage(&self, doc: &DocPath) -> VcsResult<()> {
        self.backend.stage(doc).await
    }

    pub async fn commit(&self, doc: &DocPath, message: &str, author: &str) -> VcsResult<Option<String>> {
        self.backend.commit(doc, message, author).await
    }

    pub async fn revert(&self, doc: &DocPath, revision: &str) -> VcsResult<()> {
        self.backend.revert(doc, revision).await
    }

    pub async fn remove(&self, doc: &DocPath) -> VcsResult<()> {
        self.backend.remove(doc).await
    }

    pub async fn discard(&self, doc: &DocPath) -> VcsResult<()> {
        self.backend.discard(doc).await
    }

    pub async fn log(&self, doc: &DocPath) -> VcsResult<RevisionLog> {
        self.backend.log(doc).await
    }

    pub async fn show(&self, doc: &DocPath, revision: &str) -> VcsResult<Vec<u8>> {
        self.backend.show(doc, revision).await
    }

    /// write-file, stage, commit.
    pub async fn save(
        &self,
        doc: &DocPath,
        bytes: &[u8],
        message: &str,
        author: &str,
    ) -> VcsResult<Option<String>> {
        let result = async {
            self.write_file(doc, bytes).await?;
            self.stage(doc).await?;
            self.commit(doc, message, author).await
        }
        .await;
        self.settle(doc, result).await
    }

    /// revert, commit. The revert becomes a new head revision.
    pub async fn restore(
        &self,
        doc: &DocPath,
        revision: &str,
        message: &str,
        author: &str,
    ) -> VcsResult<Option<String>> {
        let result = async {
            self.revert(doc, revision).await?;
            self.commit(doc, message, author).await
        }
        .await;
        self.settle(doc, result).await
    }

    /// remove, commit.
    pub async fn delete(&self, doc: &DocPath, message: &str, author: &str) -> VcsResult<Option<String>> {
        let result = async {
            self.remove(doc).await?;
            self.commit(doc, message, author).await
        }
        .await;
        self.settle(doc, result).await
    }

    /// On a failed chain, put the document back to head before the lock is
    /// released. The chain's own error is returned either way.
    async fn settle<T>(&self, doc: &DocPath, result: VcsResult<T>) -> VcsResult<T> {
        if let Err(e) = &result {
            match self.discard(doc).await {
                Ok(()) => debug!(path = %doc, error = %e, "rolled back failed chain"),
                Err(cleanup) => warn!(path = %doc, error = %e, %cleanup, "rollback of failed chain failed"),
            }
        }
        result
    }
}
