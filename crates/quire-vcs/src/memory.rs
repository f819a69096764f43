//! In-memory VCS for tests and embedding.
//!
//! [`MemoryVcs`] models a working tree, a staging index and a linear commit
//! history with the same rules the git backend follows: staging snapshots the
//! working file, a commit records only its own document and is a no-op when
//! that document is unchanged, a document's log lists the commits that
//! changed it, and deletions stay in the log.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quire_types::{DocPath, Revision, RevisionLog, TreeEntry, DOCUMENT_EXTENSION};

use crate::error::{VcsError, VcsOp, VcsResult};
use crate::traits::Vcs;

type Tree = BTreeMap<String, Vec<u8>>;

#[derive(Debug)]
struct Commit {
    id: String,
    message: String,
    author: String,
    time: DateTime<Utc>,
    tree: Tree,
    touched: BTreeSet<String>,
}

impl Commit {
    fn revision(&self) -> Revision {
        Revision {
            id: self.id.clone(),
            message: self.message.clone(),
            author: self.author.clone(),
            time: self.time,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    working: Tree,
    index: Tree,
    /// Oldest first.
    commits: Vec<Commit>,
    failures: HashSet<VcsOp>,
}

impl State {
    fn head_tree(&self) -> Option<&Tree> {
        self.commits.last().map(|c| &c.tree)
    }

    fn find_commit(&self, revision: &str) -> Option<&Commit> {
        if revision.is_empty() {
            return self.commits.last();
        }
        self.commits
            .iter()
            .rev()
            .find(|c| c.id == revision || (revision.len() >= 4 && c.id.starts_with(revision)))
    }

    fn check(&self, op: VcsOp, path: &str) -> VcsResult<()> {
        if self.failures.contains(&op) {
            return Err(VcsError::backend(op, path, "injected failure"));
        }
        Ok(())
    }
}

/// An in-memory implementation of [`Vcs`].
///
/// All data lives behind a `Mutex` and is lost when the value is dropped.
/// Failures can be injected per primitive with [`MemoryVcs::fail_on`].
#[derive(Debug, Default)]
pub struct MemoryVcs {
    state: Mutex<State>,
}

impl MemoryVcs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call of `op` fail with a backend error.
    pub fn fail_on(&self, op: VcsOp) {
        if let Ok(mut state) = self.state.lock() {
            state.failures.insert(op);
        }
    }

    /// Stop injecting failures.
    pub fn clear_failures(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.failures.clear();
        }
    }

    /// Total number of commits across all documents.
    pub fn commit_count(&self) -> usize {
        self.state.lock().map(|s| s.commits.len()).unwrap_or(0)
    }

    /// Current working-tree content of a document.
    pub fn working_file(&self, doc: &DocPath) -> Option<Vec<u8>> {
        self.state.lock().ok()?.working.get(&doc.file_name()).cloned()
    }

    /// Whether the index differs from the head tree.
    pub fn has_staged_changes(&self) -> bool {
        self.state
            .lock()
            .map(|s| s.head_tree().map_or(!s.index.is_empty(), |head| *head != s.index))
            .unwrap_or(false)
    }

    fn lock(&self, op: VcsOp, path: &str) -> VcsResult<MutexGuard<'_, State>> {
        let state = self
            .state
            .lock()
            .map_err(|e| VcsError::backend(op, path, format!("lock poisoned: {e}")))?;
        state.check(op, path)?;
        Ok(state)
    }
}

#[async_trait]
impl Vcs for MemoryVcs {
    async fn init(&self) -> VcsResult<()> {
        self.lock(VcsOp::Init, "").map(|_| ())
    }

    async fn write_file(&self, doc: &DocPath, bytes: &[u8]) -> VcsResult<()> {
        let file = doc.file_name();
        let mut state = self.lock(VcsOp::Write, &file)?;
        state.working.insert(file, bytes.to_vec());
        Ok(())
    }

    async fn stage(&self, doc: &DocPath) -> VcsResult<()> {
        let file = doc.file_name();
        let mut state = self.lock(VcsOp::Stage, &file)?;
        if let Some(bytes) = state.working.get(&file).cloned() {
            state.index.insert(file, bytes);
        } else if state.index.remove(&file).is_none() {
            return Err(VcsError::backend(VcsOp::Stage, file, "pathspec did not match any files"));
        }
        Ok(())
    }

    async fn commit(&self, doc: &DocPath, message: &str, author: &str) -> VcsResult<Option<String>> {
        let file = doc.file_name();
        let mut state = self.lock(VcsOp::Commit, &file)?;
        let mut tree = state.head_tree().cloned().unwrap_or_default();
        let staged = state.index.get(&file).cloned();
        if tree.get(&file) == staged.as_ref() {
            return Ok(None);
        }
        match staged {
            Some(bytes) => tree.insert(file.clone(), bytes),
            None => tree.remove(&file),
        };

        let seq = state.commits.len() as u64 + 1;
        let id = format!(
            "{seq:08x}{:032x}",
            u128::from(seq).wrapping_mul(0x9e37_79b9_7f4a_7c15_f39c_c060_5ced_c834)
        );
        let commit = Commit {
            id: id.clone(),
            message: message.to_string(),
            author: author.to_string(),
            time: Utc::now(),
            tree,
            touched: BTreeSet::from([file]),
        };
        state.commits.push(commit);
        Ok(Some(id))
    }

    async fn log(&self, doc: &DocPath) -> VcsResult<RevisionLog> {
        let file = doc.file_name();
        let state = self.lock(VcsOp::Log, &file)?;
        let revisions = state
            .commits
            .iter()
            .rev()
            .filter(|c| c.touched.contains(&file))
            .map(Commit::revision)
            .collect();
        Ok(RevisionLog::new(revisions))
    }

    async fn show(&self, doc: &DocPath, revision: &str) -> VcsResult<Vec<u8>> {
        let file = doc.file_name();
        let state = self.lock(VcsOp::Show, &file)?;
        state
            .find_commit(revision)
            .and_then(|c| c.tree.get(&file))
            .cloned()
            .ok_or_else(|| VcsError::not_found(file, revision))
    }

    async fn revert(&self, doc: &DocPath, revision: &str) -> VcsResult<()> {
        let file = doc.file_name();
        let mut state = self.lock(VcsOp::Revert, &file)?;
        let bytes = state
            .find_commit(revision)
            .and_then(|c| c.tree.get(&file))
            .cloned()
            .ok_or_else(|| {
                VcsError::backend(VcsOp::Revert, &file, format!("{revision:?} does not contain the path"))
            })?;
        state.working.insert(file.clone(), bytes.clone());
        state.index.insert(file, bytes);
        Ok(())
    }

    async fn remove(&self, doc: &DocPath) -> VcsResult<()> {
        let file = doc.file_name();
        let mut state = self.lock(VcsOp::Remove, &file)?;
        let tracked = state.index.remove(&file).is_some();
        if !tracked {
            return Err(VcsError::backend(VcsOp::Remove, file, "pathspec did not match any files"));
        }
        state.working.remove(&file);
        Ok(())
    }

    async fn discard(&self, doc: &DocPath) -> VcsResult<()> {
        let file = doc.file_name();
        let mut state = self.lock(VcsOp::Discard, &file)?;
        match state.head_tree().and_then(|tree| tree.get(&file)).cloned() {
            Some(bytes) => {
                state.index.insert(file.clone(), bytes.clone());
                state.working.insert(file, bytes);
            }
            None => {
                state.index.remove(&file);
                state.working.remove(&file);
            }
        }
        Ok(())
    }

    async fn list(&self, dir: &str) -> VcsResult<Vec<TreeEntry>> {
        let state = self.lock(VcsOp::List, dir)?;
        let prefix = if dir.is_empty() { String::new() } else { format!("{dir}/") };
        let suffix = format!(".{DOCUMENT_EXTENSION}");
        let entries: BTreeSet<TreeEntry> = state
            .working
            .keys()
            .filter_map(|file| file.strip_prefix(&prefix))
            .filter_map(|rest| match rest.split_once('/') {
                Some((subdir, _)) => Some(TreeEntry::directory(subdir)),
                None => rest.strip_suffix(&suffix).map(TreeEntry::document),
            })
            .collect();
        Ok(entries.into_iter().collect())
    }
}
