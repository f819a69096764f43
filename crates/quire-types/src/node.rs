//! The request-scoped document aggregate and navigation entries.

use serde::Serialize;

use crate::path::DocPath;
use crate::revision::RevisionLog;

/// Kind of an entry in a working-tree directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum EntryKind {
    Directory,
    Document,
}

/// One entry of a working-tree directory, as reported by a backend.
///
/// Documents are named without their extension.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TreeEntry {
    pub kind: EntryKind,
    pub name: String,
}

impl TreeEntry {
    pub fn document(name: impl Into<String>) -> Self {
        Self { kind: EntryKind::Document, name: name.into() }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self { kind: EntryKind::Directory, name: name.into() }
    }
}

/// A navigation entry shown alongside a document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DirEntry {
    pub name: String,
    /// URL path without the base path; directories end in `/`.
    pub path: String,
    pub kind: EntryKind,
    /// Nesting level of the listed directory, 0 for the root.
    pub depth: usize,
    /// Whether the entry lies on the current request path.
    pub active: bool,
}

/// One document at one point in its history, assembled for a single request.
///
/// Built fresh per request, populated by exactly one operation, then handed
/// to presentation. Never shared and never persisted.
#[derive(Clone, Debug, Serialize)]
pub struct Node {
    pub doc: DocPath,
    pub title: String,
    /// URL prefix the wiki is mounted under, without a trailing `/`.
    pub basepath: String,
    /// Raw document bytes; empty means the document does not exist.
    pub bytes: Vec<u8>,
    /// Editable text, set in edit mode only.
    pub content: String,
    /// Rendered markup, set in view mode only.
    pub markup: String,
    /// Resolved revision id; empty means head.
    pub revision: String,
    pub log: RevisionLog,
    pub dirs: Vec<DirEntry>,
    pub author: String,
    /// Prefilled changelog message for the edit form.
    pub changelog: String,
    pub edit: bool,
    pub show_revisions: bool,
    pub ask_delete: bool,
}

impl Node {
    pub fn new(doc: DocPath, site_title: &str, basepath: &str) -> Self {
        Self {
            title: format!("{doc} – {site_title}"),
            basepath: basepath.trim_end_matches('/').to_string(),
            doc,
            bytes: Vec::new(),
            content: String::new(),
            markup: String::new(),
            revision: String::new(),
            log: RevisionLog::default(),
            dirs: Vec::new(),
            author: String::new(),
            changelog: String::new(),
            edit: false,
            show_revisions: false,
            ask_delete: false,
        }
    }

    /// True when the log is non-empty and the resolved revision is its head.
    pub fn is_head(&self) -> bool {
        self.log.is_head(&self.revision)
    }

    /// True when an explicit, non-head revision is being displayed.
    pub fn is_past_revision(&self) -> bool {
        !self.revision.is_empty() && !self.is_head()
    }

    /// True when there is nothing stored for the resolved revision.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Absolute URL of this document, base path included.
    pub fn url(&self) -> String {
        format!("{}{}", self.basepath, self.doc.url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::revision::Revision;
    use chrono::Utc;

    fn node() -> Node {
        Node::new(DocPath::from_url("/foo").unwrap(), "Wiki", "/wiki/")
    }

    fn log_of(ids: &[&str]) -> RevisionLog {
        RevisionLog::new(
            ids.iter()
                .map(|id| Revision {
                    id: id.to_string(),
                    message: "m".into(),
                    author: "a".into(),
                    time: Utc::now(),
                })
                .collect(),
        )
    }

    #[test]
    fn new_node_defaults() {
        let n = node();
        assert_eq!(n.title, "foo – Wiki");
        assert_eq!(n.basepath, "/wiki");
        assert_eq!(n.url(), "/wiki/foo");
        assert!(n.is_empty());
        assert!(!n.is_head());
        assert!(!n.is_past_revision());
    }

    #[test]
    fn head_detection() {
        let mut n = node();
        n.log = log_of(&["b", "a"]);
        assert!(!n.is_head(), "empty revision is not the head id");
        assert!(!n.is_past_revision());

        n.revision = "b".into();
        assert!(n.is_head());
        assert!(!n.is_past_revision());

        n.revision = "a".into();
        assert!(!n.is_head());
        assert!(n.is_past_revision());
    }
}
