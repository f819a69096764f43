//! Mode resolution: which single operation a request represents.

use quire_types::parse_flag;

use crate::request::{non_empty, Params};

/// Requests for this path are answered empty without touching the VCS.
pub const FAVICON_PATH: &str = "/favicon.ico";

/// Whether a request path is excluded from all processing.
pub fn is_ignored_path(path: &str) -> bool {
    path == FAVICON_PATH
}

/// The resolved intent of a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Remove the document and commit the removal.
    Delete,
    /// Store new content and commit it.
    Write { content: String, message: String, author: String },
    /// Restore a past revision as a new head revision.
    Revert { target: String },
    /// Read-only view of head or of a given revision (empty means head).
    Show { revision: String },
}

impl Mode {
    /// Resolve with fixed precedence, first match wins: delete, write
    /// (content, message and author all non-empty), revert, show.
    pub fn resolve(params: &Params) -> Self {
        if parse_flag(params.delete.as_deref()) {
            return Self::Delete;
        }
        if let (Some(content), Some(message), Some(author)) =
            (non_empty(&params.content), non_empty(&params.msg), non_empty(&params.author))
        {
            return Self::Write {
                content: content.to_string(),
                message: message.to_string(),
                author: author.to_string(),
            };
        }
        if let Some(target) = non_empty(&params.revert) {
            return Self::Revert { target: target.to_string() };
        }
        Self::Show { revision: non_empty(&params.revision).unwrap_or_default().to_string() }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Write { .. } => "write",
            Self::Revert { .. } => "revert",
            Self::Show { .. } => "show",
        }
    }
}
