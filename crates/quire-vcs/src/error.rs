use std::fmt;

/// The VCS primitive an error came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VcsOp {
    Init,
    Write,
    Stage,
    Commit,
    Log,
    Show,
    Revert,
    Remove,
    Discard,
    List,
}

impl fmt::Display for VcsOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::Write => "write",
            Self::Stage => "stage",
            Self::Commit => "commit",
            Self::Log => "log",
            Self::Show => "show",
            Self::Revert => "revert",
            Self::Remove => "remove",
            Self::Discard => "discard",
            Self::List => "list",
        };
        f.write_str(name)
    }
}

/// Errors from VCS backend operations.
#[derive(Debug, thiserror::Error)]
pub enum VcsError {
    /// The path has no history, or the revision does not contain it.
    #[error("{path} not found at revision {revision:?}")]
    NotFound { path: String, revision: String },

    /// A VCS primitive failed: tool missing, non-zero exit, timeout.
    #[error("{op} failed for {path:?}: {reason}")]
    Backend { op: VcsOp, path: String, reason: String },

    /// Reading or writing a working-tree file failed.
    #[error("{op} storage error on {path:?}: {source}")]
    Storage {
        op: VcsOp,
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl VcsError {
    pub fn not_found(path: impl Into<String>, revision: impl Into<String>) -> Self {
        Self::NotFound { path: path.into(), revision: revision.into() }
    }

    pub fn backend(op: VcsOp, path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Backend { op, path: path.into(), reason: reason.into() }
    }

    pub fn storage(op: VcsOp, path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Storage { op, path: path.into(), source }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// The failing primitive, when known.
    pub fn op(&self) -> Option<VcsOp> {
        match self {
            Self::NotFound { .. } => Some(VcsOp::Show),
            Self::Backend { op, .. } | Self::Storage { op, .. } => Some(*op),
        }
    }
}

/// Result alias for VCS operations.
pub type VcsResult<T> = Result<T, VcsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_display() {
        assert_eq!(VcsOp::Stage.to_string(), "stage");
        assert_eq!(VcsOp::Revert.to_string(), "revert");
    }

    #[test]
    fn error_accessors() {
        let e = VcsError::backend(VcsOp::Commit, "a.md", "exit status 128");
        assert_eq!(e.op(), Some(VcsOp::Commit));
        assert!(!e.is_not_found());
        assert_eq!(e.to_string(), "commit failed for \"a.md\": exit status 128");

        let nf = VcsError::not_found("a.md", "");
        assert!(nf.is_not_found());
    }
}
