//! Revisions and the per-document revision log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{TypeError, TypeResult};

/// Shortest prefix accepted when looking a revision up by abbreviated id.
const MIN_PREFIX_LEN: usize = 4;

/// One commit that touched a document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    /// Opaque commit id (a git hash for the git backend).
    pub id: String,
    pub message: String,
    /// Free-text author label, not a verified identity.
    pub author: String,
    pub time: DateTime<Utc>,
}

impl Revision {
    /// First seven characters of the id.
    pub fn short_id(&self) -> &str {
        self.id.get(..7).unwrap_or(&self.id)
    }
}

/// Revisions of one document, newest first. The first element is the head.
///
/// An empty log means the document has never been committed, regardless of
/// what the working tree holds.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionLog(Vec<Revision>);

impl RevisionLog {
    /// Wrap revisions that are already ordered newest first.
    pub fn new(newest_first: Vec<Revision>) -> Self {
        Self(newest_first)
    }

    pub fn head(&self) -> Option<&Revision> {
        self.0.first()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Revision> {
        self.0.iter()
    }

    /// Oldest revision, the one that created the document.
    pub fn first_revision(&self) -> Option<&Revision> {
        self.0.last()
    }

    /// Whether `id` is exactly the head's id.
    pub fn is_head(&self, id: &str) -> bool {
        self.head().is_some_and(|head| head.id == id)
    }

    /// Find a revision by full id or by an unambiguous prefix.
    pub fn find(&self, id: &str) -> Option<&Revision> {
        if let Some(exact) = self.0.iter().find(|r| r.id == id) {
            return Some(exact);
        }
        if id.len() < MIN_PREFIX_LEN {
            return None;
        }
        let mut matches = self.0.iter().filter(|r| r.id.starts_with(id));
        match (matches.next(), matches.next()) {
            (Some(only), None) => Some(only),
            _ => None,
        }
    }

    pub fn into_vec(self) -> Vec<Revision> {
        self.0
    }
}

impl<'a> IntoIterator for &'a RevisionLog {
    type Item = &'a Revision;
    type IntoIter = std::slice::Iter<'a, Revision>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Check that caller-supplied revision text is safe to hand to a VCS
/// command line: non-empty, no leading `-`, no range syntax, and limited to
/// characters that appear in hashes and simple revision expressions.
pub fn validate_revision(revision: &str) -> TypeResult<&str> {
    let fail = |reason: &str| TypeError::InvalidRevision {
        revision: revision.to_string(),
        reason: reason.to_string(),
    };
    if revision.is_empty() {
        return Err(fail("empty"));
    }
    if revision.starts_with('-') {
        return Err(fail("leading dash"));
    }
    if revision.contains("..") {
        return Err(fail("range syntax"));
    }
    if !revision
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '~' | '^' | '.' | '_' | '/' | '-'))
    {
        return Err(fail("unsupported character"));
    }
    Ok(revision)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn rev(id: &str, message: &str) -> Revision {
        Revision {
            id: id.to_string(),
            message: message.to_string(),
            author: "alice".to_string(),
            time: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    fn sample_log() -> RevisionLog {
        RevisionLog::new(vec![
            rev("c3f1aa00", "third"),
            rev("b2e0bb11", "second"),
            rev("b2e0cc22", "first"),
        ])
    }

    #[test]
    fn head_is_newest() {
        let log = sample_log();
        assert_eq!(log.head().unwrap().message, "third");
        assert_eq!(log.first_revision().unwrap().message, "first");
        assert!(log.is_head("c3f1aa00"));
        assert!(!log.is_head("b2e0bb11"));
        assert!(!log.is_head(""));
    }

    #[test]
    fn empty_log_has_no_head() {
        let log = RevisionLog::default();
        assert!(log.is_empty());
        assert!(log.head().is_none());
        assert!(!log.is_head(""));
    }

    #[test]
    fn find_by_prefix_requires_uniqueness() {
        let log = sample_log();
        assert_eq!(log.find("c3f1aa00").unwrap().message, "third");
        assert_eq!(log.find("c3f1").unwrap().message, "third");
        assert!(log.find("b2e0").is_none(), "ambiguous prefix");
        assert_eq!(log.find("b2e0c").unwrap().message, "first");
        assert!(log.find("c3f").is_none(), "prefix too short");
        assert!(log.find("ffff").is_none());
    }

    #[test]
    fn short_id_handles_short_ids() {
        assert_eq!(rev("0123456789", "m").short_id(), "0123456");
        assert_eq!(rev("01", "m").short_id(), "01");
    }

    #[test]
    fn revision_validation() {
        assert!(validate_revision("a1b2c3").is_ok());
        assert!(validate_revision("HEAD~2").is_ok());
        assert!(validate_revision("").is_err());
        assert!(validate_revision("--output=/tmp/x").is_err());
        assert!(validate_revision("a..b").is_err());
        assert!(validate_revision("a b").is_err());
        assert!(validate_revision("a:b").is_err());
    }
}
