//! Document paths and their mapping onto working-tree files.
//!
//! A [`DocPath`] is the slash-separated logical name of a document, without a
//! leading slash and without the file extension: the URL `/notes/rust` names
//! the document `notes/rust`, stored as `notes/rust.md` under the working
//! tree root. A URL ending in `/` names the directory's implicit `index`
//! document.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{TypeError, TypeResult};

/// File extension of every document in the working tree.
pub const DOCUMENT_EXTENSION: &str = "md";

/// Name of the document a directory URL resolves to.
pub const INDEX_DOCUMENT: &str = "index";

/// Canonical, validated document identifier.
///
/// Segments are non-empty, never `.` or `..`, never hidden (leading `.`, which
/// also keeps `.git` out of reach) and free of backslashes and control
/// characters. The mapping to and from the working-tree file name is
/// deterministic and reversible.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocPath(String);

impl DocPath {
    /// Build a document path from an already-decoded request URL path.
    ///
    /// The leading `/` is optional. An empty path or one ending in `/` is
    /// rewritten to its `index` child before validation.
    pub fn from_url(url_path: &str) -> TypeResult<Self> {
        let relative = url_path.strip_prefix('/').unwrap_or(url_path);
        let mut canonical = relative.to_string();
        if canonical.is_empty() || canonical.ends_with('/') {
            canonical.push_str(INDEX_DOCUMENT);
        }
        Self::new(canonical)
    }

    /// Validate a relative document path such as `notes/rust`.
    pub fn new(path: impl Into<String>) -> TypeResult<Self> {
        let path = path.into();
        for segment in path.split('/') {
            if let Err(reason) = validate_segment(segment) {
                return Err(TypeError::InvalidPath { path, reason: reason.to_string() });
            }
        }
        Ok(Self(path))
    }

    /// Recover a document path from its working-tree file name.
    pub fn from_file_name(file_name: &str) -> TypeResult<Self> {
        let stem = file_name
            .strip_suffix(DOCUMENT_EXTENSION)
            .and_then(|s| s.strip_suffix('.'))
            .ok_or_else(|| TypeError::InvalidPath {
                path: file_name.to_string(),
                reason: format!("missing .{DOCUMENT_EXTENSION} extension"),
            })?;
        Self::new(stem)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Absolute URL path, e.g. `/notes/rust`.
    pub fn url(&self) -> String {
        format!("/{}", self.0)
    }

    /// Working-tree file name relative to the root, e.g. `notes/rust.md`.
    pub fn file_name(&self) -> String {
        format!("{}.{DOCUMENT_EXTENSION}", self.0)
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Final segment.
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// The containing directory relative to the root, or `None` for
    /// top-level documents.
    pub fn directory(&self) -> Option<&str> {
        self.0.rsplit_once('/').map(|(dir, _)| dir)
    }

    /// Whether this is a directory's implicit `index` document.
    pub fn is_index(&self) -> bool {
        self.name() == INDEX_DOCUMENT
    }

    /// Human-readable name used in changelog messages.
    ///
    /// Index documents carry a ` page` suffix, so the root document reads
    /// `index page` instead of an empty string.
    pub fn display_name(&self) -> String {
        if self.is_index() {
            format!("{} page", self.0)
        } else {
            self.0.clone()
        }
    }

    /// URL to land on once this document is gone: its directory, or for an
    /// index document the directory above that. Always ends in `/`.
    pub fn parent_url(&self) -> String {
        let mut segments: Vec<&str> = self.segments().collect();
        segments.pop();
        if self.is_index() {
            segments.pop();
        }
        if segments.is_empty() {
            "/".to_string()
        } else {
            format!("/{}/", segments.join("/"))
        }
    }

    /// Directories from the root down to this document's directory, as
    /// relative paths. The root is `""`.
    pub fn ancestors(&self) -> Vec<String> {
        let mut dirs = vec![String::new()];
        let segments: Vec<&str> = self.segments().collect();
        for depth in 1..segments.len() {
            dirs.push(segments[..depth].join("/"));
        }
        dirs
    }
}

fn validate_segment(segment: &str) -> Result<(), &'static str> {
    if segment.is_empty() {
        return Err("empty segment");
    }
    if segment == "." || segment == ".." {
        return Err("relative segment");
    }
    if segment.starts_with('.') {
        return Err("hidden segment");
    }
    if segment.contains('\\') {
        return Err("backslash in segment");
    }
    if segment.chars().any(char::is_control) {
        return Err("control character in segment");
    }
    Ok(())
}

impl fmt::Debug for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocPath({})", self.0)
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DocPath {
    type Error = TypeError;

    fn try_from(value: String) -> TypeResult<Self> {
        Self::new(value)
    }
}

impl From<DocPath> for String {
    fn from(path: DocPath) -> Self {
        path.0
    }
}
