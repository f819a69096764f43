//! Request input consumed by the engine.

use serde::Deserialize;

/// Form or query parameters. Absent and empty values are treated alike.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Params {
    pub content: Option<String>,
    /// Changelog message.
    pub msg: Option<String>,
    pub author: Option<String>,
    /// Revision to revert to.
    pub revert: Option<String>,
    /// Revision to view.
    pub revision: Option<String>,
    pub edit: Option<String>,
    pub revisions: Option<String>,
    pub askdelete: Option<String>,
    pub delete: Option<String>,
}

impl Params {
    /// Field-wise merge: values present in `self` win over `fallback`.
    pub fn or(self, fallback: Params) -> Params {
        Params {
            content: self.content.or(fallback.content),
            msg: self.msg.or(fallback.msg),
            author: self.author.or(fallback.author),
            revert: self.revert.or(fallback.revert),
            revision: self.revision.or(fallback.revision),
            edit: self.edit.or(fallback.edit),
            revisions: self.revisions.or(fallback.revisions),
            askdelete: self.askdelete.or(fallback.askdelete),
            delete: self.delete.or(fallback.delete),
        }
    }
}

/// Non-empty value of an optional parameter.
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// One request as the engine sees it.
#[derive(Clone, Debug, Default)]
pub struct WikiRequest {
    /// Percent-decoded URL path, relative to the base path, starting with `/`.
    pub path: String,
    pub params: Params,
    /// Value of the `author` cookie, if any.
    pub author_cookie: Option<String>,
}

impl WikiRequest {
    pub fn new(path: impl Into<String>, params: Params) -> Self {
        Self { path: path.into(), params, author_cookie: None }
    }

    pub fn with_author_cookie(mut self, author: impl Into<String>) -> Self {
        self.author_cookie = Some(author.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_prefers_self() {
        let body = Params { content: Some("body".into()), ..Default::default() };
        let query = Params {
            content: Some("query".into()),
            revision: Some("abc".into()),
            ..Default::default()
        };
        let merged = body.or(query);
        assert_eq!(merged.content.as_deref(), Some("body"));
        assert_eq!(merged.revision.as_deref(), Some("abc"));
        assert!(merged.msg.is_none());
    }

    #[test]
    fn empty_values_are_absent() {
        assert_eq!(non_empty(&Some(String::new())), None);
        assert_eq!(non_empty(&None), None);
        assert_eq!(non_empty(&Some("x".into())), Some("x"));
    }
}
