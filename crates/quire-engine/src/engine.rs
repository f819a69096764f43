use std::sync::Arc;

use quire_render::{Layout, Markdown, Markup};
use quire_types::{parse_flag, DirEntry, DocPath, EntryKind, Node};
use quire_vcs::{Repository, VcsError};
use tracing::{debug, error, info};

use crate::error::EngineResult;
use crate::mode::{is_ignored_path, Mode};
use crate::request::{non_empty, WikiRequest};

/// Site-wide settings the engine stamps onto every node.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub title: String,
    /// URL prefix the wiki is mounted under.
    pub basepath: String,
    /// Author label when neither the form nor the cookie names one.
    pub default_author: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: "Quire".to_string(),
            basepath: String::new(),
            default_author: "Unknown".to_string(),
        }
    }
}

/// What the caller should answer with.
#[derive(Debug)]
pub enum Outcome {
    /// Nothing to do; answer with an empty body.
    Ignored,
    /// Temporary redirect, used after a delete.
    Redirect { location: String },
    /// A populated node and the layout to present it with.
    Page { node: Box<Node>, layout: Layout },
}

/// The document engine: resolves a request to one operation and runs it.
pub struct Engine {
    repo: Repository,
    markup: Arc<dyn Markup>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(repo: Repository, config: EngineConfig) -> Self {
        Self { repo, markup: Arc::new(Markdown::new()), config }
    }

    /// Replace the markup transform.
    pub fn with_markup(mut self, markup: Arc<dyn Markup>) -> Self {
        self.markup = markup;
        self
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Handle one request. Failures are logged with path and operation
    /// before being returned.
    pub async fn handle(&self, request: WikiRequest) -> EngineResult<Outcome> {
        if is_ignored_path(&request.path) {
            return Ok(Outcome::Ignored);
        }
        let path = request.path.clone();
        let result = self.dispatch(request).await;
        if let Err(e) = &result {
            error!(path = %path, op = %e.operation(), error = %e, "request failed");
        }
        result
    }

    async fn dispatch(&self, request: WikiRequest) -> EngineResult<Outcome> {
        let doc = DocPath::from_url(&request.path)?;
        let params = request.params;

        let mut node = Node::new(doc.clone(), &self.config.title, &self.config.basepath);
        let edit = parse_flag(params.edit.as_deref());
        node.show_revisions = parse_flag(params.revisions.as_deref());
        node.ask_delete = parse_flag(params.askdelete.as_deref());
        node.author = request
            .author_cookie
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| self.config.default_author.clone());
        let form_author = non_empty(&params.author).map(str::to_string);

        let mode = Mode::resolve(&params);
        debug!(path = %doc, mode = mode.name(), "resolved request");
        match mode {
            Mode::Delete => {
                let author = form_author.unwrap_or_else(|| node.author.clone());
                self.delete(&doc, &author).await?;
                let location = format!("{}{}", node.basepath, doc.parent_url());
                return Ok(Outcome::Redirect { location });
            }
            Mode::Write { content, message, author } => {
                node.author = author;
                self.write(&mut node, content.into_bytes(), &message).await?;
            }
            Mode::Revert { target } => {
                let author = form_author.unwrap_or_else(|| node.author.clone());
                self.revert(&mut node, &target, &author).await?;
            }
            Mode::Show { revision } => self.show(&mut node, revision, edit).await?,
        }

        node.dirs = self.directories(&doc).await?;
        let layout = Layout::for_node(&node);
        Ok(Outcome::Page { node: Box::new(node), layout })
    }

    async fn delete(&self, doc: &DocPath, author: &str) -> EngineResult<()> {
        let message = format!("Delete {}", doc.display_name());
        let revision = self.repo.writer().await.delete(doc, &message, author).await?;
        info!(path = %doc, ?revision, author, "deleted document");
        Ok(())
    }

    async fn write(&self, node: &mut Node, bytes: Vec<u8>, message: &str) -> EngineResult<()> {
        let session = self.repo.writer().await;
        let revision = session.save(&node.doc, &bytes, message, &node.author).await?;
        let log = session.log(&node.doc).await?;
        drop(session);
        info!(path = %node.doc, ?revision, author = %node.author, "saved document");

        node.bytes = bytes;
        node.log = log;
        node.markup = self.markup.render(&node.bytes)?;
        Ok(())
    }

    async fn revert(&self, node: &mut Node, target: &str, author: &str) -> EngineResult<()> {
        let session = self.repo.writer().await;
        let message = format!("Reverted to: {target}");
        let revision = session.restore(&node.doc, target, &message, author).await?;
        let bytes = or_empty(session.show(&node.doc, "").await)?;
        let log = session.log(&node.doc).await?;
        drop(session);
        info!(path = %node.doc, target, ?revision, author, "reverted document");

        node.revision = String::new();
        node.bytes = bytes;
        node.log = log;
        node.markup = self.markup.render(&node.bytes)?;
        Ok(())
    }

    /// Writes and reverts always answer with the rendered view; only a plain
    /// read honours `edit`.
    async fn show(&self, node: &mut Node, revision: String, edit: bool) -> EngineResult<()> {
        let session = self.repo.reader().await;
        let log = session.log(&node.doc).await?;
        let resolved = match log.find(&revision) {
            Some(found) if !revision.is_empty() => found.id.clone(),
            _ => revision,
        };
        let bytes = or_empty(session.show(&node.doc, &resolved).await)?;
        drop(session);

        node.revision = resolved;
        node.bytes = bytes;
        node.log = log;

        let create_new = node.is_empty();
        node.edit = edit || create_new;
        let verb = if create_new { "Create" } else { "Edit" };
        node.changelog = format!("{verb} {}", node.doc.display_name());

        if node.edit {
            node.content = String::from_utf8_lossy(&node.bytes).into_owned();
        } else {
            node.markup = self.markup.render(&node.bytes)?;
        }
        Ok(())
    }

    /// Entries of every directory from the root down to the document's own,
    /// marking those that lie on the document's path.
    async fn directories(&self, doc: &DocPath) -> EngineResult<Vec<DirEntry>> {
        let segments: Vec<&str> = doc.segments().collect();
        let last = segments.len() - 1;
        let session = self.repo.reader().await;
        let mut dirs = Vec::new();
        for (depth, dir) in doc.ancestors().into_iter().enumerate() {
            for entry in session.list(&dir).await? {
                let relative = if dir.is_empty() {
                    entry.name.clone()
                } else {
                    format!("{dir}/{}", entry.name)
                };
                let expected = if depth < last { EntryKind::Directory } else { EntryKind::Document };
                let active = entry.kind == expected && segments[depth] == entry.name;
                let path = match entry.kind {
                    EntryKind::Directory => format!("/{relative}/"),
                    EntryKind::Document => format!("/{relative}"),
                };
                dirs.push(DirEntry { name: entry.name, path, kind: entry.kind, depth, active });
            }
        }
        Ok(dirs)
    }
}

/// Absorb "not found" into an empty document; keep real failures.
fn or_empty(result: Result<Vec<u8>, VcsError>) -> Result<Vec<u8>, VcsError> {
    match result {
        Err(e) if e.is_not_found() => {
            debug!(error = %e, "treating as new document");
            Ok(Vec::new())
        }
        other => other,
    }
}
