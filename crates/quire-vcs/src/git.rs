//! Git command-line backend.
//!
//! [`GitCli`] runs the `git` executable inside the working tree root, one
//! process per primitive, each bounded by a timeout. Documents are plain
//! files in the tree; history is the repository's own commit log.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quire_types::{validate_revision, DocPath, Revision, RevisionLog, TreeEntry, DOCUMENT_EXTENSION};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{VcsError, VcsOp, VcsResult};
use crate::traits::Vcs;

/// Field separator in `git log` output.
const FIELD_SEP: char = '\u{1f}';
/// Record separator in `git log` output.
const RECORD_SEP: char = '\u{1e}';
const LOG_FORMAT: &str = "--format=%H%x1f%an%x1f%aI%x1f%s%x1e";

const FALLBACK_AUTHOR: &str = "Unknown";

/// Git backend driving the `git` executable.
#[derive(Clone, Debug)]
pub struct GitCli {
    root: PathBuf,
    program: PathBuf,
    timeout: Duration,
    email: String,
}

impl GitCli {
    /// Backend for the working tree at `root`, using `git` from `PATH`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            program: PathBuf::from("git"),
            timeout: Duration::from_secs(10),
            email: "quire@localhost".to_string(),
        }
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Upper bound for every single git invocation.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Email recorded for author and committer; the name is the free-text
    /// author label.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .current_dir(&self.root)
            .env("LC_ALL", "C")
            .env("GIT_TERMINAL_PROMPT", "0")
            .env_remove("GIT_DIR")
            .env_remove("GIT_WORK_TREE")
            .env_remove("GIT_INDEX_FILE")
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }

    async fn execute(&self, op: VcsOp, path: &str, mut cmd: Command) -> VcsResult<Output> {
        debug!(%op, path, command = ?cmd.as_std(), "running git");
        match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(VcsError::backend(
                op,
                path,
                format!("cannot run {}: {e}", self.program.display()),
            )),
            Err(_) => {
                if locks_index(op) {
                    self.clear_index_lock(op, path).await;
                }
                Err(VcsError::backend(op, path, format!("timed out after {:?}", self.timeout)))
            }
        }
    }

    /// A killed git leaves `index.lock` behind and every later write would
    /// fail on it. The caller holds the write session, so no other git
    /// process owns the lock.
    async fn clear_index_lock(&self, op: VcsOp, path: &str) {
        let lock = self.root.join(".git").join("index.lock");
        match tokio::fs::remove_file(&lock).await {
            Ok(()) => warn!(%op, path, lock = %lock.display(), "removed index lock left by timed-out git"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(%op, path, lock = %lock.display(), error = %e, "cannot remove stale index lock"),
        }
    }

    async fn run(&self, op: VcsOp, path: &str, args: &[&str]) -> VcsResult<Output> {
        self.execute(op, path, self.command(args)).await
    }

    /// Run and require a zero exit status; returns stdout.
    async fn run_checked(&self, op: VcsOp, path: &str, args: &[&str]) -> VcsResult<Vec<u8>> {
        let output = self.run(op, path, args).await?;
        if output.status.success() {
            Ok(output.stdout)
        } else {
            Err(failure(op, path, &output))
        }
    }

    async fn has_head(&self, op: VcsOp, path: &str) -> VcsResult<bool> {
        let output = self.run(op, path, &["rev-parse", "--verify", "--quiet", "HEAD"]).await?;
        Ok(output.status.success())
    }

    fn file_path(&self, doc: &DocPath) -> PathBuf {
        self.root.join(doc.file_name())
    }
}

/// Primitives that take git's index lock.
fn locks_index(op: VcsOp) -> bool {
    matches!(op, VcsOp::Stage | VcsOp::Commit | VcsOp::Revert | VcsOp::Remove | VcsOp::Discard)
}

fn failure(op: VcsOp, path: &str, output: &Output) -> VcsError {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let reason = match stderr.trim() {
        "" => format!("git exited with {}", output.status),
        message => message.to_string(),
    };
    VcsError::backend(op, path, reason)
}

/// Git refuses identities that are empty once angle brackets, newlines and
/// surrounding punctuation are dropped.
fn sanitize_ident(author: &str) -> String {
    let cleaned: String = author.chars().filter(|c| !matches!(c, '<' | '>' | '\n' | '\r')).collect();
    let trimmed = cleaned.trim_matches(|c: char| c.is_whitespace() || ".,:;\"'".contains(c));
    if trimmed.is_empty() {
        FALLBACK_AUTHOR.to_string()
    } else {
        cleaned.trim().to_string()
    }
}

fn parse_log(path: &str, stdout: &[u8]) -> VcsResult<RevisionLog> {
    let text = String::from_utf8_lossy(stdout);
    let mut revisions = Vec::new();
    for record in text.split(RECORD_SEP) {
        let record = record.trim_matches('\n');
        if record.is_empty() {
            continue;
        }
        let mut fields = record.splitn(4, FIELD_SEP);
        let (Some(id), Some(author), Some(time), Some(message)) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(VcsError::backend(VcsOp::Log, path, format!("malformed log record {record:?}")));
        };
        let time = DateTime::parse_from_rfc3339(time)
            .map_err(|e| VcsError::backend(VcsOp::Log, path, format!("bad commit time {time:?}: {e}")))?
            .with_timezone(&Utc);
        revisions.push(Revision {
            id: id.to_string(),
            message: message.to_string(),
            author: author.to_string(),
            time,
        });
    }
    Ok(RevisionLog::new(revisions))
}

#[async_trait]
impl Vcs for GitCli {
    async fn init(&self) -> VcsResult<()> {
        let root = self.root.display().to_string();
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| VcsError::storage(VcsOp::Init, &root, e))?;
        if tokio::fs::try_exists(self.root.join(".git")).await.unwrap_or(false) {
            return Ok(());
        }
        self.run_checked(VcsOp::Init, &root, &["init", "--quiet"]).await?;
        info!(root, "initialized git repository");
        Ok(())
    }

    async fn write_file(&self, doc: &DocPath, bytes: &[u8]) -> VcsResult<()> {
        let file = doc.file_name();
        let target = self.file_path(doc);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| VcsError::storage(VcsOp::Write, &file, e))?;
        }
        tokio::fs::write(&target, bytes)
            .await
            .map_err(|e| VcsError::storage(VcsOp::Write, &file, e))
    }

    async fn stage(&self, doc: &DocPath) -> VcsResult<()> {
        let file = doc.file_name();
        self.run_checked(VcsOp::Stage, &file, &["add", "--", &file]).await?;
        Ok(())
    }

    async fn commit(&self, doc: &DocPath, message: &str, author: &str) -> VcsResult<Option<String>> {
        let file = doc.file_name();
        let staged = self.run(VcsOp::Commit, &file, &["diff", "--cached", "--quiet", "--", &file]).await?;
        match staged.status.code() {
            Some(0) => {
                debug!(file, "nothing staged, skipping commit");
                return Ok(None);
            }
            Some(1) => {}
            _ => return Err(failure(VcsOp::Commit, &file, &staged)),
        }

        let name = sanitize_ident(author);
        let mut cmd = self.command(&[
            "-c",
            "commit.gpgsign=false",
            "commit",
            "--quiet",
            "--no-verify",
            "--allow-empty-message",
            "-m",
            message,
            "--",
            &file,
        ]);
        cmd.env("GIT_AUTHOR_NAME", &name)
            .env("GIT_AUTHOR_EMAIL", &self.email)
            .env("GIT_COMMITTER_NAME", &name)
            .env("GIT_COMMITTER_EMAIL", &self.email);
        let output = self.execute(VcsOp::Commit, &file, cmd).await?;
        if !output.status.success() {
            return Err(failure(VcsOp::Commit, &file, &output));
        }

        let head = self.run_checked(VcsOp::Commit, &file, &["rev-parse", "HEAD"]).await?;
        let id = String::from_utf8_lossy(&head).trim().to_string();
        info!(revision = %id, author = %name, message, "committed");
        Ok(Some(id))
    }

    async fn log(&self, doc: &DocPath) -> VcsResult<RevisionLog> {
        let file = doc.file_name();
        if !self.has_head(VcsOp::Log, &file).await? {
            return Ok(RevisionLog::default());
        }
        let stdout = self.run_checked(VcsOp::Log, &file, &["log", LOG_FORMAT, "--", &file]).await?;
        parse_log(&file, &stdout)
    }

    async fn show(&self, doc: &DocPath, revision: &str) -> VcsResult<Vec<u8>> {
        let file = doc.file_name();
        let rev = if revision.is_empty() {
            if !self.has_head(VcsOp::Show, &file).await? {
                return Err(VcsError::not_found(file, revision));
            }
            "HEAD"
        } else {
            validate_revision(revision).map_err(|_| VcsError::not_found(&file, revision))?
        };
        let object = format!("{rev}:{file}");
        let output = self.run(VcsOp::Show, &file, &["show", &object]).await?;
        if output.status.success() {
            Ok(output.stdout)
        } else {
            debug!(file, revision, "no such revision of document");
            Err(VcsError::not_found(file, revision))
        }
    }

    async fn revert(&self, doc: &DocPath, revision: &str) -> VcsResult<()> {
        let file = doc.file_name();
        let rev = validate_revision(revision)
            .map_err(|e| VcsError::backend(VcsOp::Revert, &file, e.to_string()))?;
        self.run_checked(VcsOp::Revert, &file, &["checkout", rev, "--", &file]).await?;
        Ok(())
    }

    async fn remove(&self, doc: &DocPath) -> VcsResult<()> {
        let file = doc.file_name();
        self.run_checked(VcsOp::Remove, &file, &["rm", "--quiet", "--force", "--", &file]).await?;
        Ok(())
    }

    async fn discard(&self, doc: &DocPath) -> VcsResult<()> {
        let file = doc.file_name();
        let head_object = format!("HEAD:{file}");
        let in_head = self.has_head(VcsOp::Discard, &file).await?
            && self.run(VcsOp::Discard, &file, &["cat-file", "-e", &head_object]).await?.status.success();
        if in_head {
            self.run_checked(VcsOp::Discard, &file, &["checkout", "HEAD", "--", &file]).await?;
            return Ok(());
        }
        self.run_checked(
            VcsOp::Discard,
            &file,
            &["rm", "--cached", "--force", "--quiet", "--ignore-unmatch", "--", &file],
        )
        .await?;
        match tokio::fs::remove_file(self.file_path(doc)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(VcsError::storage(VcsOp::Discard, &file, e)),
        }
    }

    async fn list(&self, dir: &str) -> VcsResult<Vec<TreeEntry>> {
        let mut reader = match tokio::fs::read_dir(self.root.join(dir)).await {
            Ok(reader) => reader,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(VcsError::storage(VcsOp::List, dir, e)),
        };
        let suffix = format!(".{DOCUMENT_EXTENSION}");
        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await.map_err(|e| VcsError::storage(VcsOp::List, dir, e))? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            let file_type = entry.file_type().await.map_err(|e| VcsError::storage(VcsOp::List, dir, e))?;
            if file_type.is_dir() {
                entries.push(TreeEntry::directory(name));
            } else if let Some(stem) = name.strip_suffix(&suffix) {
                entries.push(TreeEntry::document(stem));
            }
        }
        entries.sort();
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn git_available() -> bool {
        std::process::Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    async fn fresh() -> Option<(TempDir, GitCli)> {
        if !git_available() {
            eprintln!("git not found on PATH, skipping");
            return None;
        }
        let dir = TempDir::new().unwrap();
        let git = GitCli::new(dir.path().join("wiki"));
        git.init().await.unwrap();
        Some((dir, git))
    }

    fn doc(path: &str) -> DocPath {
        DocPath::new(path).unwrap()
    }

    async fn save(git: &GitCli, d: &DocPath, content: &str, msg: &str, author: &str) -> Option<String> {
        git.write_file(d, content.as_bytes()).await.unwrap();
        git.stage(d).await.unwrap();
        git.commit(d, msg, author).await.unwrap()
    }

    #[test]
    fn parse_log_records() {
        let out = "abc\u{1f}alice\u{1f}2024-05-01T12:00:00+02:00\u{1f}second\u{1e}\n\
                   def\u{1f}bob\u{1f}2024-04-30T08:00:00Z\u{1f}first\u{1e}\n";
        let log = parse_log("a.md", out.as_bytes()).unwrap();
        assert_eq!(log.len(), 2);
        let head = log.head().unwrap();
        assert_eq!(head.id, "abc");
        assert_eq!(head.author, "alice");
        assert_eq!(head.message, "second");
        assert_eq!(head.time.to_rfc3339(), "2024-05-01T10:00:00+00:00");
        assert!(parse_log("a.md", b"").unwrap().is_empty());
        assert!(parse_log("a.md", "x\u{1f}y\u{1e}".as_bytes()).is_err());
    }

    #[test]
    fn ident_sanitizing() {
        assert_eq!(sanitize_ident("alice"), "alice");
        assert_eq!(sanitize_ident(" <eve>\n"), "eve");
        assert_eq!(sanitize_ident("..."), FALLBACK_AUTHOR);
        assert_eq!(sanitize_ident(""), FALLBACK_AUTHOR);
    }

    #[tokio::test]
    async fn missing_binary_is_backend_error() {
        let dir = TempDir::new().unwrap();
        let git = GitCli::new(dir.path()).with_program("/nonexistent/git-binary");
        let err = git.stage(&doc("a")).await.unwrap_err();
        assert!(matches!(err, VcsError::Backend { op: VcsOp::Stage, .. }));
    }

    #[tokio::test]
    async fn empty_repository_has_no_history() {
        let Some((_dir, git)) = fresh().await else { return };
        let d = doc("foo");
        assert!(git.log(&d).await.unwrap().is_empty());
        assert!(git.show(&d, "").await.unwrap_err().is_not_found());
        assert!(git.commit(&d, "nothing", "alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn write_then_read() {
        let Some((_dir, git)) = fresh().await else { return };
        let d = doc("notes/foo");
        let id = save(&git, &d, "Hello", "init", "alice").await.unwrap();

        assert_eq!(git.show(&d, "").await.unwrap(), b"Hello");
        assert_eq!(git.show(&d, "").await.unwrap(), git.show(&d, &id).await.unwrap());
        let log = git.log(&d).await.unwrap();
        assert_eq!(log.len(), 1);
        let head = log.head().unwrap();
        assert_eq!(head.id, id);
        assert_eq!(head.message, "init");
        assert_eq!(head.author, "alice");
        assert!(save(&git, &d, "Hello", "again", "alice").await.is_none());
    }

    #[tokio::test]
    async fn revert_then_commit_adds_one_revision() {
        let Some((_dir, git)) = fresh().await else { return };
        let d = doc("foo");
        let r0 = save(&git, &d, "v0", "zero", "alice").await.unwrap();
        save(&git, &d, "v1", "one", "bob").await.unwrap();

        git.revert(&d, &r0).await.unwrap();
        git.commit(&d, &format!("Reverted to: {r0}"), "carol").await.unwrap().unwrap();
        assert_eq!(git.show(&d, "").await.unwrap(), git.show(&d, &r0).await.unwrap());
        assert_eq!(git.log(&d).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn delete_keeps_log() {
        let Some((_dir, git)) = fresh().await else { return };
        let d = doc("foo");
        save(&git, &d, "v0", "zero", "alice").await.unwrap();
        git.remove(&d).await.unwrap();
        git.commit(&d, "Delete foo", "alice").await.unwrap().unwrap();

        assert!(git.show(&d, "").await.unwrap_err().is_not_found());
        let log = git.log(&d).await.unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log.head().unwrap().message, "Delete foo");
        assert!(!git.file_path(&d).exists());
    }

    #[tokio::test]
    async fn invalid_revisions_are_rejected() {
        let Some((_dir, git)) = fresh().await else { return };
        let d = doc("foo");
        save(&git, &d, "v0", "zero", "alice").await.unwrap();
        assert!(git.show(&d, "--output=/tmp/x").await.unwrap_err().is_not_found());
        assert!(git.show(&d, "0000000000").await.unwrap_err().is_not_found());
        assert!(matches!(
            git.revert(&d, "-p").await,
            Err(VcsError::Backend { op: VcsOp::Revert, .. })
        ));
    }

    #[tokio::test]
    async fn stage_missing_file_fails() {
        let Some((_dir, git)) = fresh().await else { return };
        assert!(matches!(
            git.stage(&doc("ghost")).await,
            Err(VcsError::Backend { op: VcsOp::Stage, .. })
        ));
    }

    #[tokio::test]
    async fn list_skips_git_metadata() {
        let Some((_dir, git)) = fresh().await else { return };
        git.write_file(&doc("a/b"), b"x").await.unwrap();
        git.write_file(&doc("c"), b"x").await.unwrap();
        std::fs::write(git.root().join("notes.txt"), b"ignored").unwrap();
        assert_eq!(
            git.list("").await.unwrap(),
            vec![TreeEntry::directory("a"), TreeEntry::document("c")]
        );
        assert_eq!(git.list("a").await.unwrap(), vec![TreeEntry::document("b")]);
    }

    #[tokio::test]
    async fn commit_records_only_its_document() {
        let Some((_dir, git)) = fresh().await else { return };
        let foo = doc("foo");
        git.write_file(&foo, b"alice secret").await.unwrap();
        git.stage(&foo).await.unwrap();

        save(&git, &doc("bar"), "public", "bar", "bob").await.unwrap();

        assert!(git.log(&foo).await.unwrap().is_empty());
        assert!(git.show(&foo, "").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn discard_restores_head_content() {
        let Some((_dir, git)) = fresh().await else { return };
        let d = doc("foo");
        save(&git, &d, "v0", "zero", "alice").await.unwrap();
        git.write_file(&d, b"draft").await.unwrap();
        git.stage(&d).await.unwrap();

        git.discard(&d).await.unwrap();
        assert_eq!(std::fs::read(git.file_path(&d)).unwrap(), b"v0");
        assert!(git.commit(&d, "nothing", "bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn discard_drops_uncommitted_document() {
        let Some((_dir, git)) = fresh().await else { return };
        let d = doc("foo");
        git.write_file(&d, b"draft").await.unwrap();
        git.stage(&d).await.unwrap();

        git.discard(&d).await.unwrap();
        assert!(!git.file_path(&d).exists());
        assert!(git.commit(&d, "nothing", "bob").await.unwrap().is_none());
        git.discard(&d).await.unwrap();
    }

    #[cfg(unix)]
    fn slow_git(dir: &Path, setup: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let program = dir.join("slow-git");
        std::fs::write(&program, format!("#!/bin/sh\n{setup}\nsleep 5\n")).unwrap();
        std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();
        program
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn hung_git_times_out() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("wiki");
        std::fs::create_dir_all(&root).unwrap();
        let git = GitCli::new(&root)
            .with_program(slow_git(dir.path(), ":"))
            .with_timeout(Duration::from_millis(200));

        match git.log(&doc("foo")).await {
            Err(VcsError::Backend { op: VcsOp::Log, reason, .. }) => assert!(reason.contains("timed out")),
            other => panic!("expected log timeout, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn timed_out_write_clears_index_lock() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("wiki");
        std::fs::create_dir_all(&root).unwrap();
        let git = GitCli::new(&root)
            .with_program(slow_git(dir.path(), "mkdir -p .git && : > .git/index.lock"))
            .with_timeout(Duration::from_millis(500));

        assert!(matches!(
            git.stage(&doc("foo")).await,
            Err(VcsError::Backend { op: VcsOp::Stage, .. })
        ));
        assert!(root.join(".git").exists());
        assert!(!root.join(".git").join("index.lock").exists());
    }
}
