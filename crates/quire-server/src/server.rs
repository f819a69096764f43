use std::sync::Arc;

use quire_engine::Engine;
use quire_vcs::{GitCli, Repository};
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::AppState;
use crate::router::build_router;

/// Quire wiki server over a git working tree.
pub struct QuireServer {
    config: ServerConfig,
}

impl QuireServer {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Git backend as configured.
    pub fn backend(&self) -> GitCli {
        GitCli::new(&self.config.root)
            .with_program(&self.config.git_binary)
            .with_timeout(self.config.command_timeout())
            .with_email(&self.config.commit_email)
    }

    /// Open the store, creating the working tree and repository when
    /// missing, and build the engine over it.
    pub async fn engine(&self) -> ServerResult<Engine> {
        let repo = Repository::new(Arc::new(self.backend()));
        repo.init().await?;
        Ok(Engine::new(repo, self.config.engine_config()))
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let engine = self.engine().await?;
        let app = build_router(AppState::new(engine));
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(
            root = %self.config.root.display(),
            basepath = self.config.basepath(),
            "Quire listening on {}",
            self.config.bind_addr
        );
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_construction() {
        let server = QuireServer::new(ServerConfig::default());
        assert_eq!(server.config().bind_addr, "127.0.0.1:8080".parse().unwrap());
    }

    #[test]
    fn backend_follows_config() {
        let config = ServerConfig {
            root: "/srv/wiki".into(),
            command_timeout_secs: 3,
            ..Default::default()
        };
        let backend = QuireServer::new(config).backend();
        assert_eq!(backend.root(), std::path::Path::new("/srv/wiki"));
    }

    #[tokio::test]
    async fn missing_git_binary_fails_startup() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            root: dir.path().join("wiki"),
            git_binary: "quire-no-such-git-binary".into(),
            ..Default::default()
        };
        let err = QuireServer::new(config).engine().await.err().unwrap();
        assert!(matches!(err, ServerError::Vcs(_)));
    }
}
