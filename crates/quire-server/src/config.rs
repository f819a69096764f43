use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use quire_engine::EngineConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Server settings. Every field has a default, so a config file only needs
/// the keys it changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Document directory, also the git working tree.
    pub root: PathBuf,
    pub title: String,
    /// URL prefix the wiki is mounted under.
    pub basepath: String,
    pub git_binary: String,
    pub command_timeout_secs: u64,
    pub commit_email: String,
    pub default_author: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            root: PathBuf::from("./wiki"),
            title: "Quire".to_string(),
            basepath: String::new(),
            git_binary: "git".to_string(),
            command_timeout_secs: 10,
            commit_email: "quire@localhost".to_string(),
            default_author: "Unknown".to_string(),
        }
    }
}

impl ServerConfig {
    /// Read a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> ServerResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text).map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Base path without its trailing `/`.
    pub fn basepath(&self) -> &str {
        self.basepath.trim_end_matches('/')
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            title: self.title.clone(),
            basepath: self.basepath().to_string(),
            default_author: self.default_author.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.bind_addr, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(c.root, PathBuf::from("./wiki"));
        assert_eq!(c.title, "Quire");
        assert_eq!(c.command_timeout(), Duration::from_secs(10));
        assert_eq!(c.default_author, "Unknown");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = ServerConfig::from_toml("title = \"Notes\"\nbasepath = \"/wiki/\"\n").unwrap();
        assert_eq!(c.title, "Notes");
        assert_eq!(c.basepath(), "/wiki");
        assert_eq!(c.git_binary, "git");
        assert_eq!(c.engine_config().basepath, "/wiki");
    }

    #[test]
    fn bad_toml_is_rejected() {
        assert!(ServerConfig::from_toml("command_timeout_secs = \"soon\"").is_err());
    }

    #[test]
    fn load_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quire.toml");
        std::fs::write(&path, "bind_addr = 12").unwrap();
        let err = ServerConfig::load(&path).unwrap_err();
        assert!(matches!(err, ServerError::Config(msg) if msg.contains("quire.toml")));

        std::fs::write(&path, "root = \"/srv/wiki\"").unwrap();
        assert_eq!(ServerConfig::load(&path).unwrap().root, PathBuf::from("/srv/wiki"));
        assert!(matches!(ServerConfig::load(dir.path().join("missing.toml")), Err(ServerError::Io(_))));
    }
}
