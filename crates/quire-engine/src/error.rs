use quire_render::RenderError;
use quire_types::TypeError;
use quire_vcs::VcsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    InvalidPath(#[from] TypeError),

    #[error(transparent)]
    Vcs(#[from] VcsError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl EngineError {
    /// Whether the request itself was at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidPath(_))
    }

    /// Name of the failing operation, for logs.
    pub fn operation(&self) -> String {
        match self {
            Self::InvalidPath(_) => "resolve".to_string(),
            Self::Vcs(e) => e.op().map_or_else(|| "vcs".to_string(), |op| op.to_string()),
            Self::Render(_) => "render".to_string(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
