use thiserror::Error;

/// Errors from the markup transform.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("document is not valid UTF-8 (valid up to byte {valid_up_to})")]
    InvalidUtf8 { valid_up_to: usize },
}

pub type RenderResult<T> = Result<T, RenderError>;
