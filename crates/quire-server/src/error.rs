use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use quire_engine::EngineError;
use quire_render::escape_html;
use quire_vcs::VcsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("repository error: {0}")]
    Vcs(#[from] VcsError),

    /// Query string or form body that does not parse.
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Engine(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let reason = status.canonical_reason().unwrap_or("Error");
        let body = format!(
            "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{code} {reason}</title></head>\n\
             <body>\n<h1>{code} {reason}</h1>\n<p>{}</p>\n</body>\n</html>\n",
            escape_html(&self.to_string()),
            code = status.as_u16(),
        );
        (status, Html(body)).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use quire_types::DocPath;
    use quire_vcs::VcsOp;

    #[test]
    fn invalid_path_is_bad_request() {
        let err: ServerError = EngineError::from(DocPath::new("..").unwrap_err()).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn backend_failure_is_internal() {
        let vcs = VcsError::backend(VcsOp::Commit, "", "exit status 128");
        let err: ServerError = EngineError::from(vcs).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ServerError::Internal("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unparsable_parameters_are_bad_request() {
        let response = ServerError::BadRequest("Failed to deserialize form".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn config_error_response_is_internal() {
        let response = ServerError::Config("<bad>".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
