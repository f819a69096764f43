use std::sync::Arc;

use axum::extract::rejection::{FormRejection, QueryRejection};
use axum::extract::{Form, Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Redirect, Response};
use chrono::Utc;
use percent_encoding::percent_decode_str;
use quire_engine::{Engine, Outcome, Params, WikiRequest};
use quire_render::present;
use tracing::warn;

use crate::cookie::{author_cookie, read_author};
use crate::error::{ServerError, ServerResult};

/// Shared state of every request.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
}

impl AppState {
    pub fn new(engine: Engine) -> Self {
        Self { engine: Arc::new(engine) }
    }
}

/// Every path is a document, so this one handler serves the whole wiki.
///
/// Parameters come from the query string and, for form posts, the body;
/// body values win. A post without a form content type is served from the
/// query alone, but parameters that fail to parse are a bad request.
pub async fn wiki_handler(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
    query: Result<Query<Params>, QueryRejection>,
    form: Result<Form<Params>, FormRejection>,
) -> ServerResult<Response> {
    let Query(query) = query.map_err(|rejection| ServerError::BadRequest(rejection.body_text()))?;
    let params = match form {
        Ok(Form(form)) => form.or(query),
        Err(FormRejection::InvalidFormContentType(_)) => query,
        Err(rejection) => return Err(ServerError::BadRequest(rejection.body_text())),
    };

    let basepath = &state.engine.config().basepath;
    let path = document_path(uri.path(), basepath);
    let mut request = WikiRequest::new(path, params);
    if let Some(author) = read_author(&headers) {
        request = request.with_author_cookie(author);
    }

    match state.engine.handle(request).await? {
        Outcome::Ignored => Ok(StatusCode::OK.into_response()),
        Outcome::Redirect { location } => Ok(Redirect::temporary(&location).into_response()),
        Outcome::Page { node, layout } => {
            let mut response = Html(present(&node, layout)).into_response();
            match HeaderValue::from_str(&author_cookie(&node.author, &node.basepath, Utc::now())) {
                Ok(cookie) => {
                    response.headers_mut().insert(SET_COOKIE, cookie);
                }
                Err(e) => warn!(author = %node.author, error = %e, "author cookie not set"),
            }
            Ok(response)
        }
    }
}

/// Decode the request path and strip the mount prefix when the request
/// still carries it. Malformed escapes stay literal.
fn document_path(raw: &str, basepath: &str) -> String {
    let decoded = percent_decode_str(raw).decode_utf8_lossy();
    let path: &str = &decoded;
    let trimmed = basepath.trim_end_matches('/');
    if trimmed.is_empty() {
        return path.to_string();
    }
    match path.strip_prefix(trimmed) {
        Some("") => "/".to_string(),
        Some(rest) if rest.starts_with('/') => rest.to_string(),
        _ => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basepath_is_stripped() {
        assert_eq!(document_path("/wiki/foo", "/wiki"), "/foo");
        assert_eq!(document_path("/wiki", "/wiki/"), "/");
        assert_eq!(document_path("/wiki/", "/wiki"), "/");
    }

    #[test]
    fn foreign_paths_pass_through() {
        assert_eq!(document_path("/foo", ""), "/foo");
        assert_eq!(document_path("/foo", "/wiki"), "/foo");
        assert_eq!(document_path("/wikipedia", "/wiki"), "/wikipedia");
    }

    #[test]
    fn path_is_decoded() {
        assert_eq!(document_path("/wiki/my%20page", "/wiki"), "/my page");
        assert_eq!(document_path("/caf%C3%A9", ""), "/café");
        assert_eq!(document_path("/%2e%2e/x", ""), "/../x");
        assert_eq!(document_path("/100%/%zz", ""), "/100%/%zz");
    }
}
