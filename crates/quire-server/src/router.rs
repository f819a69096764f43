use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler::{wiki_handler, AppState};

/// Build the axum router. Every method and path reaches the wiki handler.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .fallback(wiki_handler)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
