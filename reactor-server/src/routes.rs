//! HTTP route handlers for the message endpoint.

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::Json;
use axum::routing::{get, post};
use reactor::core::error::Error;
use reactor::core::response::Reply;
use tower_http::trace::TraceLayer;

use crate::cache::CachedFactory;
use crate::state::AppState;

/// Build the application router with state attached.
pub fn app(state: AppState) -> Router {
    router().layer(TraceLayer::new_for_http()).with_state(state)
}

/// Build the bare router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/message", post(missing_component_name))
        .route("/message/", post(missing_component_name))
        .route("/message/{component_name}", post(post_message))
}

async fn health() -> &'static str {
    "ok"
}

async fn missing_component_name() -> Json<Reply> {
    Json(Reply::from(Error::validation("Missing component name in url")))
}

/// POST /message/{component_name} - apply an action queue to one instance.
///
/// Failures are reported in the body with a success status.
async fn post_message(
    State(state): State<AppState>,
    Path(component_name): Path<String>,
    body: Bytes,
) -> Json<Reply> {
    let request = match state.engine.parse_request(&body) {
        Ok(request) => request,
        Err(err) => return Json(Reply::from(err)),
    };

    let _guard = state.cache.lock(&request.id).await;
    let factory = CachedFactory::new(&state.cache, &state.registry);
    let result = state
        .engine
        .process(&component_name, request, &factory, &*state.renderer);
    Json(Reply::from(result))
}
