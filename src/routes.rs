use crate::handlers;
use crate::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

/// Build the application router.
///
/// `max_request_bytes` caps every request body, multipart uploads included.
pub fn create_router(state: AppState, max_request_bytes: usize) -> Router {
    let handler_routes = Router::new()
        .route("/get-spec", get(handlers::get_spec_handler))
        .route("/register", post(handlers::register_handler))
        .route("/unregister", delete(handlers::unregister_handler))
        .route("/update", put(handlers::update_handler))
        .route("/use", post(handlers::use_handler));

    Router::new()
        .nest("/handlers", handler_routes)
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(max_request_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
