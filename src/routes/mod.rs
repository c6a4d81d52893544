//! Router assembly: HTTP endpoints, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod extract;
pub mod http;

/// Mount point of the practice API.
pub const API_PREFIX: &str = "/api/practice";

/// Build the application router with:
/// - the catalog API under `/api/practice/...`
/// - CORS (allow any origin/method/headers); adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/health", get(http::http_health))
        // Categories
        .route("/category", get(http::http_category_index).post(http::http_create_category))
        .route("/category/", get(http::http_category_index).delete(http::http_delete_root))
        .route("/category/@find", post(http::http_find_categories))
        .route(
            "/category/:uri",
            get(http::http_get_category)
                .put(http::http_update_category)
                .delete(http::http_delete_category),
        )
        .route("/category/:uri/subcategories", get(http::http_subcategories))
        .route("/category/:uri/exercises", get(http::http_category_exercises))
        // Exercises
        .route("/category/:uri/ex", post(http::http_create_exercise))
        .route(
            "/category/:uri/ex/:uri_name",
            get(http::http_get_exercise)
                .put(http::http_update_exercise)
                .delete(http::http_delete_exercise),
        )
        .route("/category/:uri/ex/:uri_name/questions", get(http::http_exercise_questions))
        .route("/category/:uri/ex/:uri_name/q", post(http::http_add_question))
        .route("/category/:uri/ex/:uri_name/q/:qid", delete(http::http_remove_question));

    Router::new()
        .nest(API_PREFIX, api)
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}
