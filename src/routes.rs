// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{comments, pages},
    state::AppState,
    utils::snapshot::snapshot_middleware,
};

/// Assembles the main application router.
///
/// * Merges the page and comment sub-routers.
/// * Captures one snapshot instant per request.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let page_routes = Router::new()
        .route("/comments", get(pages::get_page_comments))
        .route("/roots", get(pages::get_page_root_comments))
        .route("/{id}/comments", get(pages::get_page_comments_by_id));

    let comment_routes = Router::new()
        .route("/", post(comments::create_comment))
        .route(
            "/{id}",
            get(comments::get_comment).delete(comments::delete_comment),
        )
        .route("/{id}/children", get(comments::get_comment_children))
        .route("/{id}/hide", post(comments::hide_comment))
        .route("/{id}/unhide", post(comments::unhide_comment));

    Router::new()
        .nest("/api/pages", page_routes)
        .nest("/api/comments", comment_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(cors)
                .map_response(|res: axum::response::Response<_>| res.map(axum::body::Body::new))
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(snapshot_middleware)),
        )
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([axum::http::header::CONTENT_TYPE])
}
