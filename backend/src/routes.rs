use std::path::Path;

use axum::{extract::DefaultBodyLimit, middleware, routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};

use crate::{handlers, request_context, state::AppState};

/// Upper bound for create/update bodies, thumbnails included.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub fn create_router(state: AppState, media_dir: impl AsRef<Path>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::health))
        .route(
            "/api/articles",
            get(handlers::list_articles).post(handlers::create_article),
        )
        .route("/api/articles/recommendations", get(handlers::recommended_articles))
        .route(
            "/api/articles/:id",
            get(handlers::get_article)
                .put(handlers::update_article)
                .delete(handlers::delete_article),
        )
        .route("/api/articles/:id/related", get(handlers::related_articles))
        .route(
            "/api/articles/:id/comments",
            get(handlers::list_comments).post(handlers::add_comment),
        )
        .route(
            "/api/genres",
            get(handlers::list_genres).post(handlers::create_genre),
        )
        .nest_service("/media", ServeDir::new(media_dir.as_ref()))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(middleware::from_fn(request_context::request_context_middleware))
        .layer(cors)
}
