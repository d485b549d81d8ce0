use std::path::Path;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{auth::session_middleware, handlers, state::AppState};

pub fn build_router(state: AppState, static_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/", get(handlers::list_blogs))
        .route(
            "/api/blogs",
            get(handlers::list_blogs).post(handlers::create_blog),
        )
        .route(
            "/api/blogs/{id}",
            get(handlers::get_blog).post(handlers::update_blog),
        )
        .route("/api/blogs/{id}/delete", post(handlers::delete_blog))
        .route("/api/blogs/{id}/comments", post(handlers::create_comment))
        .route("/api/comments", get(handlers::list_comments))
        .route("/api/comments/{id}/delete", post(handlers::delete_comment))
        .route(
            "/api/users",
            get(handlers::list_users).post(handlers::register),
        )
        .route("/api/authenticate", post(handlers::authenticate))
        .route("/signout", get(handlers::signout))
        .nest_service("/static", ServeDir::new(static_dir.as_ref()))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
