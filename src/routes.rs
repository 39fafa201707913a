// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{progress, quiz},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Quiz routes: chapter stats are public, everything else needs a token.
/// * Progress routes: all protected.
/// * Global middleware: Trace, CORS.
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let quiz_routes = Router::new()
        .route("/{topic}/{chapter}/stats", get(quiz::get_stats))
        // Protected quiz routes
        .merge(
            Router::new()
                .route("/history", get(quiz::get_history))
                .route("/review/{session_id}", get(quiz::get_review))
                .route("/{topic}/{chapter}", get(quiz::get_quiz))
                .route("/{topic}/{chapter}/submit", post(quiz::submit_quiz))
                .layer(auth.clone()),
        );

    let progress_routes = Router::new()
        .route(
            "/",
            get(progress::get_overall_progress).post(progress::update_progress),
        )
        .route("/next", get(progress::get_next_chapter))
        .route("/chapters", get(progress::list_chapters))
        .route("/{topic}", get(progress::get_topic_progress))
        .layer(auth);

    Router::new()
        .nest("/api/quiz", quiz_routes)
        .nest("/api/progress", progress_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
