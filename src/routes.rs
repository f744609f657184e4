// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, chat, profile, quiz, results, subjects},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Nests all sub-routers (auth, profile, quiz, results, chat, admin).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (pool, config, chat assistant).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let require_auth = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .merge(
            Router::new()
                .route("/logout", post(auth::logout))
                .route_layer(require_auth.clone()),
        );

    let profile_routes = Router::new()
        .route("/me", get(profile::get_me))
        .route("/stats", get(profile::get_stats))
        .route_layer(require_auth.clone());

    let quiz_routes = Router::new()
        .route("/paper", get(quiz::get_paper))
        .route("/submit", post(quiz::submit_paper))
        .route_layer(require_auth.clone());

    let result_routes = Router::new()
        .route("/", get(results::list_results))
        .route("/latest", get(results::latest_result))
        .route("/{id}", get(results::get_result))
        .route_layer(require_auth.clone());

    let chat_routes = Router::new()
        .route("/", post(chat::chat))
        .route_layer(require_auth.clone());

    let admin_routes = Router::new()
        .route(
            "/questions",
            get(admin::list_questions).post(admin::create_question),
        )
        .route("/questions/{id}", delete(admin::delete_question))
        .route("/subjects", post(admin::create_subject))
        .route(
            "/duration-policy",
            get(admin::get_duration_policy).put(admin::update_duration_policy),
        )
        .route("/stats", get(admin::get_stats))
        .route("/students", get(admin::list_students))
        .route("/students/{id}", delete(admin::delete_student))
        .route("/students/{id}/results", get(admin::list_student_results))
        // Double middleware protection: Auth first, then Admin check
        .route_layer(middleware::from_fn(admin_middleware))
        .route_layer(require_auth);

    Router::new()
        .nest("/api/auth", auth_routes)
        .route("/api/subjects", get(subjects::list_subjects))
        .nest("/api/profile", profile_routes)
        .nest("/api/quiz", quiz_routes)
        .nest("/api/results", result_routes)
        .nest("/api/chat", chat_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
