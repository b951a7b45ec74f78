//! Router setup with all API routes and middleware.
//!
//! Configures the axum Router with CORS, tracing, compression, and all
//! endpoint handlers. The server binds to localhost only.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS: allow localhost frontend origins (dev server convention is the
    // API port plus one).
    let port = state.config.server.port;
    let dev_port = port.saturating_add(1);
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list([
            format!("http://127.0.0.1:{}", port)
                .parse::<HeaderValue>()
                .expect("static origin"),
            format!("http://localhost:{}", port)
                .parse::<HeaderValue>()
                .expect("static origin"),
            format!("http://127.0.0.1:{}", dev_port)
                .parse::<HeaderValue>()
                .expect("static origin"),
            format!("http://localhost:{}", dev_port)
                .parse::<HeaderValue>()
                .expect("static origin"),
        ]))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    let chat_routes = Router::new()
        .route(
            "/chat/sessions",
            get(handlers::list_sessions).post(handlers::create_session),
        )
        .route("/chat/sessions/by_model", get(handlers::sessions_by_model))
        .route("/chat/sessions/stats", get(handlers::session_stats))
        .route("/chat/sessions/{id}/messages", post(handlers::send_message))
        .route("/chat/sessions/{id}/history", get(handlers::get_history))
        .route("/chat/sessions/{id}/export", get(handlers::export_session))
        .route(
            "/chat/sessions/{id}/title",
            axum::routing::patch(handlers::update_title),
        )
        .route("/chat/sessions/{id}", delete(handlers::delete_session))
        .route("/chat/messages/{id}", put(handlers::edit_message));

    let model_routes = Router::new()
        .route("/models/local", get(handlers::local_models))
        .route("/models/running", get(handlers::running_models))
        .route("/models/info", get(handlers::model_info))
        .route("/models/remove", delete(handlers::remove_model))
        .route("/models/pull", post(handlers::pull_model));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(chat_routes)
        .merge(model_routes)
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1MB global limit
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server on the configured address.
///
/// Binds to 127.0.0.1 (localhost only) on the port from config.
pub async fn start_server(state: AppState) -> Result<(), hearth_core::error::HearthError> {
    let addr = format!("127.0.0.1:{}", state.config.server.port);

    let router = create_router(state);

    tracing::info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| hearth_core::error::HearthError::Api(format!("Failed to bind: {}", e)))?;

    axum::serve(listener, router)
        .await
        .map_err(|e| hearth_core::error::HearthError::Api(format!("Server error: {}", e)))?;

    Ok(())
}
