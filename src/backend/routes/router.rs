/**
 * Router Configuration
 *
 * ```text
 * GET  /health                   public
 * GET  /socket                   token checked before the upgrade
 * /api/v1/notifications/...      auth_middleware
 * /api/v1/messages/...           auth_middleware
 * /api/v1/channels/...           auth_middleware
 * /api/v1/calls/...              auth_middleware
 * ```
 *
 * CORS admits `FRONTEND_URL` with credentials, and every request is traced.
 */

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::backend::middleware::auth_middleware;
use crate::backend::realtime::socket_handler;
use crate::backend::server::state::AppState;
use crate::backend::{calls, channels, messaging, notifications};

pub fn create_router(app_state: AppState) -> Router<()> {
    let api = Router::new()
        .nest("/notifications", notifications::routes())
        .nest("/messages", messaging::routes())
        .nest("/channels", channels::routes())
        .nest("/calls", calls::routes())
        .route_layer(from_fn_with_state(app_state.clone(), auth_middleware));

    let cors = cors_layer(&app_state.config.frontend_url);

    Router::new()
        .route("/health", get(health))
        .route("/socket", get(socket_handler))
        .nest("/api/v1", api)
        .fallback(not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

fn cors_layer(frontend_url: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    match HeaderValue::from_str(frontend_url) {
        Ok(origin) => cors.allow_origin(origin),
        Err(e) => {
            tracing::warn!("Invalid FRONTEND_URL {:?} for CORS: {}", frontend_url, e);
            cors
        }
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "success": true, "status": "ok" }))
}

async fn not_found() -> (axum::http::StatusCode, Json<Value>) {
    (
        axum::http::StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "message": "Route not found" })),
    )
}
