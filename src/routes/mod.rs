pub mod auth_routes;
pub mod dispatch_routes;
pub mod field_ops_routes;
pub mod invoice_routes;
pub mod issue_routes;
pub mod media_routes;
pub mod realtime_routes;

use axum::{
    extract::DefaultBodyLimit, middleware::from_fn_with_state, response::Json, routing::{get, post}, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::middleware::{auth_middleware, cors_middleware};
use crate::state::AppState;

/// Router completo de la API
pub fn create_app_router(state: AppState) -> Router {
    let protected = Router::new()
        .nest("/api/auth", auth_routes::create_auth_router())
        .nest("/api/technicians", auth_routes::create_technician_router())
        .nest("/api/issues", issue_routes::create_issue_router())
        .nest("/api/dispatch", dispatch_routes::create_dispatch_router())
        .nest("/api/attendance", field_ops_routes::create_attendance_router())
        .nest("/api/locations", field_ops_routes::create_location_router())
        .nest("/api/inventory", field_ops_routes::create_inventory_router())
        .nest("/api/notifications", field_ops_routes::create_notification_router())
        .nest("/api/invoices", invoice_routes::create_invoice_router())
        .nest("/api/uploads", media_routes::create_upload_router())
        .nest("/api/alerts", media_routes::create_alert_router())
        .nest("/api/realtime", realtime_routes::create_realtime_router())
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let public = Router::new()
        .route("/health", get(health))
        .route("/api/auth/login", post(auth_routes::login));

    // Margen sobre el tamaño máximo de imagen para las cabeceras multipart
    let body_limit = state.config.max_upload_bytes + 64 * 1024;

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_middleware(&state.config.cors_origins))
                .layer(CompressionLayer::new())
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

/// Health check sin tocar la base de datos
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
