pub mod ledger;
pub mod ledger_handlers;
pub mod stock_view_handlers;

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{FromRef, State},
    middleware,
    routing::get,
    Router,
};
use common_auth::JwtVerifier;
use common_observability::LedgerMetrics;
use prometheus::{Encoder, TextEncoder};
use sqlx::PgPool;

pub use ledger_handlers::{adjust_hub_stock, initialize_hub_inventory};
pub use stock_view_handlers::list_hub_stock;

/// Runs `migrations/` on startup and in integration tests.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub const DEFAULT_PAGE_LIMIT: i64 = 10;
pub const MAX_PAGE_LIMIT: i64 = 100;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_verifier: Arc<JwtVerifier>,
    pub metrics: Arc<LedgerMetrics>,
}

impl FromRef<AppState> for Arc<JwtVerifier> {
    fn from_ref(state: &AppState) -> Self {
        state.jwt_verifier.clone()
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn metrics_endpoint(State(state): State<AppState>) -> (axum::http::StatusCode, String) {
    let encoder = TextEncoder::new();
    let families = state.metrics.registry.gather();
    let mut buf = Vec::new();
    if let Err(e) = encoder.encode(&families, &mut buf) {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (
        axum::http::StatusCode::OK,
        String::from_utf8_lossy(&buf).to_string(),
    )
}

/// Error metrics middleware using dedicated state (Arc<LedgerMetrics>) passed
/// via from_fn_with_state; counts >= 400 responses by their X-Error-Code.
async fn error_metrics_mw(
    State(metrics): State<Arc<LedgerMetrics>>,
    req: axum::http::Request<Body>,
    next: middleware::Next,
) -> axum::response::Response {
    let resp = next.run(req).await;
    let status = resp.status();
    if status.as_u16() >= 400 {
        let code = resp
            .headers()
            .get("x-error-code")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown");
        metrics
            .http_errors_total
            .with_label_values(&["hub-inventory-service", code, status.as_str()])
            .inc();
    }
    resp
}

pub fn app_router(state: AppState) -> Router {
    let metrics = state.metrics.clone();
    Router::new()
        .route("/healthz", get(health))
        .route(
            "/hub-inventory",
            get(list_hub_stock)
                .post(initialize_hub_inventory)
                .patch(adjust_hub_stock),
        )
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .layer(middleware::from_fn_with_state(metrics, error_metrics_mw))
}
