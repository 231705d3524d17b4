//! HTTP surface: the Pub/Sub push endpoint and a health probe.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::pipeline::{IngestionOrchestrator, Trigger};

#[derive(Clone)]
struct AppState {
    orchestrator: Arc<IngestionOrchestrator>,
}

/// Build the Axum router for push delivery.
pub fn routes(orchestrator: Arc<IngestionOrchestrator>) -> Router {
    Router::new()
        .route("/pubsub", post(pubsub_push))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { orchestrator })
}

async fn health() -> &'static str {
    "ok"
}

/// Run one pass per push. A 200 acknowledges the delivery; a 500 makes
/// Pub/Sub redeliver, which only helps when the run itself was fatal.
async fn pubsub_push(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let trigger = Trigger::from_push_body(&body);
    match state.orchestrator.run(&trigger).await {
        Ok(report) => (StatusCode::OK, Json(serde_json::json!(report))),
        Err(e) => {
            error!(error = %e, "Ingestion run failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
        }
    }
}
