use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use http::StatusCode;
use serde::Deserialize;
use tracing::info;

use crate::config::settings::SettingsConfig;
use crate::error::SyncError;
use crate::observability::metrics::{get_metrics, Metrics};
use crate::observability::routes::MetricsState;
use crate::sinks::{AppendClient, AppendOutcome, Row};

#[derive(Clone)]
pub struct AppState {
    pub metrics_state: MetricsState,
    pub append_client: Arc<AppendClient>,
}

impl AppState {
    pub fn new(metrics: &Metrics, append_client: Arc<AppendClient>) -> Self {
        Self {
            metrics_state: MetricsState::new(metrics.registry.clone()),
            append_client,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AppendBody {
    pub values: Vec<Row>,
}

pub fn router(state: AppState, settings_config: &SettingsConfig) -> Router {
    Router::new()
        .route("/append/{destination}", post(append_rows))
        .route("/healthz", get(|| async { "ok" }))
        .merge(state.metrics_state.router(&settings_config.metrics))
        .with_state(state)
}

/// Local sync sidecar: accepts row batches and mirrors them remotely.
pub async fn start(
    settings_config: &SettingsConfig,
    append_client: Arc<AppendClient>,
) -> Result<()> {
    let metrics = get_metrics().await;
    let app = router(AppState::new(metrics, append_client), settings_config);

    let address = format!(
        "{}:{}",
        settings_config.server.host, settings_config.server.port
    );
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {}", address))?;
    info!("sidecar listening on {}", address);

    metrics.up.set(1);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("sidecar server failed")?;
    metrics.up.set(0);
    info!("sidecar stopped");
    Ok(())
}

async fn append_rows(
    State(state): State<AppState>,
    Path(destination): Path<String>,
    Json(body): Json<AppendBody>,
) -> impl IntoResponse {
    let outcome = state.append_client.append(&destination, body.values).await;
    (outcome_status(&outcome), Json(outcome))
}

pub fn outcome_status(outcome: &AppendOutcome) -> StatusCode {
    match outcome {
        AppendOutcome::Appended { .. } => StatusCode::OK,
        AppendOutcome::Skipped { .. } => StatusCode::ACCEPTED,
        AppendOutcome::Failed { error, .. } if error.is_rejected_locally() => {
            StatusCode::BAD_REQUEST
        }
        AppendOutcome::Failed {
            error: SyncError::Configuration(_),
            ..
        } => StatusCode::SERVICE_UNAVAILABLE,
        AppendOutcome::Failed { .. } => StatusCode::BAD_GATEWAY,
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
