// HTTP request handlers
use crate::domain::wallbox::ChargeMode;
use crate::error::DashboardError;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::infrastructure::snapshot_stream::stream_from_receiver;
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Deserialize)]
pub struct ModeQuery {
    pub mode: String,
}

#[derive(Deserialize)]
pub struct LimitQuery {
    pub limit: f64,
}

#[derive(Serialize)]
pub struct SettingsVisibility {
    pub settings_visible: bool,
}

fn error_response(e: DashboardError) -> Response {
    let status = match e {
        DashboardError::InvalidInput(_) | DashboardError::UnsupportedManufacturer(_) => {
            StatusCode::BAD_REQUEST
        }
        DashboardError::Transport { .. }
        | DashboardError::Status { .. }
        | DashboardError::MalformedBody { .. } => StatusCode::BAD_GATEWAY,
    };
    (status, e.to_string()).into_response()
}

fn into_response(result: Result<Response, StatusCode>) -> Response {
    match result {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Full view-model snapshot
pub async fn get_dashboard(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let view = state.view.snapshot();
    into_response(json_response(&view, accepts_brotli(&headers)).await)
}

pub async fn get_chart(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let series = state.history.renderable();
    into_response(json_response(&series, accepts_brotli(&headers)).await)
}

pub async fn get_console(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let lines = state.console.lines();
    into_response(json_response(&lines, accepts_brotli(&headers)).await)
}

/// Streams the current snapshot and then one line per change
pub async fn stream_dashboard(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let rx = state.view.subscribe();
    stream_from_receiver(state.view.snapshot(), rx)
}

pub async fn set_mode(
    Query(query): Query<ModeQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let mode = match query.mode.as_str() {
        "automatic" => ChargeMode::Automatic,
        "manual" => ChargeMode::Manual,
        other => {
            return (StatusCode::BAD_REQUEST, format!("unknown mode '{}'", other)).into_response();
        }
    };

    match state.wallbox.set_mode(mode).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn set_limit(
    Query(query): Query<LimitQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match state.wallbox.set_power_limit(query.limit).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn refresh_vehicle(
    Path(alias): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    if !state.vehicles.aliases().contains(&alias) {
        return (StatusCode::NOT_FOUND, format!("unknown vehicle '{}'", alias)).into_response();
    }

    match state.vehicles.refresh_vehicle(&alias).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn toggle_settings(State(state): State<Arc<AppState>>) -> Json<SettingsVisibility> {
    let settings_visible = state.view.update(|view| {
        view.settings_visible = !view.settings_visible;
        view.settings_visible
    });
    Json(SettingsVisibility { settings_visible })
}

pub async fn restart_device(State(state): State<Arc<AppState>>) -> Response {
    match state.device.restart().await {
        Ok(ack) => ack.into_response(),
        Err(e) => error_response(e),
    }
}
