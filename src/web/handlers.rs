use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{ApiError, ApiResponse, AppState, CheckView, HealthResponse, ItemView, SettingsView};

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct AddItemRequest {
    #[validate(url)]
    pub url: String,
    #[validate(length(max = 64))]
    pub nickname: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct IntervalRequest {
    pub minutes: i64,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct AlertSinkRequest {
    #[validate(length(max = 2048))]
    pub sink: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct CheckRequest {
    #[validate(url)]
    pub url: String,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let tracked_items = state.store.tracked_urls().await.len();
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: (chrono::Utc::now() - state.started_at).num_seconds(),
        tracked_items,
    })
}

pub async fn list_items(State(state): State<AppState>) -> Json<ApiResponse<Vec<ItemView>>> {
    let items: Vec<ItemView> = state
        .store
        .list_items()
        .await
        .into_iter()
        .map(ItemView::from)
        .collect();

    tracing::debug!(count = items.len(), "Listing tracked items");
    Json(ApiResponse::success(items))
}

pub async fn add_item(
    State(state): State<AppState>,
    Json(request): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ItemView>>), ApiError> {
    request.validate()?;

    let item = state.store.add_item(&request.url, request.nickname).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(item.into()))))
}

/// `identifier` is a percent-encoded url or a nickname.
pub async fn remove_item(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Result<Json<ApiResponse<ItemView>>, ApiError> {
    if identifier.trim().is_empty() {
        return Err(ApiError::bad_request("Item identifier is required"));
    }

    let removed = state.store.remove_item(&identifier).await?;
    Ok(Json(ApiResponse::success(removed.into())))
}

pub async fn get_settings(State(state): State<AppState>) -> Json<ApiResponse<SettingsView>> {
    Json(ApiResponse::success(settings_view(&state).await))
}

pub async fn set_interval(
    State(state): State<AppState>,
    Json(request): Json<IntervalRequest>,
) -> Result<Json<ApiResponse<SettingsView>>, ApiError> {
    state.store.set_interval(request.minutes).await?;
    Ok(Json(ApiResponse::success(settings_view(&state).await)))
}

pub async fn set_alert_sink(
    State(state): State<AppState>,
    Json(request): Json<AlertSinkRequest>,
) -> Result<Json<ApiResponse<SettingsView>>, ApiError> {
    request.validate()?;

    state.store.set_alert_sink(request.sink).await?;
    Ok(Json(ApiResponse::success(settings_view(&state).await)))
}

/// Fetch and classify a page once without touching stored state.
pub async fn check_now(
    State(state): State<AppState>,
    Json(request): Json<CheckRequest>,
) -> Result<Json<ApiResponse<CheckView>>, ApiError> {
    request.validate()?;

    tracing::info!(url = %request.url, "Running diagnostic check");
    let (observation, fetched) = state.checker.observe(&request.url).await;

    Ok(Json(ApiResponse::success(CheckView {
        url: request.url,
        fetched,
        status: observation.status,
        title: observation.title,
        checked_at: observation.checked_at,
    })))
}

async fn settings_view(state: &AppState) -> SettingsView {
    let interval_seconds = state.store.interval_secs().await;
    SettingsView {
        interval_seconds,
        interval_minutes: interval_seconds / 60,
        alert_sink: state.store.alert_sink().await,
    }
}
