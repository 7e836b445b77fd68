use axum::{
    routing::{delete, get, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::ServerConfig;
use crate::stock_checker::StockChecker;
use crate::store::TrackingStore;

pub mod handlers;
pub mod responses;

pub use handlers::{
    add_item, check_now, get_settings, health_check, list_items, remove_item, set_alert_sink,
    set_interval,
};
pub use responses::*;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<TrackingStore>,
    pub checker: Arc<StockChecker>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(store: Arc<TrackingStore>, checker: Arc<StockChecker>) -> Self {
        Self {
            store,
            checker,
            started_at: Utc::now(),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        // Tracked items
        .route("/items", get(list_items).post(add_item))
        .route("/items/:identifier", delete(remove_item))
        // Settings
        .route("/settings", get(get_settings))
        .route("/settings/interval", put(set_interval))
        .route("/settings/alert-sink", put(set_alert_sink))
        // Diagnostics
        .route("/check", post(check_now))
}

/// Bind the control plane, signal `ready`, then serve until shutdown.
///
/// `ready` is only sent once the listener is bound, so a failed bind leaves
/// the sweep loop parked.
pub async fn serve(
    config: &ServerConfig,
    state: AppState,
    ready: oneshot::Sender<()>,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;
    tracing::info!(address = %listener.local_addr()?, "Control plane listening");

    if ready.send(()).is_err() {
        tracing::warn!("Scheduler dropped before the control plane became ready");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
            tracing::info!("Control plane shutting down");
        })
        .await?;

    Ok(())
}
