// Shared fixtures for the integration tests

pub mod api_tests;
pub mod sweep_tests;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;

use stock_watcher::plugins::traits::{NotificationResult, Notifier, StockChangeEvent};
use stock_watcher::web::{create_router, AppState};
use stock_watcher::{AppError, PageFetcher, StatusExtractor, StockChecker, TrackingStore};

pub const ETB_URL: &str = "https://www.bol.com/nl/nl/p/pokemon-elite-trainer-box/9300000001/";
pub const BOOSTER_URL: &str = "https://www.mediamarkt.nl/nl/product/_booster-box-1234.html";

pub const IN_STOCK_PAGE: &str = r#"<html><head><title>bol.com</title>
<script type="application/ld+json">
{"@type":"Product","name":"Elite Trainer Box","offers":{"@type":"Offer","availability":"https://schema.org/InStock"}}
</script></head><body><p>Op voorraad</p></body></html>"#;

pub const OUT_OF_STOCK_PAGE: &str =
    "<html><head><title>Booster Box | MediaMarkt</title></head><body><div>Tijdelijk uitverkocht</div></body></html>";

/// Serves canned pages by url. Unknown urls fail like a network error.
#[derive(Default)]
pub struct StaticFetcher {
    pages: Mutex<HashMap<String, String>>,
}

impl StaticFetcher {
    pub fn set(&self, url: &str, body: &str) {
        self.pages.lock().unwrap().insert(url.to_string(), body.to_string());
    }

    pub fn clear(&self, url: &str) {
        self.pages.lock().unwrap().remove(url);
    }
}

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> stock_watcher::Result<String> {
        self.pages.lock().unwrap().get(url).cloned().ok_or_else(|| AppError::Fetch {
            url: url.to_string(),
            reason: "no canned page".to_string(),
        })
    }
}

/// Keeps every delivered event in memory.
#[derive(Default)]
pub struct RecordingNotifier {
    pub events: Mutex<Vec<(String, StockChangeEvent)>>,
}

impl RecordingNotifier {
    pub fn delivered(&self) -> Vec<(String, StockChangeEvent)> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn notify(&self, sink: &str, event: &StockChangeEvent) -> stock_watcher::Result<NotificationResult> {
        self.events.lock().unwrap().push((sink.to_string(), event.clone()));
        Ok(NotificationResult {
            success: true,
            message_id: None,
            error: None,
        })
    }
}

pub struct TestApp {
    pub dir: TempDir,
    pub store: Arc<TrackingStore>,
    pub fetcher: Arc<StaticFetcher>,
    pub notifier: Arc<RecordingNotifier>,
    pub checker: Arc<StockChecker>,
    pub router: Router,
}

impl TestApp {
    pub fn state_path(&self) -> std::path::PathBuf {
        self.dir.path().join("stock_state.json")
    }
}

pub async fn create_test_app() -> anyhow::Result<TestApp> {
    let dir = TempDir::new()?;
    let store = Arc::new(
        TrackingStore::open(
            dir.path().join("stock_state.json"),
            vec!["bol.com".to_string(), "mediamarkt".to_string()],
            60,
        )
        .await,
    );

    let fetcher = Arc::new(StaticFetcher::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let checker = Arc::new(StockChecker::new(
        fetcher.clone(),
        StatusExtractor::new(),
        notifier.clone(),
    ));
    let router = create_router(AppState::new(store.clone(), checker.clone()));

    Ok(TestApp {
        dir,
        store,
        fetcher,
        notifier,
        checker,
        router,
    })
}

/// Send one request and decode the JSON body.
pub async fn make_request(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> anyhow::Result<(StatusCode, Value)> {
    let mut request = Request::builder().method(method).uri(uri);
    if body.is_some() {
        request = request.header("content-type", "application/json");
    }
    let request = request.body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))?;

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };

    Ok((status, json))
}
