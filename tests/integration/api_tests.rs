use super::*;
use axum::http::{Method, StatusCode};
use serde_json::json;

fn encoded(url: &str) -> String {
    url::form_urlencoded::byte_serialize(url.as_bytes()).collect()
}

#[tokio::test]
async fn test_health_check() -> anyhow::Result<()> {
    let app = create_test_app().await?;

    let (status, body) = make_request(&app.router, Method::GET, "/health", None).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["tracked_items"], 0);
    Ok(())
}

#[tokio::test]
async fn test_add_and_list_items() -> anyhow::Result<()> {
    let app = create_test_app().await?;

    let (status, body) = make_request(
        &app.router,
        Method::POST,
        "/api/v1/items",
        Some(json!({"url": ETB_URL, "nickname": "etb"})),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["url"], ETB_URL);
    assert!(body["data"]["lastStatus"].is_null());

    make_request(&app.router, Method::POST, "/api/v1/items", Some(json!({"url": BOOSTER_URL}))).await?;

    let (status, body) = make_request(&app.router, Method::GET, "/api/v1/items", None).await?;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert!(items.iter().any(|i| i["host"] == "www.mediamarkt.nl"));
    assert!(items.iter().any(|i| i["nickname"] == "etb"));

    // persisted straight away in the documented shape
    let saved: Value = serde_json::from_str(&std::fs::read_to_string(app.state_path())?)?;
    assert_eq!(saved["items"][ETB_URL]["nickname"], "etb");
    assert!(saved["items"][BOOSTER_URL]["lastStatus"].is_null());
    Ok(())
}

#[tokio::test]
async fn test_add_rejects_foreign_or_malformed_urls() -> anyhow::Result<()> {
    let app = create_test_app().await?;

    let (status, body) = make_request(
        &app.router,
        Method::POST,
        "/api/v1/items",
        Some(json!({"url": "https://www.amazon.nl/dp/B0000"})),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (status, _) = make_request(
        &app.router,
        Method::POST,
        "/api/v1/items",
        Some(json!({"url": "bol.com/p/1"})),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(app.store.list_items().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_duplicate_add_conflicts() -> anyhow::Result<()> {
    let app = create_test_app().await?;
    let request = json!({"url": ETB_URL, "nickname": "etb"});

    let (status, _) = make_request(&app.router, Method::POST, "/api/v1/items", Some(request.clone())).await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = make_request(&app.router, Method::POST, "/api/v1/items", Some(request)).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(app.store.list_items().await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_remove_by_nickname_and_encoded_url() -> anyhow::Result<()> {
    let app = create_test_app().await?;
    app.store.add_item(ETB_URL, Some("Elite".to_string())).await?;
    app.store.add_item(BOOSTER_URL, None).await?;

    let (status, body) = make_request(&app.router, Method::DELETE, "/api/v1/items/elite", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["url"], ETB_URL);

    let uri = format!("/api/v1/items/{}", encoded(BOOSTER_URL));
    let (status, _) = make_request(&app.router, Method::DELETE, &uri, None).await?;
    assert_eq!(status, StatusCode::OK);

    assert!(app.store.list_items().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_remove_unknown_is_not_found() -> anyhow::Result<()> {
    let app = create_test_app().await?;
    app.store.add_item(ETB_URL, Some("etb".to_string())).await?;

    let (status, body) = make_request(&app.router, Method::DELETE, "/api/v1/items/charizard", None).await?;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert_eq!(app.store.list_items().await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_interval_is_clamped() -> anyhow::Result<()> {
    let app = create_test_app().await?;

    let (status, body) = make_request(
        &app.router,
        Method::PUT,
        "/api/v1/settings/interval",
        Some(json!({"minutes": 0})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["intervalSeconds"], 60);

    make_request(
        &app.router,
        Method::PUT,
        "/api/v1/settings/interval",
        Some(json!({"minutes": 10})),
    )
    .await?;

    let (_, body) = make_request(&app.router, Method::GET, "/api/v1/settings", None).await?;
    assert_eq!(body["data"]["intervalSeconds"], 600);
    assert_eq!(body["data"]["intervalMinutes"], 10);

    let saved: Value = serde_json::from_str(&std::fs::read_to_string(app.state_path())?)?;
    assert_eq!(saved["intervalSeconds"], 600);
    Ok(())
}

#[tokio::test]
async fn test_alert_sink_set_and_clear() -> anyhow::Result<()> {
    let app = create_test_app().await?;

    let (status, body) = make_request(
        &app.router,
        Method::PUT,
        "/api/v1/settings/alert-sink",
        Some(json!({"sink": "https://discord.com/api/webhooks/1/abc"})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["alertSink"], "https://discord.com/api/webhooks/1/abc");

    let (_, body) = make_request(
        &app.router,
        Method::PUT,
        "/api/v1/settings/alert-sink",
        Some(json!({"sink": null})),
    )
    .await?;
    assert!(body["data"]["alertSink"].is_null());
    assert_eq!(app.store.alert_sink().await, None);
    Ok(())
}

#[tokio::test]
async fn test_diagnostic_check_reports_status() -> anyhow::Result<()> {
    let app = create_test_app().await?;
    app.fetcher.set(ETB_URL, IN_STOCK_PAGE);

    let (status, body) = make_request(&app.router, Method::POST, "/api/v1/check", Some(json!({"url": ETB_URL}))).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "InStock");
    assert_eq!(body["data"]["title"], "Elite Trainer Box");
    assert_eq!(body["data"]["fetched"], true);
    assert!(app.store.list_items().await.is_empty());
    Ok(())
}
