use super::*;
use stock_watcher::config::ScraperConfig;
use stock_watcher::plugins::notifiers::DiscordNotifier;
use stock_watcher::{StockStatus, SweepScheduler, SweepTiming, WebScraper};
use tokio::sync::watch;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn no_pauses() -> SweepTiming {
    SweepTiming {
        item_jitter_min_ms: 0,
        item_jitter_max_ms: 0,
        sweep_jitter_max_secs: 0,
        startup_grace_secs: 0,
    }
}

fn scheduler_for(app: &TestApp) -> SweepScheduler {
    SweepScheduler::new(app.store.clone(), app.checker.clone(), no_pauses())
}

#[tokio::test]
async fn test_restock_lifecycle_alerts_once_per_transition() -> anyhow::Result<()> {
    let app = create_test_app().await?;
    app.store.add_item(BOOSTER_URL, Some("booster".to_string())).await?;
    app.store.set_alert_sink(Some("hook".to_string())).await?;
    let scheduler = scheduler_for(&app);
    let (_tx, mut rx) = watch::channel(false);

    // first sighting out of stock: silent
    app.fetcher.set(BOOSTER_URL, OUT_OF_STOCK_PAGE);
    let summary = scheduler.run_sweep(&mut rx).await;
    assert_eq!(summary.checked, 1);
    assert!(app.notifier.delivered().is_empty());

    // restock
    app.fetcher.set(BOOSTER_URL, IN_STOCK_PAGE);
    scheduler.run_sweep(&mut rx).await;
    let delivered = app.notifier.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].0, "hook");
    assert_eq!(delivered[0].1.previous, StockStatus::OutOfStock);
    assert_eq!(delivered[0].1.current, StockStatus::InStock);
    assert_eq!(delivered[0].1.site, "www.mediamarkt.nl");

    // unchanged
    scheduler.run_sweep(&mut rx).await;
    assert_eq!(app.notifier.delivered().len(), 1);

    // page goes away: change into Unknown still alerts, title is kept
    app.fetcher.clear(BOOSTER_URL);
    scheduler.run_sweep(&mut rx).await;
    let delivered = app.notifier.delivered();
    assert_eq!(delivered.len(), 2);
    assert_eq!(delivered[1].1.current, StockStatus::Unknown);
    assert_eq!(delivered[1].1.title, "Elite Trainer Box");

    let item = app.store.get(BOOSTER_URL).await.unwrap();
    assert_eq!(item.last_status, Some(StockStatus::Unknown));
    assert_eq!(item.last_title.as_deref(), Some("Elite Trainer Box"));
    Ok(())
}

#[tokio::test]
async fn test_first_sighting_in_stock_alerts_with_unknown_previous() -> anyhow::Result<()> {
    let app = create_test_app().await?;
    app.store.add_item(ETB_URL, None).await?;
    app.store.set_alert_sink(Some("hook".to_string())).await?;
    app.fetcher.set(ETB_URL, IN_STOCK_PAGE);
    let (_tx, mut rx) = watch::channel(false);

    scheduler_for(&app).run_sweep(&mut rx).await;

    let delivered = app.notifier.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].1.previous, StockStatus::Unknown);
    assert_eq!(delivered[0].1.title, "Elite Trainer Box");
    Ok(())
}

#[tokio::test]
async fn test_state_survives_restart() -> anyhow::Result<()> {
    let app = create_test_app().await?;
    app.store.add_item(ETB_URL, Some("etb".to_string())).await?;
    app.store.add_item(BOOSTER_URL, None).await?;
    app.store.set_interval(15).await?;
    app.fetcher.set(ETB_URL, IN_STOCK_PAGE);
    app.fetcher.set(BOOSTER_URL, OUT_OF_STOCK_PAGE);
    let (_tx, mut rx) = watch::channel(false);

    scheduler_for(&app).run_sweep(&mut rx).await;
    tokio_test::assert_ok!(app.store.save().await);

    let reopened = TrackingStore::open(app.state_path(), vec!["bol.com".to_string()], 60).await;
    assert_eq!(reopened.snapshot().await, app.store.snapshot().await);
    assert_eq!(reopened.interval_secs().await, 900);
    assert_eq!(
        reopened.get(BOOSTER_URL).await.unwrap().last_title.as_deref(),
        Some("Booster Box | MediaMarkt")
    );
    Ok(())
}

#[tokio::test]
async fn test_end_to_end_with_http_fetch_and_webhook() -> anyhow::Result<()> {
    let shop = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/p/etb"))
        .respond_with(ResponseTemplate::new(200).set_body_string(OUT_OF_STOCK_PAGE))
        .up_to_n_times(1)
        .mount(&shop)
        .await;
    Mock::given(method("GET"))
        .and(path("/p/etb"))
        .respond_with(ResponseTemplate::new(200).set_body_string(IN_STOCK_PAGE))
        .mount(&shop)
        .await;

    let discord = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/webhooks/1/token"))
        .and(body_partial_json(json_username()))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&discord)
        .await;

    let dir = TempDir::new()?;
    let store = Arc::new(TrackingStore::open(dir.path().join("state.json"), vec!["127.0.0.1".to_string()], 60).await);
    let page_url = format!("{}/p/etb", shop.uri());
    store.add_item(&page_url, None).await?;
    store
        .set_alert_sink(Some(format!("{}/api/webhooks/1/token", discord.uri())))
        .await?;

    let checker = Arc::new(StockChecker::new(
        Arc::new(WebScraper::new(&ScraperConfig::default())?),
        StatusExtractor::new(),
        Arc::new(DiscordNotifier::new("Stock Watcher")?),
    ));
    let scheduler = SweepScheduler::new(store.clone(), checker, no_pauses());
    let (_tx, mut rx) = watch::channel(false);

    scheduler.run_sweep(&mut rx).await;
    assert_eq!(store.get(&page_url).await.unwrap().last_status, Some(StockStatus::OutOfStock));

    let summary = scheduler.run_sweep(&mut rx).await;
    assert_eq!(summary.alerts, 1);
    assert_eq!(summary.notified, 1);
    assert_eq!(store.get(&page_url).await.unwrap().last_status, Some(StockStatus::InStock));
    Ok(())
}

fn json_username() -> serde_json::Value {
    serde_json::json!({"username": "Stock Watcher"})
}
