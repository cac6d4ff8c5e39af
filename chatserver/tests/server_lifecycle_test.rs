//! Lifecycle tests: the server on a real socket, from start to graceful shutdown

mod helpers;

use serde_json::Value;
use std::time::Duration;
use tokio::sync::oneshot;

use chatserver::ChatServer;
use chatserver::core::{AnalyticsCache, CacheConfig};
use chatserver::types::AssistantIds;
use shared::MessageId;

use helpers::*;

fn fast_cache() -> AnalyticsCache {
    AnalyticsCache::with_config(CacheConfig {
        entry_ttl: Duration::from_millis(30),
        sweep_interval: Duration::from_millis(20),
        delivered_grace: Duration::from_millis(20),
    })
}

#[tokio::test]
async fn test_serve_runs_sweeper_until_graceful_shutdown() {
    let server = ChatServer::new(
        test_address(),
        AssistantIds::new(Some(MAIN_ASSISTANT.into()), None, None),
        ScriptedAssistant::new("hola"),
        fast_cache(),
    );
    let cache = server.state().analytics_cache.clone();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let running = server.clone();
    let handle = tokio::spawn(async move {
        running
            .serve(listener, async {
                let _ = stop_rx.await;
            })
            .await
    });

    // Answers over HTTP while running
    let health: Value = reqwest::get(format!("http://{addr}/api/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert!(server.state().is_running());

    // The sweeper evicts stale entries in the background
    cache.insert_pending(&MessageId::from("msg_stale")).await;
    let swept = wait_for_condition(
        || {
            let cache = cache.clone();
            async move { cache.is_empty().await }
        },
        1000,
    )
    .await;
    assert!(swept);

    stop_tx.send(()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
    assert!(result.is_ok());
    assert!(!server.state().is_running());

    // No sweeper after shutdown
    cache.insert_pending(&MessageId::from("msg_after_stop")).await;
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert!(cache.get(&MessageId::from("msg_after_stop")).await.is_some());
}

#[tokio::test]
async fn test_run_reports_bind_failure() {
    let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let server = ChatServer::new(
        taken.local_addr().unwrap(),
        AssistantIds::default(),
        ScriptedAssistant::new("hola"),
        AnalyticsCache::new(),
    );

    let result = server.run(std::future::pending::<()>()).await;
    assert!(matches!(result, Err(chatserver::ChatServerError::ServerStartup(_))));
}
