use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use std::sync::Arc;
use tandem_server::{
    AppState, CacheFacade, CachePolicy, CatalogStore, DistributedCache, DistributedCacheConfig,
    LocalCache, LocalCacheConfig, config::RouteTtlConfig, create_router,
};
use tower::ServiceExt;

fn test_app() -> (AppState, Router) {
    let facade = Arc::new(CacheFacade::new(
        LocalCache::new(LocalCacheConfig::default()),
        DistributedCache::new(DistributedCacheConfig::default()),
        CachePolicy::default(),
    ));
    let state = AppState::new(
        facade,
        CatalogStore::new(),
        RouteTtlConfig::default(),
        "test".to_string(),
    );
    let app = create_router(state.clone());
    (state, app)
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_reports_distributed_state() {
    let (_state, app) = test_app();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "tandem");
    assert_eq!(body["cache"]["distributed"], "disconnected");
}

#[tokio::test]
async fn test_performance_payload_shape() {
    let (state, app) = test_app();

    state.facade.write("key1", b"v".to_vec(), 60, false).await;
    state.facade.read("key1", false).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/performance")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["environment"], "test");
    assert_eq!(body["cache"]["local"]["entries"], 1);
    assert_eq!(body["cache"]["local"]["hits"], 1);
    assert_eq!(body["cache"]["distributed_enabled"], false);
    assert!(body["uptime_secs"].is_u64());
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_cache_clear_with_pattern() {
    let (state, app) = test_app();

    state.facade.write("products:a", b"1".to_vec(), 60, false).await;
    state.facade.write("products:b", b"2".to_vec(), 60, false).await;
    state.facade.write("other:c", b"3".to_vec(), 60, false).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/cache/clear?pattern=products")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert!(body["message"].as_str().unwrap().contains("2"));

    assert!(state.facade.read("products:a", false).await.is_none());
    assert!(state.facade.read("other:c", false).await.is_some());
}

#[tokio::test]
async fn test_cache_clear_without_pattern_flushes_everything() {
    let (state, app) = test_app();

    state.facade.write("products:a", b"1".to_vec(), 60, false).await;
    state.facade.write("other:c", b"2".to_vec(), 60, false).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/cache/clear")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["success"], true);

    assert!(state.facade.read("products:a", false).await.is_none());
    assert!(state.facade.read("other:c", false).await.is_none());
    assert_eq!(state.facade.stats().local.entries, 0);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (state, app) = test_app();

    // Generate some traffic so the counters exist
    state.facade.write("key1", b"v".to_vec(), 60, false).await;
    state.facade.read("key1", false).await;

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("tandem_cache_operations_total"));
}
