//! Scenario 6 (§8): the read endpoint returns exactly the matching
//! chain's events and rejects an invalid integrator address with 400.
//! Drives `http::router` through `tower`'s `oneshot`, no real listener.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use fee_collector_indexer::db::events::EventStore;
use fee_collector_indexer::db::Db;
use fee_collector_indexer::events::FeeEvent;
use fee_collector_indexer::http;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

const INTEGRATOR: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

fn event(chain_id: u64, log_index: u64) -> FeeEvent {
    FeeEvent {
        chain_id,
        contract_address: "0x1111111111111111111111111111111111111111".to_string(),
        token: "0x2222222222222222222222222222222222222222".to_string(),
        integrator: INTEGRATOR.to_string(),
        integrator_fee: "1000000000000000000".to_string(),
        lifi_fee: "500000000000000000".to_string(),
        block_number: 100,
        transaction_hash: format!("0x{}", "cc".repeat(32)),
        log_index,
    }
}

async fn seeded_db() -> Arc<Db> {
    let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
    let db = Arc::new(Db::from_sqlite_pool(pool).await.unwrap());

    let store = EventStore::new(&db);
    store.insert_many(&[event(1, 0)]).await.unwrap();
    store.insert_many(&[event(137, 0)]).await.unwrap();

    db
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn events_by_integrator_returns_only_the_matching_chain() {
    let db = seeded_db().await;
    let app = http::router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/events/integrator/137/{INTEGRATOR}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    assert_eq!(body["success"], true);
    let events = body["data"]["events"].as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["chain_id"], 137);
    assert_eq!(body["meta"]["count"], 1);
    assert!(body["meta"]["timestamp"].is_string());
}

#[tokio::test]
async fn events_by_integrator_rejects_invalid_address() {
    let db = seeded_db().await;
    let app = http::router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/events/integrator/137/invalid")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;

    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("integrator"));
}

#[tokio::test]
async fn health_check_returns_ok() {
    let db = seeded_db().await;
    let app = http::router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}
