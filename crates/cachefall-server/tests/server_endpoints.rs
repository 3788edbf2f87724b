//! End-to-end tests over the HTTP surface, with Redis disabled so both cache
//! tiers run in-process.

use cachefall_server::{AppConfig, build_app, build_state};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

async fn start_server() -> (String, tokio::sync::oneshot::Sender<()>, JoinHandle<()>) {
    let cfg = AppConfig::default();
    let state = build_state(&cfg).await.expect("build state");
    let app = build_app(state);

    // Bind to an ephemeral port
    let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await;
    });

    (format!("http://{addr}"), tx, server)
}

#[tokio::test]
async fn health_and_info_endpoints_work() {
    let (base, shutdown_tx, handle) = start_server().await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{base}/")).send().await.unwrap();
    assert!(resp.status().is_success());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["service"], "cachefall");
    assert_eq!(body["status"], "ok");

    let resp = client.get(format!("{base}/healthz")).send().await.unwrap();
    assert!(resp.status().is_success());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    let resp = client.get(format!("{base}/readyz")).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ready");

    // Redis disabled: health reports the in-process mode, no replica
    let resp = client
        .get(format!("{base}/cache/health"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "UP");
    assert_eq!(body["mode"], "memory");
    assert_eq!(body["replica"], "NOT_CONFIGURED");

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn user_crud_flow_works() {
    let (base, shutdown_tx, handle) = start_server().await;
    let client = reqwest::Client::new();

    // Empty list first
    let users: Vec<Value> = client
        .get(format!("{base}/users"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(users.is_empty());

    // Create
    let resp = client
        .post(format!("{base}/users"))
        .json(&json!({ "name": "Alice", "email": "alice@example.com", "designation": "Engineer" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let created: Value = resp.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["name"], "Alice");

    // Read by id and by name
    let fetched: Value = client
        .get(format!("{base}/users/{id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["email"], "alice@example.com");

    let by_name: Value = client
        .get(format!("{base}/users/by-name/ALICE"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(by_name["id"], json!(id));

    // The read is now cached and visible through the cache peek endpoint
    let peeked: Value = client
        .get(format!("{base}/cache/users/id:{id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(peeked["name"], "Alice");

    // Bulk create
    let resp = client
        .post(format!("{base}/users/bulk"))
        .json(&json!([
            { "name": "Bob", "email": "bob@example.com" },
            { "name": "Carol", "email": "carol@example.com" }
        ]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let users: Vec<Value> = client
        .get(format!("{base}/users"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(users.len(), 3);

    // Update
    let resp = client
        .put(format!("{base}/users/{id}"))
        .json(&json!({ "name": "Alicia", "email": "alice@example.com", "designation": "Staff" }))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let updated: Value = resp.json().await.unwrap();
    assert_eq!(updated["name"], "Alicia");

    // Delete, then reads 404
    let resp = client
        .delete(format!("{base}/users/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    let resp = client
        .get(format!("{base}/users/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = client
        .delete(format!("{base}/users/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn validation_and_cache_admin_errors() {
    let (base, shutdown_tx, handle) = start_server().await;
    let client = reqwest::Client::new();

    // Invalid payload is a 400
    let resp = client
        .post(format!("{base}/users"))
        .json(&json!({ "name": "", "email": "x@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "bad_request");

    // Only the configured cache names resolve
    let names: Vec<String> = client
        .get(format!("{base}/cache"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(names, vec!["users"]);

    let resp = client
        .get(format!("{base}/cache/sessions/some-key"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    // Clearing a known cache succeeds even when empty
    let resp = client
        .delete(format!("{base}/cache/users"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}
