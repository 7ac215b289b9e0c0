//! Router-level tests for the HTTP API

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use tower::ServiceExt;
use webconsole_core::{ConsoleService, RunnerConfig};
use webconsole_store::ExecutionStore;

use crate::server::{build_router, config::ConsoleConfig};

async fn app() -> (Router, Arc<ConsoleService>) {
    let store = ExecutionStore::in_memory().await.unwrap();
    let service = Arc::new(ConsoleService::new(
        Arc::new(store),
        RunnerConfig::default(),
    ));
    let router = build_router(service.clone(), ConsoleConfig::default(), None);
    (router, service)
}

fn encode_form_value(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}

fn submit_request(command: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/executions")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("command={}", encode_form_value(command))))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn submit(router: &Router, command: &str) -> String {
    let response = router.clone().oneshot(submit_request(command)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    response.headers()[header::LOCATION]
        .to_str()
        .unwrap()
        .to_string()
}

async fn wait_for_status(router: &Router, location: &str) -> serde_json::Value {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let response = router.clone().oneshot(get_request(location)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let json = body_json(response).await;
            if !json["data"]["status"].is_null() {
                return json["data"].clone();
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn test_submit_redirects_to_record() {
    let (router, _) = app().await;

    let location = submit(&router, "echo hi").await;
    assert!(location.starts_with("/executions/"));

    let record = wait_for_status(&router, &location).await;
    assert_eq!(record["state"], "finished");
    assert_eq!(record["status"], 0);
    assert_eq!(record["output"], "hi\n");
    assert_eq!(record["command"], "echo hi");
}

#[tokio::test]
async fn test_json_suffix_is_accepted() {
    let (router, _) = app().await;
    let location = submit(&router, "exit 7").await;

    let record = wait_for_status(&router, &format!("{location}.json")).await;
    assert_eq!(record["status"], 7);
    assert_eq!(record["output"], "");
}

#[tokio::test]
async fn test_running_record_has_null_status() {
    let (router, _) = app().await;
    let location = submit(&router, "sleep 1").await;

    let response = router.clone().oneshot(get_request(&location)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["data"]["status"].is_null());
    assert_eq!(json["data"]["output"], "");
}

#[tokio::test]
async fn test_empty_command_is_bad_request() {
    let (router, service) = app().await;

    let response = router.clone().oneshot(submit_request("")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);

    assert!(service.store().list_recent(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_and_malformed_ids_not_found() {
    let (router, _) = app().await;

    for uri in ["/executions/999", "/executions/abc", "/executions/abc.json"] {
        let response = router.clone().oneshot(get_request(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }

    let response = router
        .clone()
        .oneshot(get_request("/executions/999/console"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_console_streams_output_then_exit() {
    let (router, _) = app().await;
    let location = submit(&router, "sleep 0.5; echo streamed").await;

    let response = router
        .clone()
        .oneshot(get_request(&format!("{location}/console")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );

    let bytes = tokio::time::timeout(
        Duration::from_secs(10),
        to_bytes(response.into_body(), usize::MAX),
    )
    .await
    .unwrap()
    .unwrap();
    let body = String::from_utf8(bytes.to_vec()).unwrap();

    let output = body
        .find("event: console-output\ndata: {\"output\":\"streamed\\n\"}")
        .expect("output event");
    let exit = body
        .find("event: console-exit\ndata: 0")
        .expect("exit event");
    assert!(output < exit);
}

#[tokio::test]
async fn test_console_of_finished_execution_not_found() {
    let (router, service) = app().await;
    let location = submit(&router, "true").await;
    wait_for_status(&router, &location).await;

    tokio::time::timeout(Duration::from_secs(5), async {
        while !service.registry().is_empty().await {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    let response = router
        .clone()
        .oneshot(get_request(&format!("{location}/console")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_executions_newest_first() {
    let (router, _) = app().await;
    for command in ["echo one", "echo two", "echo three"] {
        submit(&router, command).await;
    }

    let response = router
        .clone()
        .oneshot(get_request("/executions?limit=2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let items = json["data"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["command"], "echo three");
    assert_eq!(items[1]["command"], "echo two");
}

#[tokio::test]
async fn test_health_reports_live_executions() {
    let (router, _) = app().await;
    submit(&router, "sleep 1").await;

    let response = router.clone().oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(json["live_executions"], 1);
}
