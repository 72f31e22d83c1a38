//! Integration tests for composition runs relayed from the CMS backend's
//! progress stream.

mod common;

use axum::http::StatusCode;
use common::{body_json, body_text, delete, get, poll_until, post_json, wait_for};
use serde_json::json;

async fn start(app: &axum::Router, store_id: &str) -> String {
    let response = post_json(
        app,
        "/api/v1/compose/runs",
        json!({"store_id": store_id, "canvas_ids": ["c1", "c2"]}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    json["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn start_requires_a_selection() {
    let (app, _cms) = common::build_test_app().await;

    let response = post_json(
        &app,
        "/api/v1/compose/runs",
        json!({"store_id": "1", "canvas_ids": []}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");

    let response = get(&app, "/health").await;
    assert_eq!(body_json(response).await["compose_runs"], 0);
}

#[tokio::test]
async fn run_reaches_complete_and_offers_outputs() {
    let (app, _cms) = common::build_test_app().await;
    let id = start(&app, "1").await;
    let uri = format!("/api/v1/compose/runs/{id}");

    let run = poll_until(&app, &uri, |data| data["wizard"]["phase"] == "complete").await;

    assert_eq!(run["wizard"]["progress"].as_f64(), Some(100.0));
    assert_eq!(run["wizard"]["message"], "Done");
    assert_eq!(run["wizard"]["canvas_ids"], json!(["c1", "c2"]));
    assert_eq!(run["available_outputs"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn output_can_be_chosen_once() {
    let (app, _cms) = common::build_test_app().await;
    let id = start(&app, "1").await;
    let uri = format!("/api/v1/compose/runs/{id}");
    poll_until(&app, &uri, |data| data["wizard"]["phase"] == "complete").await;

    let response = post_json(
        &app,
        &format!("{uri}/output"),
        json!({"action": "download_zip"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["wizard"]["output"], "download_zip");

    let response = post_json(
        &app,
        &format!("{uri}/output"),
        json!({"action": "inline_code"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn upstream_error_event_fails_the_run() {
    let (app, _cms) = common::build_test_app().await;
    let id = start(&app, "failing").await;
    let uri = format!("/api/v1/compose/runs/{id}");

    let run = poll_until(&app, &uri, |data| data["wizard"]["phase"] == "error").await;

    assert_eq!(run["wizard"]["error"], "boom");
    assert!(run["available_outputs"].as_array().unwrap().is_empty());

    let response = post_json(
        &app,
        &format!("{uri}/output"),
        json!({"action": "download_zip"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn events_endpoint_streams_sse() {
    let (app, _cms) = common::build_test_app().await;
    let id = start(&app, "1").await;

    let response = get(&app, &format!("/api/v1/compose/runs/{id}/events")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().starts_with("text/event-stream"));
}

#[tokio::test]
async fn deleted_run_is_gone() {
    let (app, _cms) = common::build_test_app().await;
    let id = start(&app, "1").await;
    let uri = format!("/api/v1/compose/runs/{id}");

    let response = delete(&app, &uri).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get(&app, &uri).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = delete(&app, &uri).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn run_stays_while_any_relay_is_open() {
    let (app, cms) = common::build_test_app().await;
    let id = start(&app, "hanging").await;
    let uri = format!("/api/v1/compose/runs/{id}");
    poll_until(&app, &uri, |data| data["wizard"]["message"] == "Rendering").await;

    let first = get(&app, &format!("{uri}/events")).await;
    let second = get(&app, &format!("{uri}/events")).await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);

    drop(first);
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert_eq!(get(&app, &uri).await.status(), StatusCode::OK);
    assert_eq!(cms.compose_closed(), 0);

    drop(second);
    wait_for("upstream close", || cms.compose_closed() == 1).await;
    assert_eq!(get(&app, &uri).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(get(&app, "/health").await).await["compose_runs"], 0);
}

#[tokio::test]
async fn deleting_a_run_ends_its_relay_and_upstream() {
    let (app, cms) = common::build_test_app().await;
    let id = start(&app, "hanging").await;
    let uri = format!("/api/v1/compose/runs/{id}");

    let relay = get(&app, &format!("{uri}/events")).await;
    assert_eq!(delete(&app, &uri).await.status(), StatusCode::NO_CONTENT);

    let text = body_text(relay).await;
    assert!(text.contains("event: wizard"));
    wait_for("upstream close", || cms.compose_closed() == 1).await;
}

#[tokio::test]
async fn relay_ends_with_the_chosen_output() {
    let (app, _cms) = common::build_test_app().await;
    let id = start(&app, "1").await;
    let uri = format!("/api/v1/compose/runs/{id}");
    poll_until(&app, &uri, |data| data["wizard"]["phase"] == "complete").await;

    let relay = get(&app, &format!("{uri}/events")).await;
    let response = post_json(
        &app,
        &format!("{uri}/output"),
        json!({"action": "download_zip"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let text = body_text(relay).await;
    assert!(text.contains("\"output\":\"download_zip\""));

    let mut gone = false;
    for _ in 0..100 {
        if get(&app, &uri).await.status() == StatusCode::NOT_FOUND {
            gone = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert!(gone, "finished run was not released");
}

#[tokio::test]
async fn relay_ends_after_upstream_error() {
    let (app, _cms) = common::build_test_app().await;
    let id = start(&app, "failing").await;
    let uri = format!("/api/v1/compose/runs/{id}");
    poll_until(&app, &uri, |data| data["wizard"]["phase"] == "error").await;

    let text = body_text(get(&app, &format!("{uri}/events")).await).await;
    assert!(text.contains("\"phase\":\"error\""));
    assert!(text.contains("boom"));
}
