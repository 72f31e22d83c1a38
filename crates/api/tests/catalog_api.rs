//! Integration tests for catalog lookups and auth forwarding.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, get_with_token, post_json, VALID_TOKEN};
use serde_json::json;

#[tokio::test]
async fn stores_forward_bearer_token() {
    let (app, _cms) = common::build_test_app().await;

    let response = get_with_token(&app, "/api/v1/stores", VALID_TOKEN).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"][0]["id"], "1");
    assert_eq!(json["data"][1]["name"], "Outlet");
}

#[tokio::test]
async fn upstream_rejection_becomes_401() {
    let (app, _cms) = common::build_test_app().await;

    let response = get_with_token(&app, "/api/v1/stores", "wrong").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn malformed_authorization_header_rejected() {
    let (app, _cms) = common::build_test_app().await;
    let request = axum::http::Request::builder()
        .uri("/api/v1/stores")
        .header("authorization", "Basic abc")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = common::send(&app, request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn upstream_failure_is_sanitized_502() {
    let (app, _cms) = common::build_test_app().await;

    let response = get(&app, "/api/v1/catalogs/broken/categories").await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UPSTREAM_ERROR");
    assert!(!json["error"].as_str().unwrap().contains("hunter2"));
}

#[tokio::test]
async fn widgets_pass_query_through() {
    let (app, _cms) = common::build_test_app().await;

    let response = get(&app, "/api/v1/widgets?page_type=home&layout_id=9").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"][0]["name"], "home widget");
    assert_eq!(json["data"][0]["type"], "banner");
    assert_eq!(json["data"][0]["layout"], "9");
}

#[tokio::test]
async fn missing_layout_is_404() {
    let (app, _cms) = common::build_test_app().await;

    let response = get(&app, "/api/v1/layouts?page_type=home").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get(&app, "/api/v1/layouts?page_type=cart").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["id"], "41");
}

#[tokio::test]
async fn login_validates_then_forwards() {
    let (app, _cms) = common::build_test_app().await;

    let response = post_json(
        &app,
        "/api/v1/auth/login",
        json!({"username": "ada", "password": ""}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json(
        &app,
        "/api/v1/auth/login",
        json!({"username": "ada", "password": "wrong"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = post_json(
        &app,
        "/api/v1/auth/login",
        json!({"username": "ada", "password": "correct"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["token"], VALID_TOKEN);
    assert_eq!(json["data"]["user"], "ada");
}

#[tokio::test]
async fn passkey_options_relayed() {
    let (app, _cms) = common::build_test_app().await;

    let response = post_json(&app, "/api/v1/auth/passkey/login/options", json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["publicKey"]["challenge"], "q83v7w");
}

#[tokio::test]
async fn passkey_credential_encoding_checked_before_forwarding() {
    let (app, _cms) = common::build_test_app().await;

    let bad = json!({
        "id": "cred",
        "rawId": "not/base64url+",
        "response": {"clientDataJSON": "AA", "authenticatorData": "AA", "signature": "AA"}
    });
    let response = post_json(&app, "/api/v1/auth/passkey/login", bad).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");

    let good = json!({
        "id": "cred",
        "rawId": "q83v7w",
        "response": {"clientDataJSON": "AA", "authenticatorData": "AA", "signature": "AA"}
    });
    let response = post_json(&app, "/api/v1/auth/passkey/login", good).await;
    assert_eq!(response.status(), StatusCode::OK);
}
