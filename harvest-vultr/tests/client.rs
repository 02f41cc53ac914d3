// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

use assert2::{check, let_assert};
use axum::{
    Json, Router,
    extract::Query,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use harvest::{ApiError, CloudApi, ListOptions, paginate};
use harvest_vultr::VultrClient;
use serde_json::json;

const API_KEY: &str = "test-key";

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    format!("http://{addr}")
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {API_KEY}"))
}

async fn account(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, r#"{"error":"Invalid API token."}"#).into_response();
    }
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    Json(json!({
        "account": {
            "name": user_agent,
            "email": "jane@example.com",
            "acls": ["manage_users"],
            "balance": -20.5,
            "pending_charges": 4.25
        }
    }))
    .into_response()
}

// five volumes served two per page, the cursor being the offset of the next page
async fn blocks(headers: HeaderMap, Query(query): Query<HashMap<String, String>>) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let per_page: usize = query["per_page"].parse().unwrap();
    let start: usize = query.get("cursor").map_or(0, |c| c.parse().unwrap());
    let end = (start + per_page).min(5);
    let blocks: Vec<_> = (start..end)
        .map(|i| json!({"id": format!("b{i}"), "label": format!("vol-{i}"), "size_gb": 10 * i}))
        .collect();
    let next = if end < 5 {
        end.to_string()
    } else {
        String::new()
    };
    Json(json!({
        "blocks": blocks,
        "meta": {"total": 5, "links": {"next": next, "prev": ""}}
    }))
    .into_response()
}

fn router() -> Router {
    Router::new()
        .route("/v2/account", get(account))
        .route("/v2/blocks", get(blocks))
        .route("/v2/load-balancers", get(|| async { "not json" }))
        .route(
            "/v2/reserved-ips",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "x".repeat(4096)) }),
        )
}

async fn client(key: &str) -> VultrClient {
    VultrClient::builder(key)
        .base_url(format!("{}/", serve(router()).await))
        .user_agent("harvest-test/1.0")
        .build()
        .unwrap()
}

#[tokio::test]
async fn account_is_unwrapped() {
    let client = client(API_KEY).await;
    let account = client.get_account().await.unwrap();
    check!(account.name == "harvest-test/1.0");
    check!(account.balance == -20.5);
    check!(account.pending_charges == 4.25);
}

#[tokio::test]
async fn listing_follows_cursor() {
    let client = client(API_KEY).await;
    let first = client
        .list_block_storage(ListOptions {
            per_page: 2,
            cursor: String::new(),
        })
        .await
        .unwrap();
    check!(first.items.len() == 2);
    check!(first.next_cursor == "2");

    let all = paginate(2, |options| client.list_block_storage(options))
        .await
        .unwrap();
    let labels: Vec<_> = all.iter().map(|b| b.label.as_str()).collect();
    check!(labels == ["vol-0", "vol-1", "vol-2", "vol-3", "vol-4"]);
    check!(all[4].size_gb == 40.0);
}

#[tokio::test]
async fn rejected_key_is_a_status_error() {
    let client = client("wrong").await;
    let_assert!(Err(ApiError::Status { status, body }) = client.get_account().await);
    check!(status == 401);
    check!(body.contains("Invalid API token"));
}

#[tokio::test]
async fn unexpected_body_is_a_decode_error() {
    let client = client(API_KEY).await;
    let result = client.list_load_balancers(ListOptions::default()).await;
    let_assert!(Err(ApiError::Decode(_)) = result);
}

#[tokio::test]
async fn error_body_is_truncated() {
    let client = client(API_KEY).await;
    let result = client.list_reserved_ips(ListOptions::default()).await;
    let_assert!(Err(ApiError::Status { status: 500, body }) = result);
    check!(body.len() == 512);
}

#[tokio::test]
async fn unreachable_host_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = VultrClient::builder(API_KEY)
        .base_url(format!("http://{addr}"))
        .build()
        .unwrap();
    let_assert!(Err(ApiError::Transport(_)) = client.get_bandwidth().await);
}

#[test]
fn debug_redacts_the_key() {
    let client = VultrClient::builder("super-secret").build().unwrap();
    let debug = format!("{client:?}");
    check!(!debug.contains("super-secret"));
    check!(client.base_url() == "https://api.vultr.com");
}
