//! Shared helpers for greeting-service integration tests.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot` and a
//! scripted [`MockTextProvider`], so no network or API key is needed.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use greeting_service::config::GreetingConfig;
use greeting_service::services::fallback::FallbackSelection;
use greeting_service::services::providers::mock::MockTextProvider;
use greeting_service::startup::{build_router, AppState};
use std::sync::Arc;
use tower::util::ServiceExt;

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).expect("Response body is not UTF-8")
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("Response body is not JSON")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Config with deterministic fallbacks and a short model list.
pub fn test_config(models: &[&str]) -> GreetingConfig {
    let mut config = GreetingConfig::default();
    config.generation.model_priority = models.iter().map(|m| m.to_string()).collect();
    config.generation.fallback_selection = FallbackSelection::First;
    config
}

pub fn app(provider: MockTextProvider) -> (Router, Arc<MockTextProvider>) {
    app_with_config(provider, test_config(&["m1", "m2", "m3"]))
}

pub fn app_with_config(
    provider: MockTextProvider,
    config: GreetingConfig,
) -> (Router, Arc<MockTextProvider>) {
    let provider = Arc::new(provider);
    let router = build_router(AppState::new(config, provider.clone()));
    (router, provider)
}

pub async fn send(router: Router, request: Request<Body>) -> TestResponse {
    let response = router
        .oneshot(request)
        .await
        .expect("Router failed to respond");

    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body")
        .to_vec();

    TestResponse {
        status,
        headers,
        body,
    }
}

pub async fn get(router: Router, uri: &str) -> TestResponse {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(router, request).await
}

pub async fn post(router: Router, uri: &str, body: &str) -> TestResponse {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, request).await
}
