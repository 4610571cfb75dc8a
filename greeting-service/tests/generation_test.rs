//! Greeting and wish endpoints.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::{app, app_with_config, get, post, send, test_config};
use greeting_service::services::generator::StructuralErrorPolicy;
use greeting_service::services::providers::mock::MockTextProvider;
use greeting_service::services::providers::ProviderError;

#[tokio::test]
async fn greeting_from_first_model() {
    let (router, provider) =
        app(MockTextProvider::new().with_outcome("m1", Ok("\"Rise and shine, friend!\"")));

    let response = post(
        router,
        "/api/greeting",
        r#"{"greetingType": "morning", "history": []}"#,
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["text"], "Rise and shine, friend!");
    assert_eq!(body["type"], "morning");
    assert_eq!(body["kind"], "greeting");
    assert_eq!(body["model"], "m1");
    assert_eq!(body["source"], "model");
    assert!(body["timestamp"].is_string());
    assert_eq!(provider.called_models(), vec!["m1"]);
}

#[tokio::test]
async fn missing_api_key_serves_fallback_without_calling_provider() {
    let (router, provider) = app(MockTextProvider::unconfigured());

    let response = post(router, "/api/greeting", r#"{"greetingType": "night"}"#).await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["text"], "Good night!");
    assert_eq!(body["model"], "fallback");
    assert_eq!(body["source"], "fallback");
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn random_fallback_stays_within_type_entries() {
    let mut config = test_config(&["m1"]);
    config.generation.fallback_selection =
        greeting_service::services::fallback::FallbackSelection::Random;

    for _ in 0..10 {
        let (router, _) = app_with_config(MockTextProvider::unconfigured(), config.clone());
        let response = post(router, "/api/greeting", r#"{"greetingType": "night"}"#).await;
        let text = response.json()["text"].as_str().unwrap().to_string();
        assert!(["Good night!", "Sweet dreams!"].contains(&text.as_str()), "{text}");
    }
}

#[tokio::test]
async fn malformed_body_uses_defaults() {
    for body in ["", "{not json", r#"{"greetingType": 42}"#, "[]", r#"["night"]"#] {
        let (router, provider) =
            app(MockTextProvider::new().with_default(Ok("Good morning, world!")));
        let response = post(router, "/api/greeting", body).await;

        assert_eq!(response.status, StatusCode::OK, "body {body:?}");
        let json = response.json();
        assert_eq!(json["type"], "morning", "body {body:?}");
        assert_eq!(json["text"], "Good morning, world!");
        assert!(!provider.calls()[0].prompt.contains("Avoid"));
    }
}

#[tokio::test]
async fn invalid_history_keeps_requested_type() {
    for body in [
        r#"{"greetingType": "night", "history": null}"#,
        r#"{"greetingType": "night", "history": [1, 2]}"#,
        r#"{"contentType": "night", "greetingType": "evening"}"#,
    ] {
        let (router, provider) = app(MockTextProvider::unconfigured());
        let response = post(router, "/api/greeting", body).await;

        assert_eq!(response.status, StatusCode::OK, "body {body}");
        let json = response.json();
        assert_eq!(json["type"], "night", "body {body}");
        assert_eq!(json["text"], "Good night!", "body {body}");
        assert!(provider.calls().is_empty());
    }
}

#[tokio::test]
async fn history_reaches_the_prompt() {
    let (router, provider) = app(MockTextProvider::new().with_default(Ok("Hello, bright morning!")));

    post(
        router,
        "/api/greeting",
        r#"{"greetingType": "morning", "history": ["Good morning!", "Rise and shine!"]}"#,
    )
    .await;

    let prompt = &provider.calls()[0].prompt;
    assert!(prompt.contains("Avoid: \"Good morning!\"; \"Rise and shine!\""));
}

#[tokio::test]
async fn every_model_failing_serves_fallback() {
    let (router, provider) = app(MockTextProvider::new()
        .with_outcome("m1", Err(ProviderError::RateLimited("quota".into())))
        .with_outcome("m2", Err(ProviderError::ModelNotFound("m2".into())))
        .with_outcome("m3", Err(ProviderError::NetworkError("reset".into()))));

    let response = post(router, "/api/wish", r#"{"wishType": "evening"}"#).await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["text"], "May your evening bring peace and relaxation!");
    assert_eq!(body["kind"], "wish");
    assert_eq!(body["source"], "fallback");
    assert_eq!(provider.called_models(), vec!["m1", "m2", "m3"]);
}

#[tokio::test]
async fn wish_for_unknown_type_uses_placeholder_default() {
    let (router, _) = app(MockTextProvider::unconfigured());

    let response = post(router, "/api/wish", r#"{"wishType": "Weekend"}"#).await;

    let body = response.json();
    assert_eq!(body["type"], "weekend");
    assert_eq!(body["text"], "I wish you a wonderful weekend!");
}

#[tokio::test]
async fn rejected_output_tries_next_model() {
    let (router, provider) = app(MockTextProvider::new()
        .with_outcome("m1", Ok("Okay, here are some options:"))
        .with_outcome("m2", Ok("1. \"Good afternoon, team!\"")));

    let response = post(router, "/api/greeting", r#"{"greetingType": "afternoon"}"#).await;

    let body = response.json();
    assert_eq!(body["text"], "Good afternoon, team!");
    assert_eq!(body["model"], "m2");
    assert_eq!(provider.called_models(), vec!["m1", "m2"]);
}

#[tokio::test]
async fn structural_error_aborts_by_default() {
    let (router, provider) = app(MockTextProvider::new()
        .with_outcome("m1", Err(ProviderError::InvalidRequest("bad field".into())))
        .with_outcome("m2", Ok("Good evening, everyone!")));

    let response = post(router, "/api/greeting", r#"{"greetingType": "evening"}"#).await;

    let body = response.json();
    assert_eq!(body["source"], "fallback");
    assert_eq!(body["text"], "Good evening!");
    assert_eq!(provider.called_models(), vec!["m1"]);
}

#[tokio::test]
async fn structural_error_continues_when_configured() {
    let mut config = test_config(&["m1", "m2"]);
    config.generation.structural_errors = StructuralErrorPolicy::Continue;

    let (router, provider) = app_with_config(
        MockTextProvider::new()
            .with_outcome("m1", Err(ProviderError::InvalidRequest("bad field".into())))
            .with_outcome("m2", Ok("Good evening, everyone!")),
        config,
    );

    let response = post(router, "/api/greeting", r#"{"greetingType": "evening"}"#).await;

    let body = response.json();
    assert_eq!(body["source"], "model");
    assert_eq!(body["model"], "m2");
    assert_eq!(provider.called_models(), vec!["m1", "m2"]);
}

#[tokio::test]
async fn credential_error_stops_the_loop() {
    let (router, provider) = app(MockTextProvider::new()
        .with_outcome("m1", Err(ProviderError::Unauthorized("API_KEY_INVALID".into())))
        .with_default(Ok("Good morning, sunshine!")));

    let response = post(router, "/api/greeting", "{}").await;

    assert_eq!(response.json()["source"], "fallback");
    assert_eq!(provider.called_models(), vec!["m1"]);
}

#[tokio::test]
async fn non_post_greeting_is_rejected() {
    for path in ["/api/greeting", "/api/wish"] {
        let (router, provider) = app(MockTextProvider::new());
        let response = get(router, path).await;

        assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.json()["error"], "POST required");
        assert!(provider.calls().is_empty());
    }
}

#[tokio::test]
async fn cors_preflight_is_answered() {
    let (router, provider) = app(MockTextProvider::new());

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/greeting")
        .header(header::ORIGIN, "https://example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();
    let response = send(router, request).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.is_empty());
    assert_eq!(response.header("access-control-allow-origin"), Some("*"));
    let methods = response
        .header("access-control-allow-methods")
        .unwrap_or_default()
        .to_string();
    assert!(methods.contains("POST"));
    assert!(methods.contains("OPTIONS"));
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn bare_options_is_answered_empty() {
    let (router, _) = app(MockTextProvider::new());

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/wish")
        .body(Body::empty())
        .unwrap();
    let response = send(router, request).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.is_empty());
}

#[tokio::test]
async fn simple_responses_allow_any_origin() {
    let (router, _) = app(MockTextProvider::unconfigured());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/greeting")
        .header(header::ORIGIN, "https://example.com")
        .body(Body::from("{}"))
        .unwrap();
    let response = send(router, request).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("access-control-allow-origin"), Some("*"));
}

#[tokio::test]
async fn quota_everywhere_returns_night_fallback() {
    for path in ["/api/greeting", "/api/wish"] {
        let (router, provider) = app(
            MockTextProvider::new()
                .with_default(Err(ProviderError::RateLimited("RESOURCE_EXHAUSTED".into()))),
        );

        let response = post(router, path, r#"{"contentType": "night"}"#).await;

        assert_eq!(response.status, StatusCode::OK);
        let text = response.json()["text"].as_str().unwrap().to_string();
        assert!(
            ["Good night!", "I wish you a calm night and the sweetest of dreams!"]
                .contains(&text.as_str()),
            "{path}: {text}"
        );
        assert_eq!(provider.calls().len(), 3);
    }
}
