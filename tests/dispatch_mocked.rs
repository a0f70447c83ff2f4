//! Dispatcher and rate-limit store tests against mocked providers.
//!
//! Exercises the integration clients directly, without the HTTP handler in
//! front, so provider-level behavior (payload shape, auth, failure mapping,
//! store fallback) is pinned down in isolation.
use std::collections::BTreeMap;
use std::time::Duration;

use intake_api::core::models::{
    BudgetRange, ContactSubmission, DataSensitivity, Industry, Inquiry, ProjectUrgency, RoiParams,
    TeamSize, Tool,
};
use intake_api::integrations::dispatch::{dispatch, ChatService, DispatchOutcome, EmailService};
use intake_api::integrations::rate_limit::{RateLimiter, RestKvStore};
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sample_inquiry() -> Inquiry {
    let submission = ContactSubmission {
        full_name: "Jane Doe".to_string(),
        email: "jane@x.com".to_string(),
        company: Some("Acme".to_string()),
        industry: Industry::Retail,
        team_size: TeamSize::Micro,
        data_sensitivity: DataSensitivity::Low,
        budget_range: BudgetRange::Under5k,
        project_urgency: ProjectUrgency::Exploring,
        vision: "We want to automate invoicing and save time weekly.".to_string(),
        tools: vec![Tool::Spreadsheets],
        roi: Some(RoiParams {
            hourly_rate: Some(120.0),
            weekly_hours: Some(6.0),
            ..Default::default()
        }),
        utm: BTreeMap::from([("utm_source".to_string(), "newsletter".to_string())]),
        honeypot: String::new(),
        time_to_submit: 12.0,
    };
    Inquiry::new(
        submission,
        "203.0.113.5".to_string(),
        Some("Mozilla/5.0".to_string()),
    )
}

fn email_service(base_url: String) -> EmailService {
    EmailService::new(
        base_url,
        "re_test_key".to_string(),
        "Contact Form <onboarding@resend.dev>".to_string(),
        "hello@studio.test".to_string(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_email_send_posts_expected_payload() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .and(header("authorization", "Bearer re_test_key"))
        .and(body_partial_json(json!({"to": ["hello@studio.test"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "msg_1"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = email_service(mock_server.uri());
    let result = service.send(&sample_inquiry()).await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_email_send_maps_provider_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(422).set_body_string("invalid sender"))
        .mount(&mock_server)
        .await;

    let service = email_service(mock_server.uri());
    let result = service.send(&sample_inquiry()).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_chat_send_posts_blocks() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(body_string_contains("New project inquiry"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = ChatService::new(format!("{}/hook", mock_server.uri())).unwrap();
    let result = service.send(&sample_inquiry()).await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_dispatch_isolates_channel_failures() {
    let email_server = MockServer::start().await;
    let chat_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(500).set_body_string("down"))
        .expect(1)
        .mount(&email_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&chat_server)
        .await;

    let email = email_service(email_server.uri());
    let chat = ChatService::new(format!("{}/hook", chat_server.uri())).unwrap();

    let summary = dispatch(Some(&email), Some(&chat), &sample_inquiry()).await;

    assert_eq!(summary.email, DispatchOutcome::Failed);
    assert_eq!(summary.chat, DispatchOutcome::Sent);
}

#[tokio::test]
async fn test_kv_store_counts_within_window() {
    let mock_server = MockServer::start().await;

    // Fresh key: GET finds nothing, SET stores the opened window
    Mock::given(method("POST"))
        .and(header("authorization", "Bearer kv_token"))
        .and(body_string_contains("\"GET\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": null})))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(header("authorization", "Bearer kv_token"))
        .and(body_string_contains("\"SET\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "OK"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = RestKvStore::new(mock_server.uri(), "kv_token".to_string()).unwrap();
    let limiter =
        RateLimiter::new(5, Duration::from_secs(600)).with_remote(Box::new(store));

    assert!(limiter.check("contact:203.0.113.5").await.is_allowed());
}

#[tokio::test]
async fn test_kv_store_denies_full_window() {
    let mock_server = MockServer::start().await;

    // Stored window is already at the maximum and far from expiry
    let stored = json!({"count": 5, "reset_at_ms": 99_999_999_999_999i64}).to_string();
    Mock::given(method("POST"))
        .and(body_string_contains("\"GET\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": stored})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = RestKvStore::new(mock_server.uri(), "kv_token".to_string()).unwrap();
    let limiter =
        RateLimiter::new(5, Duration::from_secs(600)).with_remote(Box::new(store));

    // Denied without any SET call
    assert!(!limiter.check("contact:203.0.113.5").await.is_allowed());
}

#[tokio::test]
async fn test_kv_store_failure_falls_back_to_memory() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("kv down"))
        .mount(&mock_server)
        .await;

    let store = RestKvStore::new(mock_server.uri(), "kv_token".to_string()).unwrap();
    let limiter = RateLimiter::new(2, Duration::from_secs(600)).with_remote(Box::new(store));

    // The in-memory fallback still enforces the window
    assert!(limiter.check("contact:203.0.113.5").await.is_allowed());
    assert!(limiter.check("contact:203.0.113.5").await.is_allowed());
    assert!(!limiter.check("contact:203.0.113.5").await.is_allowed());
}

#[tokio::test]
async fn test_concurrent_dispatches() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(10)
        .mount(&mock_server)
        .await;

    let mut handles = vec![];
    for _ in 0..10 {
        let url = format!("{}/hook", mock_server.uri());
        let handle = tokio::spawn(async move {
            let service = ChatService::new(url).unwrap();
            service.send(&sample_inquiry()).await
        });
        handles.push(handle);
    }

    for handle in handles {
        let result = handle.await.unwrap();
        assert!(result.is_ok());
    }
}
