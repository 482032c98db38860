mod common;

use std::time::Duration;

use assert_matches::assert_matches;
use axum::http::{Method, StatusCode};
use city_home_service::{
    config::WhatsAppConfig,
    errors::ServiceError,
    services::notifications::{WhatsAppMessage, WhatsAppNotifier},
};
use common::{checkout_body, TestApp};
use serde_json::json;
use wiremock::{
    matchers::{body_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn notifier_for(server: &MockServer, max_retries: u32) -> WhatsAppNotifier {
    let config = WhatsAppConfig {
        api_url: Some(format!("{}/send", server.uri())),
        api_key: Some("test-webhook-key".into()),
        recipient: Some("919800000000".into()),
        timeout_secs: 2,
        max_retries,
    };
    WhatsAppNotifier::from_config(&config)
        .unwrap()
        .with_backoff(Duration::from_millis(5))
}

#[tokio::test]
async fn delivers_message_with_bearer_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send"))
        .and(header("authorization", "Bearer test-webhook-key"))
        .and(body_json(json!({ "to": "919811111111", "message": "hello" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    notifier_for(&server, 3)
        .send(&WhatsAppMessage {
            to: "919811111111".into(),
            message: "hello".into(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn retries_then_gives_up() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let err = notifier_for(&server, 3)
        .send(&WhatsAppMessage {
            to: "919811111111".into(),
            message: "hello".into(),
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ExternalServiceError(_));
}

#[tokio::test]
async fn recovers_after_a_transient_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/send"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    notifier_for(&server, 3)
        .send(&WhatsAppMessage {
            to: "919811111111".into(),
            message: "hello".into(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn checkout_notifies_customer_and_admin() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let app = TestApp::with_notifier(notifier_for(&server, 1)).await;
    let items = json!([
        { "id": "deep-clean", "name": "Deep Cleaning", "quantity": 1, "price": 600 }
    ]);
    let response = app
        .request(Method::POST, "/api/checkout", Some(checkout_body(items)), None)
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let mut received = Vec::new();
    for _ in 0..50 {
        received = server.received_requests().await.unwrap_or_default();
        if received.len() >= 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(received.len(), 2);

    let recipients: Vec<String> = received
        .iter()
        .map(|r| {
            let body: serde_json::Value = serde_json::from_slice(&r.body).unwrap();
            body["to"].as_str().unwrap().to_string()
        })
        .collect();
    assert!(recipients.contains(&"9123456780".to_string()));
    assert!(recipients.contains(&"919800000000".to_string()));
}

#[tokio::test]
async fn failed_notification_does_not_fail_checkout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let app = TestApp::with_notifier(notifier_for(&server, 1)).await;
    let items = json!([{ "id": "tap", "name": "Tap Repair", "quantity": 1, "price": 199 }]);
    let response = app
        .request(Method::POST, "/api/checkout", Some(checkout_body(items)), None)
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(app.order_count().await, 1);
}
