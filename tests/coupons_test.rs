mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use city_home_service::services::coupons::CouponUpdate;
use common::{response_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;

#[tokio::test]
async fn usable_coupon_is_found_case_insensitively() {
    let app = TestApp::new().await;
    app.seed_coupon("FESTIVE50", dec!(50), None).await;

    let response = app
        .request(Method::GET, "/api/coupons/code/festive50", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["code"], "FESTIVE50");
    assert_eq!(body["discount"].as_f64(), Some(50.0));
}

#[tokio::test]
async fn inactive_coupon_is_not_found() {
    let app = TestApp::new().await;
    let coupon = app.seed_coupon("PAUSED", dec!(25), None).await;
    app.state
        .services
        .coupons
        .update(
            coupon.id,
            CouponUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let response = app
        .request(Method::GET, "/api/coupons/code/PAUSED", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response_json(response).await["message"], "Coupon is not active");
}

#[tokio::test]
async fn expired_coupon_is_not_found() {
    let app = TestApp::new().await;
    let coupon = app.seed_coupon("SUMMER", dec!(75), None).await;
    app.state
        .services
        .coupons
        .update(
            coupon.id,
            CouponUpdate {
                expiry: Some(Some(Utc::now() - Duration::days(1))),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let response = app
        .request(Method::GET, "/api/coupons/code/SUMMER", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response_json(response).await["message"], "Coupon has expired");
}

#[tokio::test]
async fn unknown_coupon_is_not_found() {
    let app = TestApp::new().await;
    let response = app
        .request(Method::GET, "/api/coupons/code/GHOST", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_manages_coupons() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    let response = app
        .request(
            Method::POST,
            "/api/coupons",
            Some(json!({ "code": " diwali ", "discount": 150, "max_uses": 10 })),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = response_json(response).await;
    assert_eq!(created["code"], "DIWALI");
    assert_eq!(created["current_uses"], 0);
    let id = created["id"].as_i64().unwrap();

    let response = app
        .request(
            Method::POST,
            "/api/coupons",
            Some(json!({ "code": "DIWALI", "discount": 10 })),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .request(
            Method::POST,
            "/api/coupons",
            Some(json!({ "code": "FREE", "discount": 0 })),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request(
            Method::PUT,
            &format!("/api/coupons/{id}"),
            Some(json!({ "discount": 200 })),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["discount"].as_f64(), Some(200.0));

    let response = app
        .request(Method::DELETE, &format!("/api/coupons/{id}"), None, Some(&admin))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .request(Method::GET, &format!("/api/coupons/{id}"), None, Some(&admin))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn null_clears_usage_cap_and_expiry() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let coupon = app.seed_coupon("ONCE", dec!(40), Some(1)).await;
    let expiry = (Utc::now() + Duration::days(30)).to_rfc3339();

    let response = app
        .request(
            Method::PUT,
            &format!("/api/coupons/{}", coupon.id),
            Some(json!({ "expiry": expiry })),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["max_uses"], 1);
    assert!(body["expiry"].is_string());

    let response = app
        .request(
            Method::PUT,
            &format!("/api/coupons/{}", coupon.id),
            Some(json!({ "max_uses": null, "expiry": null })),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert!(body["max_uses"].is_null());
    assert!(body["expiry"].is_null());
    assert_eq!(body["discount"].as_f64(), Some(40.0));

    let response = app
        .request(
            Method::PUT,
            &format!("/api/coupons/{}", coupon.id),
            Some(json!({ "max_uses": 0 })),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
