mod common;

use axum::http::{Method, StatusCode};
use common::{checkout_body, response_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;

fn mixed_cart() -> serde_json::Value {
    json!([
        { "id": "deep-clean", "name": "Deep Cleaning", "quantity": 1, "price": 600, "category": "Cleaning Services" },
        { "id": 17, "name": "Tap Repair", "quantity": 2, "price": 300, "category": "Plumbing" }
    ])
}

#[tokio::test]
async fn guest_checkout_persists_order_and_lines() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::POST, "/api/checkout", Some(checkout_body(mixed_cart())), None)
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response_json(response).await;
    assert_eq!(body["message"], "Order placed successfully");
    let order = &body["order"];
    assert!(order["order_number"].as_str().unwrap().starts_with("CHS-"));
    assert_eq!(order["status"], "pending");
    assert_eq!(order["subtotal"].as_f64(), Some(1200.0));
    assert_eq!(order["convenience_fee"].as_f64(), Some(49.0));
    assert_eq!(order["total"].as_f64(), Some(1249.0));
    assert_eq!(order["item_count"], 2);

    assert_eq!(app.order_count().await, 1);
    assert_eq!(app.order_item_count().await, 2);
}

#[tokio::test]
async fn server_totals_win_over_client_totals() {
    let app = TestApp::new().await;
    let mut body = checkout_body(mixed_cart());
    body["total"] = json!(1);
    body["subtotal"] = json!(1);

    let response = app
        .request(Method::POST, "/api/checkout", Some(body), None)
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["order"]["total"].as_f64(), Some(1249.0));
}

#[tokio::test]
async fn one_bad_line_rolls_back_everything() {
    let app = TestApp::new().await;
    let items = json!([
        { "id": "deep-clean", "name": "Deep Cleaning", "quantity": 1, "price": 600 },
        { "id": "sofa", "name": "Sofa Shampoo", "quantity": 0, "price": 450 }
    ]);

    let response = app
        .request(Method::POST, "/api/checkout", Some(checkout_body(items)), None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.order_count().await, 0);
    assert_eq!(app.order_item_count().await, 0);
}

#[tokio::test]
async fn missing_contact_field_is_rejected() {
    let app = TestApp::new().await;
    let mut body = checkout_body(mixed_cart());
    body.as_object_mut().unwrap().remove("address");

    let response = app
        .request(Method::POST, "/api/checkout", Some(body), None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["message"], "address is required");
    assert_eq!(app.order_count().await, 0);
}

#[tokio::test]
async fn empty_cart_is_rejected() {
    let app = TestApp::new().await;
    let response = app
        .request(Method::POST, "/api/checkout", Some(checkout_body(json!([]))), None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = TestApp::new().await;
    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/checkout")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn single_use_coupon_is_redeemed_once() {
    let app = TestApp::new().await;
    app.seed_coupon("WELCOME100", dec!(100), Some(1)).await;

    let mut body = checkout_body(mixed_cart());
    body["coupon_code"] = json!("welcome100");

    let response = app
        .request(Method::POST, "/api/checkout", Some(body.clone()), None)
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let placed = response_json(response).await;
    assert_eq!(placed["order"]["discount"].as_f64(), Some(100.0));
    assert_eq!(placed["order"]["total"].as_f64(), Some(1149.0));

    let response = app
        .request(Method::POST, "/api/checkout", Some(body), None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.order_count().await, 1);

    let response = app
        .request(Method::GET, "/api/coupons/code/WELCOME100", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_coupon_fails_checkout() {
    let app = TestApp::new().await;
    let mut body = checkout_body(mixed_cart());
    body["couponCode"] = json!("NOPE");

    let response = app
        .request(Method::POST, "/api/checkout", Some(body), None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.order_count().await, 0);
}

#[tokio::test]
async fn catalog_category_drives_the_fee() {
    let app = TestApp::new().await;
    let offering = app
        .seed_offering("BATH-CLN", dec!(450), "Cleaning Services")
        .await;

    let items = json!([
        { "id": offering.id, "name": offering.name, "quantity": 1, "price": 450 }
    ]);
    let response = app
        .request(Method::POST, "/api/checkout", Some(checkout_body(items)), None)
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["order"]["convenience_fee"].as_f64(), Some(39.0));
    assert_eq!(body["order"]["total"].as_f64(), Some(489.0));
}

#[tokio::test]
async fn customer_checkout_links_profile_and_shows_in_bookings() {
    let app = TestApp::new().await;
    let token = app.customer_token("priya@example.in").await;

    // contact details fall back to the profile
    let body = json!({
        "address": "4 Residency Road",
        "city": "Bengaluru",
        "pincode": "560025",
        "paymentMethod": "upi",
        "cartItems": mixed_cart()
    });
    let response = app
        .request(Method::POST, "/api/checkout", Some(body), Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .request(Method::GET, "/api/user/bookings", None, Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let bookings = response_json(response).await;
    let bookings = bookings.as_array().unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0]["email"], "priya@example.in");
    assert_eq!(bookings[0]["first_name"], "Priya Sharma");
    assert!(bookings[0]["profile_id"].is_number());
    assert!(bookings[0]["guest_email"].is_null());
    assert_eq!(bookings[0]["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn admin_moves_order_through_statuses() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    let response = app
        .request(Method::POST, "/api/checkout", Some(checkout_body(mixed_cart())), None)
        .await;
    let order_id = response_json(response).await["order"]["order_id"]
        .as_i64()
        .unwrap();

    let response = app
        .request(
            Method::PUT,
            &format!("/api/orders/{order_id}/status"),
            Some(json!({ "status": "confirmed" })),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["status"], "confirmed");

    let response = app
        .request(Method::GET, "/api/orders?status=confirmed", None, Some(&admin))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = response_json(response).await;
    assert_eq!(page["data"].as_array().unwrap().len(), 1);
    assert_eq!(page["pagination"]["total"], 1);
}

#[tokio::test]
async fn out_of_range_amounts_are_rejected_without_writing() {
    let app = TestApp::new().await;

    for items in [
        json!([{ "id": "villa", "name": "Villa Deep Clean", "quantity": 2, "price": 7e28 }]),
        json!([{ "id": "villa", "name": "Villa Deep Clean", "quantity": 1, "price": 100000000 }]),
        json!([{ "id": "tap", "name": "Tap Repair", "quantity": 5000, "price": 199 }]),
        json!([
            { "id": "a", "name": "Estate Clean", "quantity": 1000, "price": 99999 },
            { "id": "b", "name": "Estate Clean", "quantity": 1000, "price": 1 }
        ]),
    ] {
        let response = app
            .request(Method::POST, "/api/checkout", Some(checkout_body(items)), None)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response_json(response).await["message"].is_string());
    }

    assert_eq!(app.order_count().await, 0);
    assert_eq!(app.order_item_count().await, 0);
}
