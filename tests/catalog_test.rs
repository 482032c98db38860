mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp, BASE_URL};
use rust_decimal_macros::dec;
use serde_json::json;

fn offering_body(code: &str, image: &str) -> serde_json::Value {
    json!({
        "service_code": code,
        "name": "Kitchen Deep Clean",
        "price": 1499,
        "category": "Cleaning Services",
        "subCategory": "Kitchen",
        "image": image,
        "features": ["Degreasing", "Chimney wipe"],
        "popular": true
    })
}

#[tokio::test]
async fn stored_image_paths_come_back_absolute() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    let response = app
        .request(
            Method::POST,
            "/api/offerings",
            Some(offering_body("KIT-DC", "/Uploads/kitchen.png")),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = response_json(response).await;
    let id = created["id"].as_i64().unwrap();

    let response = app
        .request(Method::GET, &format!("/api/offerings/{id}"), None, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = response_json(response).await;
    assert_eq!(
        fetched["image"],
        format!("{BASE_URL}/Uploads/kitchen.png")
    );
    assert_eq!(fetched["subCategory"], "Kitchen");
    assert_eq!(fetched["features"][1], "Chimney wipe");
}

#[tokio::test]
async fn external_image_urls_pass_through() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    let response = app
        .request(
            Method::POST,
            "/api/offerings",
            Some(offering_body("KIT-EXT", "https://cdn.example.com/k.jpg")),
            Some(&admin),
        )
        .await;
    let created = response_json(response).await;
    assert_eq!(created["image"], "https://cdn.example.com/k.jpg");
}

#[tokio::test]
async fn duplicate_service_code_conflicts() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    app.seed_offering("AC-SVC", dec!(599), "Appliance Repair").await;

    let response = app
        .request(
            Method::POST,
            "/api/offerings",
            Some(offering_body("AC-SVC", "/Uploads/ac.png")),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn catalog_writes_need_an_admin() {
    let app = TestApp::new().await;
    let response = app
        .request(
            Method::POST,
            "/api/offerings",
            Some(offering_body("NOPE", "/Uploads/x.png")),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn services_group_by_category() {
    let app = TestApp::new().await;
    app.seed_offering("BATH", dec!(499), "Cleaning Services").await;
    app.seed_offering("SOFA", dec!(699), "Cleaning Services").await;
    app.seed_offering("TAP", dec!(199), "Plumbing").await;

    let response = app
        .request(
            Method::GET,
            "/api/services-by-category?category=cleaning%20services",
            None,
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let groups = response_json(response).await;
    let groups = groups.as_array().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0]["category"], "Cleaning Services");
    assert_eq!(groups[0]["services"].as_array().unwrap().len(), 2);

    let response = app
        .request(Method::GET, "/api/offerings/code/TAP", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["price"].as_f64(), Some(199.0));

    let response = app
        .request(Method::GET, "/api/offerings/code/MISSING", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn inactive_tiles_are_hidden_from_the_public_list() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    for (category, status) in [("Cleaning", "Active"), ("Painting", "inActive")] {
        let response = app
            .request(
                Method::POST,
                "/api/main",
                Some(json!({ "category": category, "status": status })),
                Some(&admin),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app.request(Method::GET, "/api/main", None, None).await;
    let tiles = response_json(response).await;
    assert_eq!(tiles.as_array().unwrap().len(), 1);
    assert_eq!(tiles[0]["category"], "Cleaning");

    let response = app
        .request(Method::GET, "/api/main/all", None, Some(&admin))
        .await;
    assert_eq!(response_json(response).await.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn cart_quote_refreshes_prices_and_reports_coupon_problems() {
    let app = TestApp::new().await;
    let offering = app
        .seed_offering("FULL-HOME", dec!(2500), "Cleaning Services")
        .await;

    let response = app
        .request(
            Method::POST,
            "/api/cart/quote",
            Some(json!({
                "cartItems": [
                    { "id": offering.id, "name": "old name", "price": 1, "quantity": 2 },
                    { "id": "gone", "name": "Retired", "price": 50, "quantity": 1 }
                ],
                "couponCode": "MISSING"
            })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;

    assert_eq!(body["items"][0]["price"].as_f64(), Some(2500.0));
    assert_eq!(body["items"][0]["name"], offering.name);
    assert_eq!(body["unknown_items"][0], "gone");
    assert_eq!(body["stale"], false);
    assert_eq!(body["coupon_error"], "Coupon not found");
    assert!(body.get("coupon").is_none());
    // 5000 of cleaning: 39 + 10 * 10
    assert_eq!(body["quote"]["convenience_fee"].as_f64(), Some(139.0));
    assert_eq!(body["quote"]["subtotal"].as_f64(), Some(5050.0));
}

#[tokio::test]
async fn cart_quote_rejects_out_of_range_amounts() {
    let app = TestApp::new().await;

    for items in [
        json!([{ "id": "villa", "name": "Villa Deep Clean", "price": 7e28, "quantity": 2 }]),
        json!([{ "id": "villa", "name": "Villa Deep Clean", "price": 100000000, "quantity": 1 }]),
        json!([{ "id": "tap", "name": "Tap Repair", "price": 199, "quantity": 5000 }]),
    ] {
        let response = app
            .request(
                Method::POST,
                "/api/cart/quote",
                Some(json!({ "cartItems": items })),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
