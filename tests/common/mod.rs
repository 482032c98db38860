#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Method, Request},
    response::Response,
    Router,
};
use city_home_service::{
    app_router,
    config::AppConfig,
    db::{self, DbConfig},
    entities::{order, order_item, profile},
    services::{
        catalog::{OfferingInput, OfferingResponse},
        coupons::{CouponInput, CouponResponse},
        notifications::WhatsAppNotifier,
    },
    AppState,
};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

pub const BASE_URL: &str = "https://api.cityhome.test";
pub const TEST_SECRET: &str = "integration-test-secret-with-enough-length-0123456789";

/// Router over a fresh in-memory SQLite database, driven with `oneshot`.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub upload_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_notifier(WhatsAppNotifier::disabled()).await
    }

    pub async fn with_notifier(notifier: WhatsAppNotifier) -> Self {
        let upload_dir = TempDir::new().expect("temp upload dir");

        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.base_url = BASE_URL.to_string();
        cfg.upload_dir = upload_dir.path().to_string_lossy().into_owned();

        let pool = db::establish_connection_with_config(&DbConfig::sqlite_memory())
            .await
            .expect("failed to open in-memory database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(cfg, pool, TEST_SECRET.to_string(), notifier);
        let router = app_router(state.clone());

        Self {
            router,
            state,
            upload_dir,
        }
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Registers the first admin, who is active immediately, and returns a token.
    pub async fn admin_token(&self) -> String {
        let response = self
            .request(
                Method::POST,
                "/auth/admin/signup",
                Some(json!({
                    "name": "Head Office",
                    "email": "admin@cityhome.test",
                    "password": "admin-password-1"
                })),
                None,
            )
            .await;
        assert_eq!(response.status(), 201, "admin signup failed");
        let body = response_json(response).await;
        body["token"]
            .as_str()
            .expect("first admin receives a token")
            .to_string()
    }

    /// Signs a customer up and returns their token.
    pub async fn customer_token(&self, email: &str) -> String {
        let response = self
            .request(
                Method::POST,
                "/auth/signup",
                Some(json!({
                    "name": "Priya Sharma",
                    "email": email,
                    "phone": "9876543210",
                    "password": "customer-pass-1"
                })),
                None,
            )
            .await;
        assert_eq!(response.status(), 201, "customer signup failed");
        let body = response_json(response).await;
        body["token"].as_str().expect("token").to_string()
    }

    pub async fn seed_offering(&self, code: &str, price: Decimal, category: &str) -> OfferingResponse {
        self.state
            .services
            .catalog
            .create_offering(OfferingInput {
                service_code: code.to_string(),
                name: format!("Service {code}"),
                description: None,
                icon: None,
                price,
                category: category.to_string(),
                sub_category: None,
                image: None,
                features: None,
                requirements: None,
                exclusions: None,
                pricetable: None,
                popular: false,
                whatsapp_message: None,
            })
            .await
            .expect("seed offering")
    }

    pub async fn seed_coupon(
        &self,
        code: &str,
        discount: Decimal,
        max_uses: Option<i32>,
    ) -> CouponResponse {
        self.state
            .services
            .coupons
            .create(CouponInput {
                code: code.to_string(),
                discount,
                expiry: None,
                valid_from: None,
                valid_until: None,
                is_active: true,
                max_uses,
            })
            .await
            .expect("seed coupon")
    }

    pub async fn order_count(&self) -> u64 {
        order::Entity::find()
            .count(self.state.db.as_ref())
            .await
            .expect("count orders")
    }

    pub async fn order_item_count(&self) -> u64 {
        order_item::Entity::find()
            .count(self.state.db.as_ref())
            .await
            .expect("count order items")
    }

    pub async fn profile_count(&self) -> u64 {
        profile::Entity::find()
            .count(self.state.db.as_ref())
            .await
            .expect("count profiles")
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("response body bytes")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json response")
}

/// A checkout body with every required field filled in
pub fn checkout_body(items: Value) -> Value {
    json!({
        "name": "Arjun",
        "last_name": "Mehta",
        "email": "arjun@example.in",
        "phone": "9123456780",
        "address": "12 MG Road",
        "city": "Bengaluru",
        "state": "Karnataka",
        "pincode": "560001",
        "payment_method": "cod",
        "service_date": "2026-11-02",
        "time_slot": "10:00-12:00",
        "cart_items": items
    })
}
