//! City Home Service API library
//!
//! Booking backend for a home-services business: service catalog, cart
//! pricing, checkout, coupons, customer and admin accounts, contact messages
//! and image uploads.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod cart;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod pricing;
pub mod services;
pub mod tracing;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use sea_orm::DatabaseConnection;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, services::ServeDir};

use crate::auth::{AuthConfig, AuthRouterExt, AuthService};
use crate::errors::{ErrorResponse, ServiceError};
use crate::services::notifications::WhatsAppNotifier;
use crate::services::uploads::UPLOADS_ROUTE;

/// Multipart framing allowance on top of the largest accepted file
const UPLOAD_BODY_OVERHEAD: usize = 64 * 1024;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<config::AppConfig>,
    pub auth: Arc<AuthService>,
    pub services: handlers::AppServices,
}

impl AppState {
    /// Wires every service over one connection pool
    pub fn new(
        config: config::AppConfig,
        db: DatabaseConnection,
        jwt_secret: String,
        notifier: WhatsAppNotifier,
    ) -> Self {
        let db = Arc::new(db);
        let auth = Arc::new(AuthService::new(
            AuthConfig::new(jwt_secret, Duration::from_secs(config.jwt_expiration_secs)),
            db.clone(),
        ));
        let services = handlers::AppServices::new(db.clone(), auth.clone(), &config, notifier);

        Self {
            db,
            config: Arc::new(config),
            auth,
            services,
        }
    }
}

fn cors_layer(cfg: &config::AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = cfg
        .cors_origins()
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                ::tracing::warn!(%origin, "ignoring malformed CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        ::tracing::warn!("no CORS origins configured; cross-origin browser requests will fail");
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| err.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "handler panicked".to_string());
    ::tracing::error!(panic = %detail, "request handler panicked");
    ServiceError::InternalError(detail).into_response()
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            message: "Route not found".to_string(),
            error: None,
        }),
    )
}

/// Every route, grouped by the guard it sits behind
pub fn api_routes(auth: Arc<AuthService>) -> Router<AppState> {
    use handlers::{
        auth as auth_h, cart, checkout, contact, coupons, health, main_services, offerings,
        orders, profiles, uploads, users,
    };

    let public = Router::new()
        .route("/health", get(health::health))
        .route("/auth/signup", post(auth_h::signup))
        .route("/auth/login", post(auth_h::login))
        .route("/auth/admin/signup", post(auth_h::admin_signup))
        .route("/auth/admin/login", post(auth_h::admin_login))
        .route("/api/services", get(offerings::list_services))
        .route(
            "/api/services-by-category",
            get(offerings::services_by_category),
        )
        .route("/api/offerings", get(offerings::list_offerings))
        .route("/api/offerings/:id", get(offerings::get_offering))
        .route(
            "/api/offerings/code/:code",
            get(offerings::get_offering_by_code),
        )
        .route("/api/main", get(main_services::list_active))
        .route("/api/main/:id", get(main_services::get_tile))
        .route("/api/cart/quote", post(cart::quote))
        .route("/api/coupons/code/:code", get(coupons::lookup_code))
        .route("/api/contact", post(contact::submit));

    let customer = Router::new()
        .route("/auth/refresh", post(auth_h::refresh))
        .route("/api/user/bookings", get(orders::my_bookings))
        .route(
            "/api/profiles/me",
            get(profiles::get_me).put(profiles::update_me),
        )
        .route("/api/upload", post(uploads::upload))
        .with_auth(auth.clone());

    let guest_or_customer = Router::new()
        .route("/api/checkout", post(checkout::checkout))
        .with_optional_auth(auth.clone());

    let admin = Router::new()
        .route("/auth/admin/activate/:id", put(auth_h::activate_admin))
        .route("/auth/admin/deactivate/:id", put(auth_h::deactivate_admin))
        .route("/api/offerings", post(offerings::create_offering))
        .route(
            "/api/offerings/:id",
            put(offerings::update_offering).delete(offerings::delete_offering),
        )
        .route("/api/main", post(main_services::create_tile))
        .route("/api/main/all", get(main_services::list_all))
        .route(
            "/api/main/:id",
            put(main_services::update_tile).delete(main_services::delete_tile),
        )
        .route("/api/orders", get(orders::list_orders))
        .route("/api/orders/:id", get(orders::get_order))
        .route("/api/orders/:id/status", put(orders::update_order_status))
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route(
            "/api/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/api/profiles", get(profiles::list_profiles))
        .route(
            "/api/profiles/:id",
            get(profiles::get_profile)
                .put(profiles::update_profile)
                .delete(profiles::delete_profile),
        )
        .route(
            "/api/coupons",
            get(coupons::list_coupons).post(coupons::create_coupon),
        )
        .route(
            "/api/coupons/:id",
            get(coupons::get_coupon)
                .put(coupons::update_coupon)
                .delete(coupons::delete_coupon),
        )
        .route("/api/contact", get(contact::list_messages))
        .route("/api/admin/images", post(uploads::admin_upload))
        .with_admin(auth);

    Router::new()
        .merge(public)
        .merge(customer)
        .merge(guest_or_customer)
        .merge(admin)
}

/// Full application: routes, static uploads, API docs and the middleware stack
pub fn app_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes + UPLOAD_BODY_OVERHEAD;
    let cors = cors_layer(&state.config);
    let uploads = ServeDir::new(&state.config.upload_dir);

    api_routes(state.auth.clone())
        .nest_service(UPLOADS_ROUTE, uploads)
        .merge(openapi::swagger_ui())
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
        .layer(crate::tracing::configure_http_tracing())
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}
