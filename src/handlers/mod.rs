pub mod auth;
pub mod cart;
pub mod checkout;
pub mod common;
pub mod contact;
pub mod coupons;
pub mod health;
pub mod main_services;
pub mod offerings;
pub mod orders;
pub mod profiles;
pub mod uploads;
pub mod users;

use std::sync::Arc;

use crate::auth::AuthService;
use crate::config::AppConfig;
use crate::services::{
    accounts::{AccountService, AdminService},
    catalog::CatalogService,
    checkout::CheckoutService,
    contact::ContactService,
    coupons::CouponService,
    notifications::WhatsAppNotifier,
    orders::OrderService,
    uploads::{MediaUrls, UploadService},
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub accounts: Arc<AccountService>,
    pub admins: Arc<AdminService>,
    pub catalog: Arc<CatalogService>,
    pub checkout: Arc<CheckoutService>,
    pub contact: Arc<ContactService>,
    pub coupons: Arc<CouponService>,
    pub orders: Arc<OrderService>,
    pub uploads: Arc<UploadService>,
}

impl AppServices {
    pub fn new(
        db: Arc<crate::db::DbPool>,
        auth: Arc<AuthService>,
        config: &AppConfig,
        notifier: WhatsAppNotifier,
    ) -> Self {
        let media = MediaUrls::new(config.base_url.clone());
        let catalog = CatalogService::new(db.clone(), media.clone());

        Self {
            accounts: Arc::new(AccountService::new(db.clone(), auth.clone())),
            admins: Arc::new(AdminService::new(db.clone(), auth)),
            checkout: Arc::new(CheckoutService::new(db.clone(), catalog.clone(), notifier)),
            catalog: Arc::new(catalog),
            contact: Arc::new(ContactService::new(db.clone())),
            coupons: Arc::new(CouponService::new(db.clone())),
            orders: Arc::new(OrderService::new(db)),
            uploads: Arc::new(UploadService::new(
                config.upload_dir.clone(),
                config.max_upload_bytes,
                media,
            )),
        }
    }
}
