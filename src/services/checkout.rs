//! Checkout: turns a submitted cart into one order row plus its item rows in
//! a single transaction, redeeming a coupon on the way.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::cart::opt_id_from_string_or_number;
use crate::entities::{order, order_item, profile};
use crate::errors::ServiceError;
use crate::pricing::{self, PricedLine, Quote};
use crate::services::catalog::CatalogService;
use crate::services::coupons;
use crate::services::notifications::{BookingNotice, WhatsAppNotifier};

/// A cart line as submitted. Fields are optional here so that a malformed
/// line is reported per item instead of failing the whole body.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CheckoutItem {
    #[serde(default, deserialize_with = "opt_id_from_string_or_number")]
    #[schema(value_type = Option<String>)]
    pub id: Option<String>,
    pub name: Option<String>,
    pub quantity: Option<i64>,
    pub price: Option<Decimal>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    #[serde(alias = "name", alias = "firstName")]
    pub first_name: Option<String>,
    #[serde(alias = "lastName")]
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    #[serde(alias = "paymentMethod")]
    pub payment_method: Option<String>,
    #[serde(default, alias = "cartItems")]
    pub cart_items: Vec<CheckoutItem>,
    #[serde(alias = "couponCode")]
    pub coupon_code: Option<String>,
    #[serde(alias = "serviceDate")]
    pub service_date: Option<NaiveDate>,
    #[serde(alias = "timeSlot")]
    pub time_slot: Option<String>,
    pub notes: Option<String>,
    /// Client-side figures; compared with the server's and otherwise ignored
    pub subtotal: Option<Decimal>,
    #[serde(alias = "convenienceFee")]
    pub convenience_fee: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub total: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderSummary {
    pub order_id: i32,
    pub order_number: String,
    pub status: String,
    pub subtotal: Decimal,
    pub convenience_fee: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub item_count: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckoutResponse {
    pub message: String,
    pub order: OrderSummary,
}

/// A cart line that passed validation
#[derive(Debug, Clone)]
struct ValidLine {
    id: String,
    name: String,
    quantity: u32,
    price: Decimal,
    category: Option<String>,
}

impl PricedLine for ValidLine {
    fn unit_price(&self) -> Decimal {
        self.price
    }

    fn quantity(&self) -> u32 {
        self.quantity
    }

    fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }
}

fn blank_to_none(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn validate_line(position: usize, item: &CheckoutItem) -> Result<ValidLine, ServiceError> {
    let invalid = |what: &str| {
        ServiceError::ValidationError(format!("Cart item {}: {}", position + 1, what))
    };

    let id = blank_to_none(item.id.as_deref()).ok_or_else(|| invalid("id is required"))?;
    let name = blank_to_none(item.name.as_deref()).ok_or_else(|| invalid("name is required"))?;
    let quantity = item
        .quantity
        .filter(|q| *q >= 1)
        .ok_or_else(|| invalid("quantity must be at least 1"))?;
    let quantity = u32::try_from(quantity)
        .ok()
        .and_then(|q| pricing::check_quantity(q).ok())
        .ok_or_else(|| {
            invalid(&format!("quantity must be at most {}", pricing::MAX_QUANTITY))
        })?;
    let price = item
        .price
        .filter(|p| *p >= Decimal::ZERO)
        .ok_or_else(|| invalid("price must be zero or more"))?;
    let price = pricing::check_price(price).map_err(|e| invalid(&e.to_string()))?;

    Ok(ValidLine {
        id,
        name,
        quantity,
        price,
        category: blank_to_none(item.category.as_deref()),
    })
}

/// `CHS-YYYYMMDD-XXXXXXXX`, the suffix taken from a v4 UUID
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(8)
        .collect::<String>()
        .to_ascii_uppercase();
    format!("CHS-{}-{}", now.format("%Y%m%d"), suffix)
}

/// Contact and address fields after validation
struct Contact {
    first_name: String,
    last_name: Option<String>,
    email: String,
    phone: String,
    address: String,
    city: String,
    state: Option<String>,
    pincode: String,
    payment_method: String,
}

#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DatabaseConnection>,
    catalog: CatalogService,
    notifier: WhatsAppNotifier,
}

impl CheckoutService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        catalog: CatalogService,
        notifier: WhatsAppNotifier,
    ) -> Self {
        Self {
            db,
            catalog,
            notifier,
        }
    }

    fn resolve_contact(
        &self,
        request: &CheckoutRequest,
        customer: Option<&profile::Model>,
    ) -> Result<Contact, ServiceError> {
        let required = |value: Option<String>, field: &str| {
            value.ok_or_else(|| ServiceError::ValidationError(format!("{} is required", field)))
        };

        let email = blank_to_none(request.email.as_deref())
            .or_else(|| customer.map(|p| p.email.clone()));
        let phone = blank_to_none(request.phone.as_deref())
            .or_else(|| customer.and_then(|p| blank_to_none(p.phone.as_deref())));

        let first_name = blank_to_none(request.first_name.as_deref())
            .or_else(|| customer.map(|p| p.name.clone()));

        Ok(Contact {
            first_name: required(first_name, "name")?,
            last_name: blank_to_none(request.last_name.as_deref()),
            email: required(email, "email")?.to_ascii_lowercase(),
            phone: required(phone, "phone")?,
            address: required(blank_to_none(request.address.as_deref()), "address")?,
            city: required(blank_to_none(request.city.as_deref()), "city")?,
            state: blank_to_none(request.state.as_deref()),
            pincode: required(blank_to_none(request.pincode.as_deref()), "pincode")?,
            payment_method: required(
                blank_to_none(request.payment_method.as_deref()),
                "payment_method",
            )?,
        })
    }

    /// Fills in categories from the catalog for lines that arrived without
    /// one. A lookup failure only means the fee is computed from what the
    /// client sent.
    async fn with_catalog_categories(&self, lines: &mut [Result<ValidLine, ServiceError>]) {
        let missing: Vec<String> = lines
            .iter()
            .filter_map(|l| l.as_ref().ok())
            .filter(|l| l.category.is_none())
            .map(|l| l.id.clone())
            .collect();
        if missing.is_empty() {
            return;
        }

        let categories: BTreeMap<String, String> = match self.catalog.categories_for(&missing).await
        {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "category lookup failed during checkout");
                return;
            }
        };
        for line in lines.iter_mut().filter_map(|l| l.as_mut().ok()) {
            if line.category.is_none() {
                line.category = categories.get(&line.id).cloned();
            }
        }
    }

    /// Places an order. `user` is the signed-in principal, if any; only
    /// customer tokens link the order to a profile.
    #[instrument(skip(self, request), fields(items = request.cart_items.len()))]
    pub async fn checkout(
        &self,
        user: Option<&AuthUser>,
        request: CheckoutRequest,
    ) -> Result<CheckoutResponse, ServiceError> {
        let customer = match user.filter(|u| u.is_customer()) {
            Some(user) => Some(
                profile::Entity::find_by_id(user.id)
                    .one(&*self.db)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::Unauthorized("Account no longer exists".into())
                    })?,
            ),
            None => None,
        };

        let contact = self.resolve_contact(&request, customer.as_ref())?;
        if request.cart_items.is_empty() {
            return Err(ServiceError::ValidationError("Cart is empty".into()));
        }

        let mut lines: Vec<Result<ValidLine, ServiceError>> = request
            .cart_items
            .iter()
            .enumerate()
            .map(|(i, item)| validate_line(i, item))
            .collect();
        self.with_catalog_categories(&mut lines).await;

        let now = Utc::now();
        let order_number = generate_order_number(now);
        let coupon_code = blank_to_none(request.coupon_code.as_deref());

        let txn = self.db.begin().await?;

        let coupon = match coupon_code.as_deref() {
            Some(code) => Some(
                coupons::find_usable(&txn, code, now)
                    .await
                    .map_err(|e| match e {
                        ServiceError::NotFound(msg) => ServiceError::ValidationError(msg),
                        other => other,
                    })?,
            ),
            None => None,
        };

        let valid: Vec<&ValidLine> = lines.iter().filter_map(|l| l.as_ref().ok()).collect();
        let quote: Quote =
            pricing::quote(valid.iter().copied(), coupon.as_ref().map(|c| c.discount))?;

        let placed = order::ActiveModel {
            order_number: Set(order_number.clone()),
            profile_id: Set(customer.as_ref().map(|p| p.id)),
            guest_email: Set(customer.is_none().then(|| contact.email.clone())),
            guest_phone: Set(customer.is_none().then(|| contact.phone.clone())),
            first_name: Set(contact.first_name.clone()),
            last_name: Set(contact.last_name.clone()),
            email: Set(contact.email.clone()),
            phone: Set(contact.phone.clone()),
            address: Set(contact.address.clone()),
            city: Set(contact.city.clone()),
            state: Set(contact.state.clone()),
            pincode: Set(contact.pincode.clone()),
            payment_method: Set(contact.payment_method.clone()),
            subtotal: Set(quote.subtotal),
            convenience_fee: Set(quote.convenience_fee),
            discount: Set(quote.discount),
            total: Set(quote.total),
            coupon_id: Set(coupon.as_ref().map(|c| c.id)),
            service_date: Set(request.service_date),
            time_slot: Set(blank_to_none(request.time_slot.as_deref())),
            notes: Set(blank_to_none(request.notes.as_deref())),
            status: Set(order::STATUS_PENDING.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| ServiceError::conflict_on_unique(e, "Order number collision, please retry"))?;

        // An invalid line returns early and drops `txn`, rolling the order back.
        let mut item_names = Vec::with_capacity(lines.len());
        for line in lines {
            let line = line?;
            order_item::ActiveModel {
                order_id: Set(placed.order_id),
                product_id: Set(line.id),
                product_name: Set(line.name.clone()),
                quantity: Set(line.quantity as i32),
                price: Set(line.price),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            item_names.push(line.name);
        }

        if let Some(coupon) = &coupon {
            coupons::redeem(&txn, coupon.id).await?;
        }

        txn.commit().await?;
        info!(
            order_id = placed.order_id,
            order_number = %placed.order_number,
            total = %placed.total,
            "order placed"
        );

        self.warn_on_client_mismatch(&request, &quote, &placed.order_number);

        self.notifier.booking_placed(BookingNotice {
            order_number: placed.order_number.clone(),
            customer_name: placed.customer_name(),
            customer_phone: placed.phone.clone(),
            total: placed.total,
            item_names: item_names.clone(),
            service_date: placed.service_date.map(|d| d.to_string()),
            time_slot: placed.time_slot.clone(),
        });

        Ok(CheckoutResponse {
            message: "Order placed successfully".to_string(),
            order: OrderSummary {
                order_id: placed.order_id,
                order_number: placed.order_number,
                status: placed.status,
                subtotal: placed.subtotal,
                convenience_fee: placed.convenience_fee,
                discount: placed.discount,
                total: placed.total,
                item_count: item_names.len(),
                created_at: placed.created_at,
            },
        })
    }

    fn warn_on_client_mismatch(&self, request: &CheckoutRequest, quote: &Quote, order_number: &str) {
        let pairs = [
            ("subtotal", request.subtotal, quote.subtotal),
            ("convenience_fee", request.convenience_fee, quote.convenience_fee),
            ("discount", request.discount, quote.discount),
            ("total", request.total, quote.total),
        ];
        for (field, client, server) in pairs {
            if let Some(client) = client {
                if client.round_dp(2) != server {
                    warn!(
                        order_number,
                        field,
                        client = %client,
                        server = %server,
                        "client total differs from server pricing"
                    );
                }
            }
        }
    }
}
