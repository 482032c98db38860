//! Order queries for the back office and for customers' booking history.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, LoaderTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::entities::{order, order_item};
use crate::errors::ServiceError;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: i32,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i32,
    pub price: Decimal,
}

impl From<order_item::Model> for OrderItemResponse {
    fn from(m: order_item::Model) -> Self {
        Self {
            id: m.id,
            product_id: m.product_id,
            product_name: m.product_name,
            quantity: m.quantity,
            price: m.price,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub order_id: i32,
    pub order_number: String,
    pub profile_id: Option<i32>,
    pub guest_email: Option<String>,
    pub guest_phone: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: Option<String>,
    pub pincode: String,
    pub payment_method: String,
    pub subtotal: Decimal,
    pub convenience_fee: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub coupon_id: Option<i32>,
    pub service_date: Option<NaiveDate>,
    pub time_slot: Option<String>,
    pub notes: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItemResponse>,
}

impl OrderResponse {
    pub fn new(o: order::Model, items: Vec<order_item::Model>) -> Self {
        Self {
            order_id: o.order_id,
            order_number: o.order_number,
            profile_id: o.profile_id,
            guest_email: o.guest_email,
            guest_phone: o.guest_phone,
            first_name: o.first_name,
            last_name: o.last_name,
            email: o.email,
            phone: o.phone,
            address: o.address,
            city: o.city,
            state: o.state,
            pincode: o.pincode,
            payment_method: o.payment_method,
            subtotal: o.subtotal,
            convenience_fee: o.convenience_fee,
            discount: o.discount,
            total: o.total,
            coupon_id: o.coupon_id,
            service_date: o.service_date,
            time_slot: o.time_slot,
            notes: o.notes,
            status: o.status,
            created_at: o.created_at,
            updated_at: o.updated_at,
            items: items.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateOrderStatusRequest {
    #[validate(length(min = 1, max = 50, message = "status must be 1-50 characters"))]
    pub status: String,
}

#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn with_items(
        &self,
        orders: Vec<order::Model>,
    ) -> Result<Vec<OrderResponse>, ServiceError> {
        let items = orders.load_many(order_item::Entity, &*self.db).await?;
        Ok(orders
            .into_iter()
            .zip(items)
            .map(|(o, items)| OrderResponse::new(o, items))
            .collect())
    }

    /// Newest first, optionally filtered by status. Returns the page and the
    /// total number of matching orders.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        page: u64,
        per_page: u64,
        status: Option<&str>,
    ) -> Result<(Vec<OrderResponse>, u64), ServiceError> {
        let mut query = order::Entity::find();
        if let Some(status) = status.map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(order::Column::Status.eq(status));
        }
        let paginator = query
            .order_by_desc(order::Column::CreatedAt)
            .order_by_desc(order::Column::OrderId)
            .paginate(&*self.db, per_page);

        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((self.with_items(orders).await?, total))
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, id: i32) -> Result<OrderResponse, ServiceError> {
        let order = order::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))?;
        let items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order.order_id))
            .order_by_asc(order_item::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(OrderResponse::new(order, items))
    }

    /// Bookings placed while signed in as `profile_id`
    #[instrument(skip(self))]
    pub async fn bookings_for_profile(
        &self,
        profile_id: i32,
    ) -> Result<Vec<OrderResponse>, ServiceError> {
        let orders = order::Entity::find()
            .filter(order::Column::ProfileId.eq(profile_id))
            .order_by_desc(order::Column::CreatedAt)
            .order_by_desc(order::Column::OrderId)
            .all(&*self.db)
            .await?;
        self.with_items(orders).await
    }

    /// Sets a free-text status. Concurrent updates are last-writer-wins.
    #[instrument(skip(self, request))]
    pub async fn update_status(
        &self,
        id: i32,
        request: UpdateOrderStatusRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request.validate()?;
        let status = request.status.trim().to_string();
        if status.is_empty() {
            return Err(ServiceError::ValidationError("status is required".into()));
        }

        let existing = order::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))?;
        let previous = existing.status.clone();

        let mut model: order::ActiveModel = existing.into();
        model.status = Set(status.clone());
        model.update(&*self.db).await?;

        info!(order_id = id, from = %previous, to = %status, "order status updated");
        self.get_order(id).await
    }
}
