use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    auth::{AdminUser, AuthUser},
    errors::ServiceError,
    handlers::common::{success_response, validate_input, ApiJson, PaginatedResponse},
    services::orders::{OrderResponse, UpdateOrderStatusRequest},
    AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct OrderListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
    /// Exact status to filter on, e.g. `pending`
    pub status: Option<String>,
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    20
}

#[utoipa::path(
    get,
    path = "/api/orders",
    tag = "Orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Orders, newest first", body = PaginatedResponse<OrderResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> Result<Response, ServiceError> {
    let page = query.page.max(1);
    let per_page = query
        .per_page
        .clamp(1, crate::handlers::common::MAX_PER_PAGE);
    let (orders, total) = state
        .services
        .orders
        .list_orders(page, per_page, query.status.as_deref())
        .await?;
    Ok(success_response(PaginatedResponse::new(
        orders, page, per_page, total,
    )))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    tag = "Orders",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order with its items", body = OrderResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    let order = state.services.orders.get_order(id).await?;
    Ok(success_response(order))
}

#[utoipa::path(
    put,
    path = "/api/orders/{id}/status",
    tag = "Orders",
    params(("id" = i32, Path, description = "Order id")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = OrderResponse),
        (status = 400, description = "Invalid status", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i32>,
    ApiJson(request): ApiJson<UpdateOrderStatusRequest>,
) -> Result<Response, ServiceError> {
    validate_input(&request)?;
    tracing::debug!(admin_id = admin.id, order_id = id, "updating order status");
    let order = state.services.orders.update_status(id, request).await?;
    Ok(success_response(order))
}

#[utoipa::path(
    get,
    path = "/api/user/bookings",
    tag = "Orders",
    responses(
        (status = 200, description = "Bookings of the signed-in customer", body = [OrderResponse]),
        (status = 401, description = "Missing token", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn my_bookings(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Response, ServiceError> {
    if !user.is_customer() {
        return Err(ServiceError::Forbidden(
            "Bookings are only available to customer accounts".into(),
        ));
    }
    let orders = state.services.orders.bookings_for_profile(user.id).await?;
    Ok(success_response(orders))
}
