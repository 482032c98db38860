use axum::{extract::State, response::Response};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    cart::{Cart, CartItem},
    errors::ServiceError,
    handlers::common::{success_response, ApiJson},
    pricing::{self, Quote},
    services::coupons::CouponResponse,
    AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct QuoteRequest {
    #[serde(default, alias = "cartItems")]
    pub items: Vec<CartItem>,
    #[serde(alias = "couponCode")]
    pub coupon_code: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QuoteResponse {
    /// Cart lines after refreshing them from the catalog
    pub items: Vec<CartItem>,
    pub item_count: u32,
    pub quote: Quote,
    /// Ids the catalog does not know; priced with the submitted values
    pub unknown_items: Vec<String>,
    /// True when the catalog could not be reached
    pub stale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon: Option<CouponResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_error: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/cart/quote",
    tag = "Cart",
    request_body = QuoteRequest,
    responses(
        (status = 200, description = "Cart refreshed from the catalog and priced", body = QuoteResponse),
        (status = 400, description = "Malformed cart or amounts out of range", body = crate::errors::ErrorResponse),
    )
)]
pub async fn quote(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<QuoteRequest>,
) -> Result<Response, ServiceError> {
    let mut cart = Cart::from_items(request.items);
    let report = cart.reconcile(state.services.catalog.as_ref()).await;

    let (coupon, coupon_error) = match request
        .coupon_code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
    {
        None => (None, None),
        Some(code) => match state.services.coupons.lookup_code(code).await {
            Ok(coupon) => (Some(coupon), None),
            Err(ServiceError::NotFound(reason)) => (None, Some(reason)),
            Err(e) => return Err(e),
        },
    };

    let quote = pricing::quote(cart.lines(), coupon.as_ref().map(|c| c.discount))?;

    Ok(success_response(QuoteResponse {
        item_count: cart.item_count(),
        items: cart.into_items(),
        quote,
        unknown_items: report.unknown,
        stale: report.stale,
        coupon,
        coupon_error,
    }))
}
