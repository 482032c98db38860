use axum::{extract::State, response::Response};

use crate::{
    auth::AuthUser,
    errors::ServiceError,
    handlers::common::{created_response, ApiJson},
    services::checkout::{CheckoutRequest, CheckoutResponse},
    AppState,
};

/// Places a booking. A customer token links the order to the profile; without
/// one the order is stored as a guest order.
#[utoipa::path(
    post,
    path = "/api/checkout",
    tag = "Checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Order placed", body = CheckoutResponse),
        (status = 400, description = "Missing fields, invalid item or unusable coupon", body = crate::errors::ErrorResponse),
        (status = 403, description = "Supplied token is invalid", body = crate::errors::ErrorResponse),
    ),
    security((), ("Bearer" = []))
)]
pub async fn checkout(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    ApiJson(request): ApiJson<CheckoutRequest>,
) -> Result<Response, ServiceError> {
    let response = state
        .services
        .checkout
        .checkout(user.as_ref(), request)
        .await?;
    Ok(created_response(response))
}
