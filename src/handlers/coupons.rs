use axum::{
    extract::{Path, State},
    response::Response,
};

use crate::{
    errors::ServiceError,
    handlers::common::{
        created_response, no_content_response, success_response, validate_input, ApiJson,
    },
    services::coupons::{CouponInput, CouponResponse, CouponUpdate},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/coupons/code/{code}",
    tag = "Coupons",
    params(("code" = String, Path, description = "Coupon code, any casing")),
    responses(
        (status = 200, description = "Coupon can be applied now", body = CouponResponse),
        (status = 404, description = "Unknown, inactive, expired or used up", body = crate::errors::ErrorResponse),
    )
)]
pub async fn lookup_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Response, ServiceError> {
    let coupon = state.services.coupons.lookup_code(&code).await?;
    Ok(success_response(coupon))
}

#[utoipa::path(
    get,
    path = "/api/coupons",
    tag = "Coupons",
    responses((status = 200, description = "All coupons", body = [CouponResponse])),
    security(("Bearer" = []))
)]
pub async fn list_coupons(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let coupons = state.services.coupons.list().await?;
    Ok(success_response(coupons))
}

#[utoipa::path(
    get,
    path = "/api/coupons/{id}",
    tag = "Coupons",
    params(("id" = i32, Path, description = "Coupon id")),
    responses(
        (status = 200, description = "Coupon", body = CouponResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn get_coupon(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    let coupon = state.services.coupons.get(id).await?;
    Ok(success_response(coupon))
}

#[utoipa::path(
    post,
    path = "/api/coupons",
    tag = "Coupons",
    request_body = CouponInput,
    responses(
        (status = 201, description = "Coupon created", body = CouponResponse),
        (status = 400, description = "Invalid coupon", body = crate::errors::ErrorResponse),
        (status = 409, description = "Duplicate code", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn create_coupon(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CouponInput>,
) -> Result<Response, ServiceError> {
    validate_input(&input)?;
    let coupon = state.services.coupons.create(input).await?;
    Ok(created_response(coupon))
}

#[utoipa::path(
    put,
    path = "/api/coupons/{id}",
    tag = "Coupons",
    params(("id" = i32, Path, description = "Coupon id")),
    request_body = CouponUpdate,
    responses(
        (status = 200, description = "Coupon updated", body = CouponResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Duplicate code", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_coupon(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ApiJson(input): ApiJson<CouponUpdate>,
) -> Result<Response, ServiceError> {
    validate_input(&input)?;
    let coupon = state.services.coupons.update(id, input).await?;
    Ok(success_response(coupon))
}

#[utoipa::path(
    delete,
    path = "/api/coupons/{id}",
    tag = "Coupons",
    params(("id" = i32, Path, description = "Coupon id")),
    responses(
        (status = 204, description = "Coupon deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn delete_coupon(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    state.services.coupons.delete(id).await?;
    Ok(no_content_response())
}
