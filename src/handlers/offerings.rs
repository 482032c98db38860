use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    errors::ServiceError,
    handlers::common::{
        created_response, no_content_response, success_response, validate_input, ApiJson,
    },
    services::catalog::{CategoryGroup, OfferingInput, OfferingResponse, OfferingUpdate},
    AppState,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ServicesQuery {
    /// Only offerings flagged popular (`true`) or not (`false`)
    pub popular: Option<bool>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct CategoryQuery {
    pub category: Option<String>,
    #[serde(rename = "subCategory", alias = "sub_category")]
    #[param(rename = "subCategory")]
    pub sub_category: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/services",
    tag = "Catalog",
    params(ServicesQuery),
    responses((status = 200, description = "Bookable services", body = [OfferingResponse]))
)]
pub async fn list_services(
    State(state): State<AppState>,
    Query(query): Query<ServicesQuery>,
) -> Result<Response, ServiceError> {
    let offerings = state.services.catalog.list_offerings(query.popular).await?;
    Ok(success_response(offerings))
}

#[utoipa::path(
    get,
    path = "/api/services-by-category",
    tag = "Catalog",
    params(CategoryQuery),
    responses((status = 200, description = "Services grouped by category", body = [CategoryGroup]))
)]
pub async fn services_by_category(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> Result<Response, ServiceError> {
    let groups = state
        .services
        .catalog
        .offerings_by_category(query.category.as_deref(), query.sub_category.as_deref())
        .await?;
    Ok(success_response(groups))
}

#[utoipa::path(
    get,
    path = "/api/offerings",
    tag = "Catalog",
    responses((status = 200, description = "All offerings", body = [OfferingResponse]))
)]
pub async fn list_offerings(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let offerings = state.services.catalog.list_offerings(None).await?;
    Ok(success_response(offerings))
}

#[utoipa::path(
    get,
    path = "/api/offerings/{id}",
    tag = "Catalog",
    params(("id" = i32, Path, description = "Offering id")),
    responses(
        (status = 200, description = "Offering", body = OfferingResponse),
        (status = 404, description = "Offering not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_offering(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    let offering = state.services.catalog.get_offering(id).await?;
    Ok(success_response(offering))
}

#[utoipa::path(
    get,
    path = "/api/offerings/code/{code}",
    tag = "Catalog",
    params(("code" = String, Path, description = "Service code")),
    responses(
        (status = 200, description = "Offering", body = OfferingResponse),
        (status = 404, description = "Offering not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_offering_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Response, ServiceError> {
    let offering = state.services.catalog.get_offering_by_code(&code).await?;
    Ok(success_response(offering))
}

#[utoipa::path(
    post,
    path = "/api/offerings",
    tag = "Catalog",
    request_body = OfferingInput,
    responses(
        (status = 201, description = "Offering created", body = OfferingResponse),
        (status = 400, description = "Invalid offering", body = crate::errors::ErrorResponse),
        (status = 409, description = "Duplicate service code", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn create_offering(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<OfferingInput>,
) -> Result<Response, ServiceError> {
    validate_input(&input)?;
    let offering = state.services.catalog.create_offering(input).await?;
    Ok(created_response(offering))
}

#[utoipa::path(
    put,
    path = "/api/offerings/{id}",
    tag = "Catalog",
    params(("id" = i32, Path, description = "Offering id")),
    request_body = OfferingUpdate,
    responses(
        (status = 200, description = "Offering updated", body = OfferingResponse),
        (status = 404, description = "Offering not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Duplicate service code", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_offering(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ApiJson(input): ApiJson<OfferingUpdate>,
) -> Result<Response, ServiceError> {
    validate_input(&input)?;
    let offering = state.services.catalog.update_offering(id, input).await?;
    Ok(success_response(offering))
}

#[utoipa::path(
    delete,
    path = "/api/offerings/{id}",
    tag = "Catalog",
    params(("id" = i32, Path, description = "Offering id")),
    responses(
        (status = 204, description = "Offering deleted"),
        (status = 404, description = "Offering not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn delete_offering(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    state.services.catalog.delete_offering(id).await?;
    Ok(no_content_response())
}
