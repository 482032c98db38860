use axum::{
    extract::{Path, Query, State},
    response::Response,
};

use crate::{
    auth::AuthUser,
    errors::ServiceError,
    handlers::common::{
        no_content_response, success_response, validate_input, ApiJson, PaginatedResponse,
        PaginationParams,
    },
    services::accounts::{ProfileResponse, UpdateProfileRequest},
    AppState,
};

fn customer_id(user: &AuthUser) -> Result<i32, ServiceError> {
    if user.is_customer() {
        Ok(user.id)
    } else {
        Err(ServiceError::Forbidden(
            "Only customer accounts have a profile".into(),
        ))
    }
}

#[utoipa::path(
    get,
    path = "/api/profiles",
    tag = "Profiles",
    params(PaginationParams),
    responses((status = 200, description = "Customer profiles", body = PaginatedResponse<ProfileResponse>)),
    security(("Bearer" = []))
)]
pub async fn list_profiles(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<Response, ServiceError> {
    let (page, per_page) = params.normalized();
    let (profiles, total) = state
        .services
        .accounts
        .list_profiles(page, per_page)
        .await?;
    Ok(success_response(PaginatedResponse::new(
        profiles, page, per_page, total,
    )))
}

#[utoipa::path(
    get,
    path = "/api/profiles/{id}",
    tag = "Profiles",
    params(("id" = i32, Path, description = "Profile id")),
    responses(
        (status = 200, description = "Profile", body = ProfileResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    let profile = state.services.accounts.get_profile(id).await?;
    Ok(success_response(profile))
}

#[utoipa::path(
    put,
    path = "/api/profiles/{id}",
    tag = "Profiles",
    params(("id" = i32, Path, description = "Profile id")),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ProfileResponse),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ApiJson(request): ApiJson<UpdateProfileRequest>,
) -> Result<Response, ServiceError> {
    validate_input(&request)?;
    let profile = state.services.accounts.update_profile(id, request).await?;
    Ok(success_response(profile))
}

#[utoipa::path(
    delete,
    path = "/api/profiles/{id}",
    tag = "Profiles",
    params(("id" = i32, Path, description = "Profile id")),
    responses(
        (status = 204, description = "Profile deleted; its orders become guest orders"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn delete_profile(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    state.services.accounts.delete_profile(id).await?;
    Ok(no_content_response())
}

#[utoipa::path(
    get,
    path = "/api/profiles/me",
    tag = "Profiles",
    responses(
        (status = 200, description = "Signed-in customer's profile", body = ProfileResponse),
        (status = 401, description = "Missing token", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn get_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Response, ServiceError> {
    let profile = state.services.accounts.get_profile(customer_id(&user)?).await?;
    Ok(success_response(profile))
}

#[utoipa::path(
    put,
    path = "/api/profiles/me",
    tag = "Profiles",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ProfileResponse),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_me(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<UpdateProfileRequest>,
) -> Result<Response, ServiceError> {
    validate_input(&request)?;
    let profile = state
        .services
        .accounts
        .update_profile(customer_id(&user)?, request)
        .await?;
    Ok(success_response(profile))
}
