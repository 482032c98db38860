use axum::{
    extract::{Path, State},
    response::Response,
};
use tracing::info;

use crate::{
    auth::{AdminUser, AuthUser},
    errors::ServiceError,
    handlers::common::{created_response, success_response, validate_input, ApiJson},
    services::accounts::{AdminResponse, AdminSignupResponse, AuthResponse, LoginRequest, SignupRequest},
    AppState,
};

#[utoipa::path(
    post,
    path = "/auth/signup",
    tag = "Auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid signup data", body = crate::errors::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::errors::ErrorResponse),
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SignupRequest>,
) -> Result<Response, ServiceError> {
    validate_input(&request)?;
    let response = state.services.accounts.signup(request).await?;
    Ok(created_response(response))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 401, description = "Invalid email or password", body = crate::errors::ErrorResponse),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Response, ServiceError> {
    validate_input(&request)?;
    let response = state.services.accounts.login(request).await?;
    Ok(success_response(response))
}

#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "Auth",
    responses(
        (status = 200, description = "Fresh token issued", body = AuthResponse),
        (status = 401, description = "Missing token", body = crate::errors::ErrorResponse),
        (status = 403, description = "Invalid or expired token", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn refresh(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Response, ServiceError> {
    let response = state.services.accounts.refresh(&user).await?;
    Ok(success_response(response))
}

#[utoipa::path(
    post,
    path = "/auth/admin/signup",
    tag = "Auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Admin registered; only the first admin is active", body = AdminSignupResponse),
        (status = 400, description = "Invalid signup data", body = crate::errors::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::errors::ErrorResponse),
    )
)]
pub async fn admin_signup(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SignupRequest>,
) -> Result<Response, ServiceError> {
    validate_input(&request)?;
    let response = state.services.admins.signup(request).await?;
    Ok(created_response(response))
}

#[utoipa::path(
    post,
    path = "/auth/admin/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 401, description = "Invalid email or password", body = crate::errors::ErrorResponse),
        (status = 403, description = "Account is not active", body = crate::errors::ErrorResponse),
    )
)]
pub async fn admin_login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Response, ServiceError> {
    validate_input(&request)?;
    let response = state.services.admins.login(request).await?;
    Ok(success_response(response))
}

#[utoipa::path(
    put,
    path = "/auth/admin/activate/{id}",
    tag = "Auth",
    params(("id" = i32, Path, description = "Admin id")),
    responses(
        (status = 200, description = "Admin activated", body = AdminResponse),
        (status = 404, description = "Admin not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn activate_admin(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    let admin = state.services.admins.set_active(actor.id, id, true).await?;
    info!(actor = actor.id, admin_id = id, "admin activated");
    Ok(success_response(admin))
}

#[utoipa::path(
    put,
    path = "/auth/admin/deactivate/{id}",
    tag = "Auth",
    params(("id" = i32, Path, description = "Admin id")),
    responses(
        (status = 200, description = "Admin deactivated", body = AdminResponse),
        (status = 400, description = "Cannot deactivate own account", body = crate::errors::ErrorResponse),
        (status = 404, description = "Admin not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn deactivate_admin(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    let admin = state.services.admins.set_active(actor.id, id, false).await?;
    info!(actor = actor.id, admin_id = id, "admin deactivated");
    Ok(success_response(admin))
}
