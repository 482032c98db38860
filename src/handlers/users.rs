//! Back-office administrator accounts (`user` table).

use axum::{
    extract::{Path, State},
    response::Response,
};

use crate::{
    auth::AdminUser,
    errors::ServiceError,
    handlers::common::{
        created_response, no_content_response, success_response, validate_input, ApiJson,
    },
    services::accounts::{AdminResponse, CreateAdminRequest, UpdateAdminRequest},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    responses((status = 200, description = "Administrator accounts", body = [AdminResponse])),
    security(("Bearer" = []))
)]
pub async fn list_users(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let admins = state.services.admins.list().await?;
    Ok(success_response(admins))
}

#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    request_body = CreateAdminRequest,
    responses(
        (status = 201, description = "Administrator created", body = AdminResponse),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateAdminRequest>,
) -> Result<Response, ServiceError> {
    validate_input(&request)?;
    let admin = state.services.admins.create(request).await?;
    Ok(created_response(admin))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = i32, Path, description = "Admin id")),
    responses(
        (status = 200, description = "Administrator", body = AdminResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    let admin = state.services.admins.get(id).await?;
    Ok(success_response(admin))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = i32, Path, description = "Admin id")),
    request_body = UpdateAdminRequest,
    responses(
        (status = 200, description = "Administrator updated", body = AdminResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ApiJson(request): ApiJson<UpdateAdminRequest>,
) -> Result<Response, ServiceError> {
    validate_input(&request)?;
    let admin = state.services.admins.update(id, request).await?;
    Ok(success_response(admin))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = i32, Path, description = "Admin id")),
    responses(
        (status = 204, description = "Administrator deleted"),
        (status = 400, description = "Cannot delete own account", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    state.services.admins.delete(actor.id, id).await?;
    Ok(no_content_response())
}
