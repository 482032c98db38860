use axum::{
    extract::{Path, State},
    response::Response,
};

use crate::{
    errors::ServiceError,
    handlers::common::{
        created_response, no_content_response, success_response, validate_input, ApiJson,
    },
    services::catalog::{MainTileInput, MainTileResponse, MainTileUpdate},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/main",
    tag = "Main services",
    responses((status = 200, description = "Active landing-page tiles", body = [MainTileResponse]))
)]
pub async fn list_active(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let tiles = state.services.catalog.list_active_tiles().await?;
    Ok(success_response(tiles))
}

#[utoipa::path(
    get,
    path = "/api/main/all",
    tag = "Main services",
    responses((status = 200, description = "All tiles including inactive ones", body = [MainTileResponse])),
    security(("Bearer" = []))
)]
pub async fn list_all(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let tiles = state.services.catalog.list_all_tiles().await?;
    Ok(success_response(tiles))
}

#[utoipa::path(
    get,
    path = "/api/main/{id}",
    tag = "Main services",
    params(("id" = i32, Path, description = "Tile id")),
    responses(
        (status = 200, description = "Tile", body = MainTileResponse),
        (status = 404, description = "Tile not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_tile(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    let tile = state.services.catalog.get_tile(id).await?;
    Ok(success_response(tile))
}

#[utoipa::path(
    post,
    path = "/api/main",
    tag = "Main services",
    request_body = MainTileInput,
    responses(
        (status = 201, description = "Tile created", body = MainTileResponse),
        (status = 400, description = "Invalid tile", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn create_tile(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<MainTileInput>,
) -> Result<Response, ServiceError> {
    validate_input(&input)?;
    let tile = state.services.catalog.create_tile(input).await?;
    Ok(created_response(tile))
}

#[utoipa::path(
    put,
    path = "/api/main/{id}",
    tag = "Main services",
    params(("id" = i32, Path, description = "Tile id")),
    request_body = MainTileUpdate,
    responses(
        (status = 200, description = "Tile updated", body = MainTileResponse),
        (status = 404, description = "Tile not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_tile(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ApiJson(input): ApiJson<MainTileUpdate>,
) -> Result<Response, ServiceError> {
    validate_input(&input)?;
    let tile = state.services.catalog.update_tile(id, input).await?;
    Ok(success_response(tile))
}

#[utoipa::path(
    delete,
    path = "/api/main/{id}",
    tag = "Main services",
    params(("id" = i32, Path, description = "Tile id")),
    responses(
        (status = 204, description = "Tile deleted"),
        (status = 404, description = "Tile not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn delete_tile(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    state.services.catalog.delete_tile(id).await?;
    Ok(no_content_response())
}
