use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    response::Response,
};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::{
    auth::AuthUser,
    errors::ServiceError,
    handlers::common::created_response,
    services::uploads::UploadResponse,
    AppState,
};

/// Multipart body accepted by the upload endpoints
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    /// Image file; `file` is accepted as the field name too
    #[schema(value_type = String, format = Binary)]
    image: Vec<u8>,
}

/// Form fields an image may arrive under
const FILE_FIELDS: &[&str] = &["image", "file"];

fn multipart_error(err: MultipartError) -> ServiceError {
    warn!(error = %err, status = %err.status(), "rejected multipart upload");
    ServiceError::ValidationError(format!("Invalid upload: {}", err.body_text()))
}

async fn store_first_image(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<UploadResponse, ServiceError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let is_file = field
            .name()
            .map_or(false, |name| FILE_FIELDS.contains(&name));
        if !is_file {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(multipart_error)?;

        return state
            .services
            .uploads
            .store_image(file_name.as_deref(), content_type.as_deref(), &data)
            .await;
    }

    Err(ServiceError::ValidationError(
        "No file uploaded; send it in the `image` field".into(),
    ))
}

#[utoipa::path(
    post,
    path = "/api/upload",
    tag = "Uploads",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Image stored", body = UploadResponse),
        (status = 400, description = "Missing, oversized or non-image file", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing token", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn upload(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> Result<Response, ServiceError> {
    let stored = store_first_image(&state, multipart).await?;
    info!(user_id = user.id, path = %stored.path, "image uploaded");
    Ok(created_response(stored))
}

#[utoipa::path(
    post,
    path = "/api/admin/images",
    tag = "Uploads",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Image stored", body = UploadResponse),
        (status = 400, description = "Missing, oversized or non-image file", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn admin_upload(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> Result<Response, ServiceError> {
    let stored = store_first_image(&state, multipart).await?;
    info!(admin_id = user.id, path = %stored.path, "catalog image uploaded");
    Ok(created_response(stored))
}
