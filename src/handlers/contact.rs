use axum::{
    extract::{Query, State},
    response::Response,
};

use crate::{
    errors::ServiceError,
    handlers::common::{
        created_response, success_response, validate_input, ApiJson, MessageResponse,
        PaginatedResponse, PaginationParams,
    },
    services::contact::{ContactMessageResponse, ContactRequest},
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/contact",
    tag = "Contact",
    request_body = ContactRequest,
    responses(
        (status = 201, description = "Message stored", body = MessageResponse),
        (status = 400, description = "Invalid message", body = crate::errors::ErrorResponse),
    )
)]
pub async fn submit(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ContactRequest>,
) -> Result<Response, ServiceError> {
    validate_input(&request)?;
    state.services.contact.submit(request).await?;
    Ok(created_response(MessageResponse::new(
        "Thank you for contacting us. We will get back to you soon.",
    )))
}

#[utoipa::path(
    get,
    path = "/api/contact",
    tag = "Contact",
    params(PaginationParams),
    responses((status = 200, description = "Contact messages, newest first", body = PaginatedResponse<ContactMessageResponse>)),
    security(("Bearer" = []))
)]
pub async fn list_messages(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<Response, ServiceError> {
    let (page, per_page) = params.normalized();
    let (messages, total) = state.services.contact.list(page, per_page).await?;
    Ok(success_response(PaginatedResponse::new(
        messages, page, per_page, total,
    )))
}
