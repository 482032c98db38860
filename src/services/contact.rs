use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::entities::contact_message;
use crate::errors::ServiceError;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ContactRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, max = 255, message = "Subject is required"))]
    pub subject: String,
    #[validate(length(min = 1, max = 5000, message = "Message is required"))]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContactMessageResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl From<contact_message::Model> for ContactMessageResponse {
    fn from(m: contact_message::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            email: m.email,
            subject: m.subject,
            message: m.message,
            created_at: m.created_at,
        }
    }
}

#[derive(Clone)]
pub struct ContactService {
    db: Arc<DatabaseConnection>,
}

impl ContactService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request))]
    pub async fn submit(&self, request: ContactRequest) -> Result<ContactMessageResponse, ServiceError> {
        request.validate()?;
        let trimmed = |s: &str| s.trim().to_string();
        if request.message.trim().is_empty() || request.name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "name and message must not be blank".into(),
            ));
        }

        let saved = contact_message::ActiveModel {
            name: Set(trimmed(&request.name)),
            email: Set(request.email.trim().to_ascii_lowercase()),
            subject: Set(trimmed(&request.subject)),
            message: Set(trimmed(&request.message)),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(contact_id = saved.id, "contact message received");
        Ok(saved.into())
    }

    /// Newest first
    pub async fn list(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<ContactMessageResponse>, u64), ServiceError> {
        let paginator = contact_message::Entity::find()
            .order_by_desc(contact_message::Column::CreatedAt)
            .order_by_desc(contact_message::Column::Id)
            .paginate(&*self.db, per_page);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((rows.into_iter().map(Into::into).collect(), total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_request_requires_valid_email() {
        let request = ContactRequest {
            name: "Ravi".into(),
            email: "not-an-email".into(),
            subject: "Booking".into(),
            message: "Please call me".into(),
        };
        assert!(request.validate().is_err());
    }

    #[tokio::test]
    async fn blank_message_is_rejected_before_touching_the_database() {
        let service = ContactService::new(Arc::new(DatabaseConnection::Disconnected));
        let err = service
            .submit(ContactRequest {
                name: "Ravi".into(),
                email: "ravi@example.in".into(),
                subject: "Booking".into(),
                message: "   ".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }
}
