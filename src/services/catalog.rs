//! Bookable offerings (`services` table) and the category tiles shown on the
//! landing page (`main` table).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::cart::{CatalogEntry, CatalogLookup};
use crate::entities::{main_service, offering};
use crate::errors::ServiceError;
use crate::services::uploads::MediaUrls;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OfferingResponse {
    pub id: i32,
    pub service_code: String,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub price: Decimal,
    pub category: String,
    #[serde(rename = "subCategory")]
    pub sub_category: Option<String>,
    pub image: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub features: Option<serde_json::Value>,
    #[schema(value_type = Option<Object>)]
    pub requirements: Option<serde_json::Value>,
    #[schema(value_type = Option<Object>)]
    pub exclusions: Option<serde_json::Value>,
    #[schema(value_type = Option<Object>)]
    pub pricetable: Option<serde_json::Value>,
    pub popular: bool,
    pub whatsapp_message: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct OfferingInput {
    #[validate(length(min = 1, max = 64, message = "service_code is required"))]
    pub service_code: String,
    #[validate(length(min = 1, max = 255, message = "name is required"))]
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub price: Decimal,
    #[validate(length(min = 1, max = 255, message = "category is required"))]
    pub category: String,
    #[serde(default, rename = "subCategory", alias = "sub_category")]
    pub sub_category: Option<String>,
    pub image: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub features: Option<serde_json::Value>,
    #[schema(value_type = Option<Object>)]
    pub requirements: Option<serde_json::Value>,
    #[schema(value_type = Option<Object>)]
    pub exclusions: Option<serde_json::Value>,
    #[schema(value_type = Option<Object>)]
    pub pricetable: Option<serde_json::Value>,
    #[serde(default)]
    pub popular: bool,
    pub whatsapp_message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct OfferingUpdate {
    #[validate(length(min = 1, max = 64))]
    pub service_code: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub price: Option<Decimal>,
    #[validate(length(min = 1, max = 255))]
    pub category: Option<String>,
    #[serde(default, rename = "subCategory", alias = "sub_category")]
    pub sub_category: Option<String>,
    pub image: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub features: Option<serde_json::Value>,
    #[schema(value_type = Option<Object>)]
    pub requirements: Option<serde_json::Value>,
    #[schema(value_type = Option<Object>)]
    pub exclusions: Option<serde_json::Value>,
    #[schema(value_type = Option<Object>)]
    pub pricetable: Option<serde_json::Value>,
    pub popular: Option<bool>,
    pub whatsapp_message: Option<String>,
}

/// Offerings sharing a category
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryGroup {
    pub category: String,
    pub services: Vec<OfferingResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MainTileResponse {
    pub id: i32,
    pub category: String,
    #[serde(rename = "subCategory")]
    pub sub_category: Option<String>,
    pub icon: Option<String>,
    pub path: Option<String>,
    pub status: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct MainTileInput {
    #[validate(length(min = 1, max = 255, message = "category is required"))]
    pub category: String,
    #[serde(default, rename = "subCategory", alias = "sub_category")]
    pub sub_category: Option<String>,
    pub icon: Option<String>,
    pub path: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct MainTileUpdate {
    #[validate(length(min = 1, max = 255))]
    pub category: Option<String>,
    #[serde(default, rename = "subCategory", alias = "sub_category")]
    pub sub_category: Option<String>,
    pub icon: Option<String>,
    pub path: Option<String>,
    pub status: Option<String>,
}

/// Accepts any casing of `active`/`inactive` and returns the stored spelling
fn canonical_tile_status(status: &str) -> Result<&'static str, ServiceError> {
    match status.trim().to_ascii_lowercase().as_str() {
        "active" => Ok(main_service::STATUS_ACTIVE),
        "inactive" => Ok(main_service::STATUS_INACTIVE),
        _ => Err(ServiceError::ValidationError(
            "status must be Active or inActive".into(),
        )),
    }
}

fn ensure_price(price: Decimal) -> Result<(), ServiceError> {
    crate::pricing::check_price(price)?;
    Ok(())
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
    media: MediaUrls,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>, media: MediaUrls) -> Self {
        Self { db, media }
    }

    fn to_response(&self, model: offering::Model) -> OfferingResponse {
        OfferingResponse {
            id: model.id,
            service_code: model.service_code,
            name: model.name,
            description: model.description,
            icon: self.media.public_url_opt(model.icon.as_deref()),
            price: model.price,
            category: model.category,
            sub_category: model.sub_category,
            image: self.media.public_url_opt(model.image.as_deref()),
            features: model.features,
            requirements: model.requirements,
            exclusions: model.exclusions,
            pricetable: model.pricetable,
            popular: model.popular,
            whatsapp_message: model.whatsapp_message,
        }
    }

    fn tile_response(&self, model: main_service::Model) -> MainTileResponse {
        MainTileResponse {
            id: model.id,
            category: model.category,
            sub_category: model.sub_category,
            icon: self.media.public_url_opt(model.icon.as_deref()),
            path: model.path,
            status: model.status,
            created_at: model.created_at,
        }
    }

    fn stored_media(&self, value: Option<String>) -> Option<String> {
        trimmed(value).map(|v| self.media.to_stored(&v))
    }

    async fn find_offering(&self, id: i32) -> Result<offering::Model, ServiceError> {
        offering::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Service {} not found", id)))
    }

    /// All offerings, optionally only the popular ones
    #[instrument(skip(self))]
    pub async fn list_offerings(
        &self,
        popular: Option<bool>,
    ) -> Result<Vec<OfferingResponse>, ServiceError> {
        let mut query = offering::Entity::find();
        if let Some(popular) = popular {
            query = query.filter(offering::Column::Popular.eq(popular));
        }
        let rows = query
            .order_by_asc(offering::Column::Category)
            .order_by_asc(offering::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(rows.into_iter().map(|m| self.to_response(m)).collect())
    }

    /// Offerings grouped by category, filtered case-insensitively
    #[instrument(skip(self))]
    pub async fn offerings_by_category(
        &self,
        category: Option<&str>,
        sub_category: Option<&str>,
    ) -> Result<Vec<CategoryGroup>, ServiceError> {
        let wanted = |filter: Option<&str>, value: Option<&str>| match filter
            .map(str::trim)
            .filter(|f| !f.is_empty())
        {
            None => true,
            Some(f) => value.map_or(false, |v| v.trim().eq_ignore_ascii_case(f)),
        };

        let mut groups: BTreeMap<String, Vec<OfferingResponse>> = BTreeMap::new();
        for offering in self.list_offerings(None).await? {
            if wanted(category, Some(offering.category.as_str()))
                && wanted(sub_category, offering.sub_category.as_deref())
            {
                groups
                    .entry(offering.category.clone())
                    .or_default()
                    .push(offering);
            }
        }

        Ok(groups
            .into_iter()
            .map(|(category, services)| CategoryGroup { category, services })
            .collect())
    }

    pub async fn get_offering(&self, id: i32) -> Result<OfferingResponse, ServiceError> {
        self.find_offering(id).await.map(|m| self.to_response(m))
    }

    pub async fn get_offering_by_code(&self, code: &str) -> Result<OfferingResponse, ServiceError> {
        offering::Entity::find()
            .filter(offering::Column::ServiceCode.eq(code.trim()))
            .one(&*self.db)
            .await?
            .map(|m| self.to_response(m))
            .ok_or_else(|| ServiceError::NotFound(format!("Service '{}' not found", code)))
    }

    #[instrument(skip(self, input), fields(service_code = %input.service_code))]
    pub async fn create_offering(
        &self,
        input: OfferingInput,
    ) -> Result<OfferingResponse, ServiceError> {
        input.validate()?;
        ensure_price(input.price)?;

        let created = offering::ActiveModel {
            service_code: Set(input.service_code.trim().to_string()),
            name: Set(input.name.trim().to_string()),
            description: Set(trimmed(input.description)),
            icon: Set(self.stored_media(input.icon)),
            price: Set(input.price),
            category: Set(input.category.trim().to_string()),
            sub_category: Set(trimmed(input.sub_category)),
            image: Set(self.stored_media(input.image)),
            features: Set(input.features),
            requirements: Set(input.requirements),
            exclusions: Set(input.exclusions),
            pricetable: Set(input.pricetable),
            popular: Set(input.popular),
            whatsapp_message: Set(trimmed(input.whatsapp_message)),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(|e| ServiceError::conflict_on_unique(e, "service_code already exists"))?;

        info!(offering_id = created.id, "offering created");
        Ok(self.to_response(created))
    }

    #[instrument(skip(self, input))]
    pub async fn update_offering(
        &self,
        id: i32,
        input: OfferingUpdate,
    ) -> Result<OfferingResponse, ServiceError> {
        input.validate()?;
        let mut model: offering::ActiveModel = self.find_offering(id).await?.into();

        if let Some(code) = input.service_code {
            model.service_code = Set(code.trim().to_string());
        }
        if let Some(name) = input.name {
            model.name = Set(name.trim().to_string());
        }
        if let Some(description) = input.description {
            model.description = Set(trimmed(Some(description)));
        }
        if let Some(icon) = input.icon {
            model.icon = Set(self.stored_media(Some(icon)));
        }
        if let Some(price) = input.price {
            ensure_price(price)?;
            model.price = Set(price);
        }
        if let Some(category) = input.category {
            model.category = Set(category.trim().to_string());
        }
        if let Some(sub_category) = input.sub_category {
            model.sub_category = Set(trimmed(Some(sub_category)));
        }
        if let Some(image) = input.image {
            model.image = Set(self.stored_media(Some(image)));
        }
        if let Some(features) = input.features {
            model.features = Set(Some(features));
        }
        if let Some(requirements) = input.requirements {
            model.requirements = Set(Some(requirements));
        }
        if let Some(exclusions) = input.exclusions {
            model.exclusions = Set(Some(exclusions));
        }
        if let Some(pricetable) = input.pricetable {
            model.pricetable = Set(Some(pricetable));
        }
        if let Some(popular) = input.popular {
            model.popular = Set(popular);
        }
        if let Some(message) = input.whatsapp_message {
            model.whatsapp_message = Set(trimmed(Some(message)));
        }

        let updated = model
            .update(&*self.db)
            .await
            .map_err(|e| ServiceError::conflict_on_unique(e, "service_code already exists"))?;
        Ok(self.to_response(updated))
    }

    #[instrument(skip(self))]
    pub async fn delete_offering(&self, id: i32) -> Result<(), ServiceError> {
        let result = offering::Entity::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Service {} not found", id)));
        }
        info!(offering_id = id, "offering deleted");
        Ok(())
    }

    /// Category of each known offering id, for the checkout fee calculation
    pub async fn categories_for(
        &self,
        ids: &[String],
    ) -> Result<BTreeMap<String, String>, ServiceError> {
        let entries = self.lookup(ids).await?;
        Ok(entries
            .into_iter()
            .filter_map(|e| e.category.map(|c| (e.id, c)))
            .collect())
    }

    async fn find_tile(&self, id: i32) -> Result<main_service::Model, ServiceError> {
        main_service::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Main service {} not found", id)))
    }

    /// Tiles shown publicly
    pub async fn list_active_tiles(&self) -> Result<Vec<MainTileResponse>, ServiceError> {
        let rows = main_service::Entity::find()
            .filter(main_service::Column::Status.eq(main_service::STATUS_ACTIVE))
            .order_by_asc(main_service::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(rows.into_iter().map(|m| self.tile_response(m)).collect())
    }

    pub async fn list_all_tiles(&self) -> Result<Vec<MainTileResponse>, ServiceError> {
        let rows = main_service::Entity::find()
            .order_by_asc(main_service::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(rows.into_iter().map(|m| self.tile_response(m)).collect())
    }

    pub async fn get_tile(&self, id: i32) -> Result<MainTileResponse, ServiceError> {
        self.find_tile(id).await.map(|m| self.tile_response(m))
    }

    #[instrument(skip(self, input), fields(category = %input.category))]
    pub async fn create_tile(&self, input: MainTileInput) -> Result<MainTileResponse, ServiceError> {
        input.validate()?;
        let status = match input.status.as_deref() {
            Some(s) => canonical_tile_status(s)?,
            None => main_service::STATUS_ACTIVE,
        };

        let created = main_service::ActiveModel {
            category: Set(input.category.trim().to_string()),
            sub_category: Set(trimmed(input.sub_category)),
            icon: Set(self.stored_media(input.icon)),
            path: Set(trimmed(input.path)),
            status: Set(status.to_string()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(tile_id = created.id, "main service created");
        Ok(self.tile_response(created))
    }

    #[instrument(skip(self, input))]
    pub async fn update_tile(
        &self,
        id: i32,
        input: MainTileUpdate,
    ) -> Result<MainTileResponse, ServiceError> {
        input.validate()?;
        let mut model: main_service::ActiveModel = self.find_tile(id).await?.into();

        if let Some(category) = input.category {
            model.category = Set(category.trim().to_string());
        }
        if let Some(sub_category) = input.sub_category {
            model.sub_category = Set(trimmed(Some(sub_category)));
        }
        if let Some(icon) = input.icon {
            model.icon = Set(self.stored_media(Some(icon)));
        }
        if let Some(path) = input.path {
            model.path = Set(trimmed(Some(path)));
        }
        if let Some(status) = input.status {
            model.status = Set(canonical_tile_status(&status)?.to_string());
        }

        let updated = model.update(&*self.db).await?;
        Ok(self.tile_response(updated))
    }

    #[instrument(skip(self))]
    pub async fn delete_tile(&self, id: i32) -> Result<(), ServiceError> {
        let result = main_service::Entity::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Main service {} not found", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogLookup for CatalogService {
    async fn lookup(&self, ids: &[String]) -> Result<Vec<CatalogEntry>, ServiceError> {
        let numeric: Vec<i32> = ids
            .iter()
            .filter_map(|id| id.trim().parse::<i32>().ok())
            .collect();
        if numeric.is_empty() {
            return Ok(Vec::new());
        }

        let rows = offering::Entity::find()
            .filter(offering::Column::Id.is_in(numeric))
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|m| CatalogEntry {
                id: m.id.to_string(),
                image: self.media.public_url_opt(m.image.as_deref()),
                name: m.name,
                price: m.price,
                category: Some(m.category),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_status_is_canonicalised() {
        assert_eq!(canonical_tile_status("ACTIVE").unwrap(), "Active");
        assert_eq!(canonical_tile_status(" inactive ").unwrap(), "inActive");
        assert!(canonical_tile_status("archived").is_err());
    }

    #[test]
    fn negative_price_is_rejected() {
        assert!(ensure_price(Decimal::NEGATIVE_ONE).is_err());
        assert!(ensure_price(Decimal::ZERO).is_ok());
        assert!(ensure_price(crate::pricing::MAX_AMOUNT + Decimal::ONE).is_err());
    }
}
