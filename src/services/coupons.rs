//! Coupon administration, public code lookup and redemption.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Condition, Expr},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::entities::coupon::{self, CouponRejection};
use crate::errors::ServiceError;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CouponResponse {
    pub id: i32,
    pub code: String,
    pub discount: Decimal,
    pub expiry: Option<DateTime<Utc>>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub max_uses: Option<i32>,
    pub current_uses: i32,
    pub created_at: DateTime<Utc>,
}

impl From<coupon::Model> for CouponResponse {
    fn from(m: coupon::Model) -> Self {
        Self {
            id: m.id,
            code: m.code,
            discount: m.discount,
            expiry: m.expiry,
            valid_from: m.valid_from,
            valid_until: m.valid_until,
            is_active: m.is_active,
            max_uses: m.max_uses,
            current_uses: m.current_uses,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CouponInput {
    #[validate(length(min = 1, max = 64, message = "code is required"))]
    pub code: String,
    pub discount: Decimal,
    pub expiry: Option<DateTime<Utc>>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[validate(range(min = 1, message = "max_uses must be at least 1"))]
    pub max_uses: Option<i32>,
}

fn default_true() -> bool {
    true
}

/// Partial update. For the optional limits an absent field keeps the stored
/// value and an explicit `null` clears it.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CouponUpdate {
    #[validate(length(min = 1, max = 64))]
    pub code: Option<String>,
    pub discount: Option<Decimal>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub expiry: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub valid_from: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub valid_until: Option<Option<DateTime<Utc>>>,
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<i32>)]
    pub max_uses: Option<Option<i32>>,
}

/// Marks a field that appeared in the body, even as `null`
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Codes are matched case-insensitively and stored upper-case
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

fn ensure_discount(discount: Decimal) -> Result<(), ServiceError> {
    if discount <= Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "discount must be greater than zero".into(),
        ));
    }
    Ok(())
}

fn ensure_window(
    from: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
) -> Result<(), ServiceError> {
    if let (Some(from), Some(until)) = (from, until) {
        if from > until {
            return Err(ServiceError::ValidationError(
                "valid_from must not be after valid_until".into(),
            ));
        }
    }
    Ok(())
}

/// Looks up `code` on `conn` and checks it can be applied at `now`
pub async fn find_usable<C>(
    conn: &C,
    code: &str,
    now: DateTime<Utc>,
) -> Result<coupon::Model, ServiceError>
where
    C: ConnectionTrait,
{
    let found = coupon::Entity::find()
        .filter(coupon::Column::Code.eq(normalize_code(code)))
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Coupon not found".into()))?;

    found.check_usable(now).map_err(|reason| {
        warn!(coupon_id = found.id, reason = reason.message(), "coupon rejected");
        ServiceError::NotFound(reason.message().to_string())
    })?;
    Ok(found)
}

/// Counts one use of `coupon_id`. The update is guarded on the usage cap so
/// concurrent redemptions can never push `current_uses` past `max_uses`.
pub async fn redeem<C>(conn: &C, coupon_id: i32) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    let result = coupon::Entity::update_many()
        .col_expr(
            coupon::Column::CurrentUses,
            Expr::col(coupon::Column::CurrentUses).add(1),
        )
        .filter(coupon::Column::Id.eq(coupon_id))
        .filter(
            Condition::any()
                .add(coupon::Column::MaxUses.is_null())
                .add(Expr::col(coupon::Column::CurrentUses).lt(Expr::col(coupon::Column::MaxUses))),
        )
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(ServiceError::ValidationError(
            CouponRejection::UsageLimitReached.message().to_string(),
        ));
    }
    Ok(())
}

#[derive(Clone)]
pub struct CouponService {
    db: Arc<DatabaseConnection>,
}

impl CouponService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn find(&self, id: i32) -> Result<coupon::Model, ServiceError> {
        coupon::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Coupon {} not found", id)))
    }

    /// Public lookup. Inactive, out-of-window and exhausted coupons are
    /// reported as not found.
    #[instrument(skip(self))]
    pub async fn lookup_code(&self, code: &str) -> Result<CouponResponse, ServiceError> {
        find_usable(&*self.db, code, Utc::now()).await.map(Into::into)
    }

    pub async fn list(&self) -> Result<Vec<CouponResponse>, ServiceError> {
        let rows = coupon::Entity::find()
            .order_by_desc(coupon::Column::CreatedAt)
            .order_by_desc(coupon::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get(&self, id: i32) -> Result<CouponResponse, ServiceError> {
        self.find(id).await.map(Into::into)
    }

    #[instrument(skip(self, input), fields(code = %input.code))]
    pub async fn create(&self, input: CouponInput) -> Result<CouponResponse, ServiceError> {
        input.validate()?;
        ensure_discount(input.discount)?;
        ensure_window(input.valid_from, input.valid_until)?;

        let created = coupon::ActiveModel {
            code: Set(normalize_code(&input.code)),
            discount: Set(input.discount),
            expiry: Set(input.expiry),
            valid_from: Set(input.valid_from),
            valid_until: Set(input.valid_until),
            is_active: Set(input.is_active),
            max_uses: Set(input.max_uses),
            current_uses: Set(0),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(|e| ServiceError::conflict_on_unique(e, "Coupon code already exists"))?;

        info!(coupon_id = created.id, "coupon created");
        Ok(created.into())
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: i32, input: CouponUpdate) -> Result<CouponResponse, ServiceError> {
        input.validate()?;
        if matches!(input.max_uses, Some(Some(n)) if n < 1) {
            return Err(ServiceError::ValidationError(
                "max_uses must be at least 1".into(),
            ));
        }
        let existing = self.find(id).await?;
        ensure_window(
            input.valid_from.unwrap_or(existing.valid_from),
            input.valid_until.unwrap_or(existing.valid_until),
        )?;

        let mut model: coupon::ActiveModel = existing.into();
        if let Some(code) = input.code {
            model.code = Set(normalize_code(&code));
        }
        if let Some(discount) = input.discount {
            ensure_discount(discount)?;
            model.discount = Set(discount);
        }
        if let Some(expiry) = input.expiry {
            model.expiry = Set(expiry);
        }
        if let Some(from) = input.valid_from {
            model.valid_from = Set(from);
        }
        if let Some(until) = input.valid_until {
            model.valid_until = Set(until);
        }
        if let Some(active) = input.is_active {
            model.is_active = Set(active);
        }
        if let Some(max_uses) = input.max_uses {
            model.max_uses = Set(max_uses);
        }

        let updated = model
            .update(&*self.db)
            .await
            .map_err(|e| ServiceError::conflict_on_unique(e, "Coupon code already exists"))?;
        Ok(updated.into())
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let result = coupon::Entity::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Coupon {} not found", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn codes_are_upper_cased() {
        assert_eq!(normalize_code("  welcome50 "), "WELCOME50");
    }

    #[test]
    fn window_must_be_ordered() {
        let now = Utc::now();
        assert!(ensure_window(Some(now), Some(now + Duration::days(1))).is_ok());
        assert!(ensure_window(Some(now + Duration::days(1)), Some(now)).is_err());
        assert!(ensure_window(None, Some(now)).is_ok());
    }

    #[test]
    fn update_tells_absent_from_null() {
        let update: CouponUpdate =
            serde_json::from_value(serde_json::json!({ "max_uses": null, "valid_until": null }))
                .unwrap();
        assert_eq!(update.max_uses, Some(None));
        assert_eq!(update.valid_until, Some(None));
        assert_eq!(update.expiry, None);
        assert_eq!(update.valid_from, None);

        let update: CouponUpdate =
            serde_json::from_value(serde_json::json!({ "max_uses": 5 })).unwrap();
        assert_eq!(update.max_uses, Some(Some(5)));
    }

    #[test]
    fn discount_must_be_positive() {
        assert!(ensure_discount(Decimal::ZERO).is_err());
        assert!(ensure_discount(Decimal::ONE).is_ok());
    }
}
