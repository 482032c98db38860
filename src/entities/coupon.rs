use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

/// Flat-amount discount code
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "coupons")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
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

/// Why a coupon cannot be applied right now
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CouponRejection {
    Inactive,
    NotYetValid,
    Expired,
    UsageLimitReached,
}

impl CouponRejection {
    pub fn message(self) -> &'static str {
        match self {
            Self::Inactive => "Coupon is not active",
            Self::NotYetValid => "Coupon is not valid yet",
            Self::Expired => "Coupon has expired",
            Self::UsageLimitReached => "Coupon usage limit reached",
        }
    }
}

impl Model {
    /// Checks activity, the validity window, the hard expiry and the usage cap
    /// at instant `now`.
    pub fn check_usable(&self, now: DateTime<Utc>) -> Result<(), CouponRejection> {
        if !self.is_active {
            return Err(CouponRejection::Inactive);
        }
        if matches!(self.valid_from, Some(from) if now < from) {
            return Err(CouponRejection::NotYetValid);
        }
        let expired = |limit: Option<DateTime<Utc>>| matches!(limit, Some(at) if now > at);
        if expired(self.valid_until) || expired(self.expiry) {
            return Err(CouponRejection::Expired);
        }
        if matches!(self.max_uses, Some(max) if self.current_uses >= max) {
            return Err(CouponRejection::UsageLimitReached);
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        if insert {
            if let ActiveValue::NotSet = active_model.created_at {
                active_model.created_at = Set(Utc::now());
            }
            if let ActiveValue::NotSet = active_model.current_uses {
                active_model.current_uses = Set(0);
            }
        }
        Ok(active_model)
    }
}
