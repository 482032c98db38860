use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A bookable service, stored in the `services` table
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "services")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub service_code: String,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub icon: Option<String>,
    pub price: Decimal,
    pub category: String,
    #[sea_orm(column_name = "subCategory")]
    pub sub_category: Option<String>,
    pub image: Option<String>,
    pub features: Option<Json>,
    pub requirements: Option<Json>,
    pub exclusions: Option<Json>,
    pub pricetable: Option<Json>,
    pub popular: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub whatsapp_message: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
