//! SeaORM entities for the booking schema. Table and column names follow the
//! existing production database, which mixes snake_case and camelCase.

pub mod admin_user;
pub mod contact_message;
pub mod coupon;
pub mod main_service;
pub mod offering;
pub mod order;
pub mod order_item;
pub mod profile;
