//! Business logic behind the HTTP handlers. Each service owns a shared
//! database handle and is cheap to clone.

pub mod accounts;
pub mod catalog;
pub mod checkout;
pub mod contact;
pub mod coupons;
pub mod notifications;
pub mod orders;
pub mod uploads;
