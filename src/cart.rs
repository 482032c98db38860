//! Shopping cart kept by the client and echoed to the API for quotes and
//! checkout.
//!
//! The cart is a list of lines keyed by offering id. It is persisted as a JSON
//! array, and the same shape is accepted by `/api/cart/quote`.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::errors::ServiceError;
use crate::pricing::PricedLine;

/// One line of the cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    /// Offering id; numeric ids are accepted and kept as text
    #[serde(deserialize_with = "id_from_string_or_number")]
    #[schema(value_type = String)]
    pub id: String,
    pub name: String,
    pub price: Decimal,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

pub(crate) fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(Into::into)
}

pub(crate) fn opt_id_from_string_or_number<'de, D>(
    deserializer: D,
) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawId>::deserialize(deserializer)?.map(Into::into))
}

impl PricedLine for CartItem {
    fn unit_price(&self) -> Decimal {
        self.price
    }

    fn quantity(&self) -> u32 {
        self.quantity
    }

    fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }
}

/// Live catalog values for an offering
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub image: Option<String>,
    pub category: Option<String>,
}

/// Source of current catalog data used to refresh a cart
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    async fn lookup(&self, ids: &[String]) -> Result<Vec<CatalogEntry>, ServiceError>;
}

/// Result of a [`Cart::reconcile`] pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Lines whose values were replaced with catalog data
    pub refreshed: usize,
    /// Ids the catalog no longer knows; those lines keep their cached values
    pub unknown: Vec<String>,
    /// The catalog could not be reached and nothing was refreshed
    pub stale: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a cart from raw lines, merging repeated ids
    pub fn from_items(items: impl IntoIterator<Item = CartItem>) -> Self {
        let mut cart = Self::new();
        for item in items {
            cart.add(item);
        }
        cart
    }

    /// Adds a line. An id already in the cart gets its quantity increased
    /// instead of a second line.
    pub fn add(&mut self, item: CartItem) {
        match self.items.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(item.quantity.max(1));
            }
            None => {
                let quantity = item.quantity.max(1);
                self.items.push(CartItem { quantity, ..item });
            }
        }
    }

    /// Sets the quantity of `id`; zero removes the line. Returns false when the
    /// id is not in the cart.
    pub fn set_quantity(&mut self, id: &str, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(id);
        }
        match self.items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.quantity = quantity;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Total units across all lines
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, item| acc.saturating_add(item.quantity))
    }

    pub fn lines(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<CartItem> {
        self.items
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let items: Vec<CartItem> = serde_json::from_str(raw)?;
        Ok(Self::from_items(items))
    }

    /// Overwrites name, price, image and category of every line the catalog
    /// knows. A failed lookup leaves the cart untouched.
    pub async fn reconcile<C>(&mut self, catalog: &C) -> ReconcileReport
    where
        C: CatalogLookup + ?Sized,
    {
        if self.items.is_empty() {
            return ReconcileReport::default();
        }

        let ids: Vec<String> = self.items.iter().map(|item| item.id.clone()).collect();
        let entries = match catalog.lookup(&ids).await {
            Ok(entries) => entries,
            Err(err) => {
                warn!(error = %err, "catalog lookup failed; keeping cached cart values");
                return ReconcileReport {
                    stale: true,
                    ..Default::default()
                };
            }
        };

        let by_id: HashMap<&str, &CatalogEntry> =
            entries.iter().map(|e| (e.id.as_str(), e)).collect();

        let mut report = ReconcileReport::default();
        for item in &mut self.items {
            match by_id.get(item.id.as_str()) {
                Some(entry) => {
                    item.name = entry.name.clone();
                    item.price = entry.price;
                    item.image = entry.image.clone();
                    item.category = entry.category.clone();
                    report.refreshed += 1;
                }
                None => report.unknown.push(item.id.clone()),
            }
        }

        debug!(
            refreshed = report.refreshed,
            unknown = report.unknown.len(),
            "cart reconciled"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(id: &str, price: Decimal, quantity: u32) -> CartItem {
        CartItem {
            id: id.to_string(),
            name: format!("Service {id}"),
            price,
            quantity,
            image: None,
            category: None,
        }
    }

    struct FixedCatalog(Vec<CatalogEntry>);

    #[async_trait]
    impl CatalogLookup for FixedCatalog {
        async fn lookup(&self, ids: &[String]) -> Result<Vec<CatalogEntry>, ServiceError> {
            Ok(self
                .0
                .iter()
                .filter(|e| ids.contains(&e.id))
                .cloned()
                .collect())
        }
    }

    struct DownCatalog;

    #[async_trait]
    impl CatalogLookup for DownCatalog {
        async fn lookup(&self, _ids: &[String]) -> Result<Vec<CatalogEntry>, ServiceError> {
            Err(ServiceError::ExternalServiceError("catalog offline".into()))
        }
    }

    #[test]
    fn adding_same_id_merges_quantity() {
        let mut cart = Cart::new();
        cart.add(item("7", dec!(499), 1));
        cart.add(item("7", dec!(499), 2));
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 3);
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn set_quantity_zero_removes_line() {
        let mut cart = Cart::from_items([item("1", dec!(10), 1), item("2", dec!(20), 1)]);
        assert!(cart.set_quantity("1", 4));
        assert_eq!(cart.item_count(), 5);
        assert!(cart.set_quantity("1", 0));
        assert_eq!(cart.lines().len(), 1);
        assert!(!cart.set_quantity("missing", 2));
        cart.clear();
        assert!(cart.is_empty());
    }

    #[test]
    fn json_accepts_numeric_ids_and_merges() {
        let cart = Cart::from_json(
            r#"[{"id": 3, "name": "Sofa cleaning", "price": 799, "quantity": 1},
                {"id": "3", "name": "Sofa cleaning", "price": 799}]"#,
        )
        .unwrap();
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].id, "3");
        assert_eq!(cart.item_count(), 2);

        let restored = Cart::from_json(&cart.to_json().unwrap()).unwrap();
        assert_eq!(restored, cart);
    }

    #[tokio::test]
    async fn reconcile_overwrites_known_lines() {
        let mut cart = Cart::from_items([item("1", dec!(100), 2), item("9", dec!(50), 1)]);
        let catalog = FixedCatalog(vec![CatalogEntry {
            id: "1".into(),
            name: "Deep cleaning".into(),
            price: dec!(1299),
            image: Some("https://cdn.example.in/deep.png".into()),
            category: Some("Cleaning Services".into()),
        }]);

        let report = cart.reconcile(&catalog).await;
        assert_eq!(report.refreshed, 1);
        assert_eq!(report.unknown, vec!["9".to_string()]);
        assert!(!report.stale);
        assert_eq!(cart.lines()[0].price, dec!(1299));
        assert_eq!(cart.lines()[0].quantity, 2);
        assert_eq!(cart.lines()[1].price, dec!(50));
    }

    #[tokio::test]
    async fn reconcile_keeps_cached_values_when_catalog_fails() {
        let mut cart = Cart::from_items([item("1", dec!(100), 1)]);
        let before = cart.clone();
        let report = cart.reconcile(&DownCatalog).await;
        assert!(report.stale);
        assert_eq!(cart, before);
    }
}
