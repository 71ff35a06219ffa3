//! Cart aggregation with derived totals
//!
//! The cart is an ordered sequence of bookable line items. Totals are always
//! recomputed from the item list; nothing is incrementally accumulated, so
//! long add/remove cycles cannot drift.

use crate::errors::CartError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque cart item identifier, generated at add time
pub type CartItemId = Uuid;

/// A bookable service line item held in the cart
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartItem {
    pub id: CartItemId,
    pub service_id: String,
    pub service_name: String,
    /// Booking date, ISO calendar date string as issued by the catalog
    pub date: String,
    /// Booking start time, catalog-issued
    pub time: String,
    pub duration_minutes: u32,
    pub unit_price: f64,
    #[serde(default)]
    pub add_ons: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Input for adding an item; the cart assigns the id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemInput {
    pub service_id: String,
    pub service_name: String,
    pub date: String,
    pub time: String,
    pub duration_minutes: u32,
    /// Missing price is treated as zero, never an error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    #[serde(default)]
    pub add_ons: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Field-wise patch for an existing item; `None` leaves the field untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartItemPatch {
    pub date: Option<String>,
    pub time: Option<String>,
    pub duration_minutes: Option<u32>,
    pub unit_price: Option<f64>,
    pub add_ons: Option<Vec<String>>,
    pub notes: Option<Option<String>>,
}

/// Ordered collection of line items owned by one session
#[derive(Debug, Default)]
pub struct Cart {
    items: Vec<CartItem>,
    /// Set while a checkout session for this cart is in flight
    frozen: bool,
}

/// Sum of item prices, recomputed from scratch on every call
pub fn total_amount(items: &[CartItem]) -> f64 {
    items.iter().map(|item| item.unit_price).sum()
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item, assigning a fresh unique id
    pub fn add(&mut self, input: CartItemInput) -> Result<CartItem, CartError> {
        self.ensure_unfrozen()?;

        let item = CartItem {
            id: Uuid::new_v4(),
            service_id: input.service_id,
            service_name: input.service_name,
            date: input.date,
            time: input.time,
            duration_minutes: input.duration_minutes,
            unit_price: input.unit_price.unwrap_or(0.0).max(0.0),
            add_ons: input.add_ons,
            notes: input.notes,
        };
        self.items.push(item.clone());
        Ok(item)
    }

    /// Remove at most one item; absent id is a no-op, not an error
    pub fn remove(&mut self, id: CartItemId) -> Result<(), CartError> {
        self.ensure_unfrozen()?;

        if let Some(pos) = self.items.iter().position(|item| item.id == id) {
            self.items.remove(pos);
        }
        Ok(())
    }

    /// Merge patch fields into an existing item, preserving its id
    pub fn update(&mut self, id: CartItemId, patch: CartItemPatch) -> Result<(), CartError> {
        self.ensure_unfrozen()?;

        if let Some(item) = self.items.iter_mut().find(|item| item.id == id) {
            if let Some(date) = patch.date {
                item.date = date;
            }
            if let Some(time) = patch.time {
                item.time = time;
            }
            if let Some(duration) = patch.duration_minutes {
                item.duration_minutes = duration;
            }
            if let Some(price) = patch.unit_price {
                item.unit_price = price.max(0.0);
            }
            if let Some(add_ons) = patch.add_ons {
                item.add_ons = add_ons;
            }
            if let Some(notes) = patch.notes {
                item.notes = notes;
            }
        }
        Ok(())
    }

    /// Empty the cart. Triggered by the user, by confirmed checkout, and by
    /// logout; bypasses the freeze because checkout confirmation clears a
    /// frozen cart.
    pub fn clear(&mut self) {
        self.items.clear();
        self.frozen = false;
    }

    /// Logically lock the cart from submission until settle
    pub(crate) fn freeze(&mut self) {
        self.frozen = true;
    }

    pub(crate) fn unfreeze(&mut self) {
        self.frozen = false;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Derived: sum of unit prices
    pub fn total_amount(&self) -> f64 {
        total_amount(&self.items)
    }

    /// Derived: item count
    pub fn total_items(&self) -> usize {
        self.items.len()
    }

    /// Immutable copy of the items for a checkout snapshot
    pub fn snapshot(&self) -> Vec<CartItem> {
        self.items.clone()
    }

    fn ensure_unfrozen(&self) -> Result<(), CartError> {
        if self.frozen {
            return Err(CartError::CheckoutInFlight);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, price: Option<f64>) -> CartItemInput {
        CartItemInput {
            service_id: format!("svc-{}", name),
            service_name: name.to_string(),
            date: "2026-09-01".to_string(),
            time: "10:00".to_string(),
            duration_minutes: 60,
            unit_price: price,
            add_ons: vec![],
            notes: None,
        }
    }

    #[test]
    fn test_totals_track_items() {
        let mut cart = Cart::new();
        let fifty = cart.add(input("massage", Some(50.0))).unwrap();
        cart.add(input("facial", Some(30.0))).unwrap();

        assert_eq!(cart.total_amount(), 80.0);
        assert_eq!(cart.total_items(), 2);

        cart.remove(fifty.id).unwrap();
        assert_eq!(cart.total_amount(), 30.0);
        assert_eq!(cart.total_items(), 1);
    }

    #[test]
    fn test_missing_price_is_zero() {
        let mut cart = Cart::new();
        let item = cart.add(input("consult", None)).unwrap();
        assert_eq!(item.unit_price, 0.0);
        assert_eq!(cart.total_amount(), 0.0);
    }

    #[test]
    fn test_negative_price_clamped() {
        let mut cart = Cart::new();
        let item = cart.add(input("oops", Some(-5.0))).unwrap();
        assert_eq!(item.unit_price, 0.0);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut cart = Cart::new();
        cart.add(input("massage", Some(50.0))).unwrap();
        cart.remove(Uuid::new_v4()).unwrap();
        assert_eq!(cart.total_items(), 1);
    }

    #[test]
    fn test_update_preserves_id_and_recomputes() {
        let mut cart = Cart::new();
        let item = cart.add(input("massage", Some(50.0))).unwrap();

        cart.update(
            item.id,
            CartItemPatch {
                unit_price: Some(75.0),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(cart.items()[0].id, item.id);
        assert_eq!(cart.total_amount(), 75.0);
    }

    #[test]
    fn test_ids_unique_within_cart() {
        let mut cart = Cart::new();
        let a = cart.add(input("a", Some(1.0))).unwrap();
        let b = cart.add(input("b", Some(1.0))).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_frozen_cart_rejects_mutation() {
        let mut cart = Cart::new();
        cart.add(input("massage", Some(50.0))).unwrap();
        cart.freeze();

        assert_eq!(
            cart.add(input("facial", Some(30.0))).unwrap_err(),
            CartError::CheckoutInFlight
        );
        let id = cart.items()[0].id;
        assert_eq!(cart.remove(id).unwrap_err(), CartError::CheckoutInFlight);
        assert_eq!(
            cart.update(id, CartItemPatch::default()).unwrap_err(),
            CartError::CheckoutInFlight
        );

        // clear still works and releases the freeze
        cart.clear();
        assert!(cart.is_empty());
        assert!(!cart.is_frozen());
    }

    #[test]
    fn test_totals_survive_many_cycles() {
        let mut cart = Cart::new();
        for _ in 0..500 {
            let item = cart.add(input("churn", Some(0.1))).unwrap();
            cart.remove(item.id).unwrap();
        }
        cart.add(input("keeper", Some(19.99))).unwrap();
        assert_eq!(cart.total_amount(), 19.99);
        assert_eq!(cart.total_items(), 1);
    }
}
