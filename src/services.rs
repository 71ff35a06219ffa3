//! External collaborator interfaces
//!
//! The engine depends on, but does not implement, three remote services:
//! the payment gateway, the loyalty/ledger backend, and the game-config
//! store. All are opaque, possibly slow, possibly failing; every method is
//! an async suspension point at which other UI events may interleave.

use crate::cart::CartItem;
use crate::games::GameDefinition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One cart item mapped into the gateway's expected booking shape
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingLineItem {
    pub service_id: String,
    pub date: String,
    pub time: String,
    pub duration_minutes: u32,
    pub price: f64,
    #[serde(default)]
    pub add_ons: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub location_id: String,
}

impl BookingLineItem {
    pub fn from_cart_item(item: &CartItem, location_id: &str) -> Self {
        Self {
            service_id: item.service_id.clone(),
            date: item.date.clone(),
            time: item.time.clone(),
            duration_minutes: item.duration_minutes,
            price: item.unit_price,
            add_ons: item.add_ons.clone(),
            notes: item.notes.clone(),
            location_id: location_id.to_string(),
        }
    }
}

/// Hosted checkout session handle issued by the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSessionHandle {
    pub session_id: String,
    pub session_url: String,
}

/// In-app payment intent handle for a single service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntentHandle {
    pub payment_intent_id: String,
    pub client_secret: String,
    pub amount: f64,
    /// Points the backend will credit once the intent confirms
    pub points_earned: u64,
}

/// Outcome of a server-side reward claim
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimOutcome {
    pub new_point_balance: u64,
}

/// Server-side claim rejection, reason preserved verbatim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClaimRejection {
    InsufficientPoints { reason: String },
    QuotaExceeded { reason: String },
    RewardUnavailable { reason: String },
}

impl ClaimRejection {
    pub fn reason(&self) -> &str {
        match self {
            ClaimRejection::InsufficientPoints { reason }
            | ClaimRejection::QuotaExceeded { reason }
            | ClaimRejection::RewardUnavailable { reason } => reason,
        }
    }
}

/// Transport-level failure talking to a collaborator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("collaborator unreachable: {0}")]
pub struct TransportError(pub String);

impl From<TransportError> for crate::errors::EngineError {
    fn from(err: TransportError) -> Self {
        crate::errors::EngineError::Transport(err.0)
    }
}

/// Hosted payment processing
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create exactly one checkout session for the full item snapshot
    async fn create_checkout_session(
        &self,
        items: &[BookingLineItem],
        location_id: &str,
    ) -> Result<CheckoutSessionHandle, TransportError>;

    /// Create an in-app payment intent for a single service
    async fn create_payment_intent(
        &self,
        service_id: &str,
        booking_id: Option<&str>,
    ) -> Result<PaymentIntentHandle, TransportError>;

    /// Confirm a previously created payment intent
    async fn confirm_payment(&self, payment_intent_id: &str) -> Result<(), TransportError>;
}

/// Remote points ledger and reward claims
#[async_trait]
pub trait LoyaltyBackend: Send + Sync {
    /// Authoritative balance for the user
    async fn get_balance(&self, user_id: &str) -> Result<u64, TransportError>;

    /// Attempt a claim; `Ok(Err(..))` is a normal business rejection,
    /// `Err(..)` a transport failure
    async fn claim_reward(
        &self,
        user_id: &str,
        reward_id: &str,
    ) -> Result<Result<ClaimOutcome, ClaimRejection>, TransportError>;

    /// How many times the user has claimed this reward in the current month
    async fn claims_this_month(
        &self,
        user_id: &str,
        reward_id: &str,
    ) -> Result<u32, TransportError>;
}

/// Persistence for validated game configurations
#[async_trait]
pub trait GameConfigStore: Send + Sync {
    /// Persist a game definition; callers must only pass validator-approved
    /// tables
    async fn save_game(&self, game: &GameDefinition) -> Result<(), TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::{Cart, CartItemInput};

    #[test]
    fn test_booking_line_item_mapping() {
        let mut cart = Cart::new();
        let item = cart
            .add(CartItemInput {
                service_id: "svc-1".to_string(),
                service_name: "Hot Stone Massage".to_string(),
                date: "2026-09-01".to_string(),
                time: "14:30".to_string(),
                duration_minutes: 90,
                unit_price: Some(120.0),
                add_ons: vec!["aromatherapy".to_string()],
                notes: Some("first visit".to_string()),
            })
            .unwrap();

        let line = BookingLineItem::from_cart_item(&item, "loc-7");
        assert_eq!(line.service_id, "svc-1");
        assert_eq!(line.price, 120.0);
        assert_eq!(line.location_id, "loc-7");
        assert_eq!(line.add_ons, vec!["aromatherapy".to_string()]);
    }

    #[test]
    fn test_rejection_reason_passthrough() {
        let rejection = ClaimRejection::QuotaExceeded {
            reason: "monthly limit reached for gold-facial".to_string(),
        };
        assert_eq!(rejection.reason(), "monthly limit reached for gold-facial");
    }
}
