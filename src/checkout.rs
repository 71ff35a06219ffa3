//! Checkout orchestration: one cart, one session, one shot
//!
//! Converts the current cart into exactly one external payment session.
//! The cart is logically frozen from submission until success, failure, or
//! cancel; a double-submit while a request is outstanding coalesces into the
//! original instead of firing twice. Return notifications are idempotent,
//! keyed by session identity.

use crate::cart::Cart;
use crate::config::CheckoutConfig;
use crate::errors::CheckoutError;
use crate::services::{BookingLineItem, CheckoutSessionHandle, PaymentGateway};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Immutable record of a submitted checkout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSession {
    /// Collaborator-issued session identity
    pub session_id: String,
    /// Opaque redirect target; the caller performs a full navigation handoff
    pub session_url: String,
    /// Identity of the cart snapshot this session was created from
    pub snapshot_id: Uuid,
    /// Items exactly as submitted; never partially resubmitted
    pub items: Vec<BookingLineItem>,
    pub location_id: String,
}

/// What a return notification amounted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnDisposition {
    /// The session is not yet reconciled: the one-time cart clear has run
    /// and the caller must refresh the authoritative balance, then call
    /// [`CheckoutOrchestrator::mark_reconciled`]
    FirstReturn,
    /// Already reconciled; nothing happened
    Duplicate,
    /// Not a session this orchestrator issued
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubmitState {
    Idle,
    /// A session request or an issued session is outstanding
    InFlight { snapshot_id: Uuid },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionPhase {
    AwaitingReturn,
    /// Cart cleared, but the authoritative balance refresh is still owed;
    /// a repeat notification re-attempts the refresh without touching the
    /// cart again
    BalancePending,
    Reconciled,
}

/// Orchestrates cart submission and post-return reconciliation
pub struct CheckoutOrchestrator {
    gateway: Arc<dyn PaymentGateway>,
    config: CheckoutConfig,
    state: SubmitState,
    /// Issued sessions and their reconciliation phase, keyed by session id
    sessions: DashMap<String, SessionPhase>,
}

impl CheckoutOrchestrator {
    pub fn new(gateway: Arc<dyn PaymentGateway>, config: CheckoutConfig) -> Self {
        Self {
            gateway,
            config,
            state: SubmitState::Idle,
            sessions: DashMap::new(),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self.state, SubmitState::InFlight { .. })
    }

    /// Submit the cart as one atomic session request.
    ///
    /// Preconditions fail fast with no side effects. The in-flight guard is
    /// set before the gateway suspension point, so an interleaved
    /// double-submit coalesces. On failure the cart thaws intact for retry.
    pub async fn submit(
        &mut self,
        cart: &mut Cart,
        location_id: Option<&str>,
    ) -> Result<PaymentSession, CheckoutError> {
        if self.is_in_flight() {
            return Err(CheckoutError::SessionInFlight);
        }

        if cart.is_empty() {
            return Err(CheckoutError::InvalidCheckoutState(
                "cart is empty".to_string(),
            ));
        }

        let location_id = match location_id {
            Some(id) if !id.is_empty() => id.to_string(),
            _ if !self.config.require_location => String::new(),
            _ => {
                return Err(CheckoutError::InvalidCheckoutState(
                    "no fulfillment location selected".to_string(),
                ))
            }
        };

        if cart.total_items() > self.config.max_cart_items {
            return Err(CheckoutError::InvalidCheckoutState(format!(
                "cart exceeds {} items",
                self.config.max_cart_items
            )));
        }

        let snapshot_id = Uuid::new_v4();
        let items: Vec<BookingLineItem> = cart
            .snapshot()
            .iter()
            .map(|item| BookingLineItem::from_cart_item(item, &location_id))
            .collect();

        // guard and freeze before the suspension point
        self.state = SubmitState::InFlight { snapshot_id };
        cart.freeze();

        let result = self
            .gateway
            .create_checkout_session(&items, &location_id)
            .await;

        match result {
            Ok(CheckoutSessionHandle {
                session_id,
                session_url,
            }) => {
                self.sessions
                    .insert(session_id.clone(), SessionPhase::AwaitingReturn);
                info!(%session_id, %snapshot_id, items = items.len(), "checkout session created");
                Ok(PaymentSession {
                    session_id,
                    session_url,
                    snapshot_id,
                    items,
                    location_id,
                })
            }
            Err(err) => {
                // the user retains their items and may retry or cancel
                self.state = SubmitState::Idle;
                cart.unfreeze();
                warn!(%snapshot_id, error = %err, "checkout session request failed");
                Err(CheckoutError::Gateway(err.0))
            }
        }
    }

    /// Cancel before external redirect: invalidates the outstanding session
    /// request and thaws the cart. After redirect, cancellation belongs to
    /// the gateway and abandonment is an indefinite, non-erroring suspension.
    pub fn cancel(&mut self, cart: &mut Cart) {
        if let SubmitState::InFlight { snapshot_id } = self.state {
            info!(%snapshot_id, "checkout cancelled before redirect");
        }
        self.state = SubmitState::Idle;
        self.sessions
            .retain(|_, phase| *phase != SessionPhase::AwaitingReturn);
        cart.unfreeze();
    }

    /// Handle control returning from the gateway. The first notification for
    /// a known session clears the cart exactly once; the session stays
    /// unreconciled until [`mark_reconciled`](Self::mark_reconciled), so a
    /// failed balance refresh can be retried through a repeat notification.
    /// Duplicates and unknown session ids are no-ops.
    pub fn settle_return(&mut self, session_id: &str, cart: &mut Cart) -> ReturnDisposition {
        let mut phase = match self.sessions.get_mut(session_id) {
            Some(phase) => phase,
            None => return ReturnDisposition::Unknown,
        };

        match *phase {
            SessionPhase::Reconciled => ReturnDisposition::Duplicate,
            SessionPhase::BalancePending => ReturnDisposition::FirstReturn,
            SessionPhase::AwaitingReturn => {
                *phase = SessionPhase::BalancePending;
                drop(phase);
                cart.clear();
                self.state = SubmitState::Idle;
                info!(%session_id, "checkout confirmed, cart cleared");
                ReturnDisposition::FirstReturn
            }
        }
    }

    /// Close out a session once the authoritative balance has landed.
    /// Further returns for it report [`ReturnDisposition::Duplicate`].
    pub fn mark_reconciled(&self, session_id: &str) {
        if let Some(mut phase) = self.sessions.get_mut(session_id) {
            *phase = SessionPhase::Reconciled;
        }
    }
}
