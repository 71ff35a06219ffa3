//! Per-session state container
//!
//! Replaces the original app's process-wide store with an explicit,
//! injectable engine owned by the active user session. Cart and points
//! account live and die with the session; logout tears both down
//! synchronously, so nothing leaks across users.
//!
//! Single-writer model: all mutating operations take `&mut self`, so the
//! borrow checker enforces that ledger and cart mutations never interleave.
//! An embedding app that dispatches from multiple tasks wraps the engine in
//! `Arc<tokio::sync::Mutex<SessionEngine>>`, whose fair queue gives the
//! required FIFO ordering of spend/earn spans.

use crate::cart::{Cart, CartItem, CartItemId, CartItemInput, CartItemPatch};
use crate::checkout::{CheckoutOrchestrator, PaymentSession, ReturnDisposition};
use crate::config::EngineConfig;
use crate::errors::{CartError, CheckoutError, ClaimError, EngineError, GameValidationError};
use crate::games::{self, GameDefinition, GameItemDraft, GameKind, ValidatedTable};
use crate::ledger::{PointsAccount, PointsLedger};
use crate::rewards::{
    can_claim, ClaimEligibility, RewardClaim, RewardDefinition, RewardRedemptionEngine,
};
use crate::services::{GameConfigStore, LoyaltyBackend, PaymentGateway, TransportError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Shared handle for apps dispatching session operations from multiple
/// tasks. The tokio mutex is fair, so spend/earn spans queue FIFO behind the
/// in-flight one instead of interleaving.
pub type SharedSession = Arc<Mutex<SessionEngine>>;

/// Outcome of a completed in-app payment intent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub payment_intent_id: String,
    pub amount: f64,
    pub points_earned: u64,
    /// Authoritative balance after the earn credit
    pub new_balance: u64,
}

/// Session-scoped engine owning cart, ledger, and orchestration state
pub struct SessionEngine {
    user_id: String,
    config: EngineConfig,
    cart: Cart,
    ledger: PointsLedger,
    checkout: CheckoutOrchestrator,
    rewards: RewardRedemptionEngine,
    gateway: Arc<dyn PaymentGateway>,
    loyalty: Arc<dyn LoyaltyBackend>,
    game_store: Arc<dyn GameConfigStore>,
}

impl SessionEngine {
    /// Open a session: seeds the ledger from the authoritative balance
    pub async fn login(
        user_id: impl Into<String>,
        config: EngineConfig,
        gateway: Arc<dyn PaymentGateway>,
        loyalty: Arc<dyn LoyaltyBackend>,
        game_store: Arc<dyn GameConfigStore>,
    ) -> Result<Self, TransportError> {
        let user_id = user_id.into();
        let balance = loyalty.get_balance(&user_id).await?;
        info!(%user_id, balance, "session opened");

        Ok(Self {
            checkout: CheckoutOrchestrator::new(gateway.clone(), config.checkout.clone()),
            rewards: RewardRedemptionEngine::new(loyalty.clone()),
            ledger: PointsLedger::new(balance),
            cart: Cart::new(),
            user_id,
            config,
            gateway,
            loyalty,
            game_store,
        })
    }

    /// Synchronous teardown: cart emptied, points projection dropped
    pub fn logout(&mut self) {
        info!(user_id = %self.user_id, "session closed");
        self.cart.clear();
        self.ledger.reset();
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Wrap for multi-task dispatch
    pub fn into_shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    // --- cart facade ---

    pub fn add_to_cart(&mut self, input: CartItemInput) -> Result<CartItem, CartError> {
        self.cart.add(input)
    }

    pub fn remove_from_cart(&mut self, id: CartItemId) -> Result<(), CartError> {
        self.cart.remove(id)
    }

    pub fn update_cart_item(
        &mut self,
        id: CartItemId,
        patch: CartItemPatch,
    ) -> Result<(), CartError> {
        self.cart.update(id, patch)
    }

    pub fn clear_cart(&mut self) {
        self.cart.clear();
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    // --- points facade ---

    pub fn points(&self) -> PointsAccount {
        self.ledger.account()
    }

    // --- checkout ---

    /// Submit the cart as one atomic checkout session
    pub async fn submit_checkout(
        &mut self,
        location_id: Option<&str>,
    ) -> Result<PaymentSession, CheckoutError> {
        self.checkout.submit(&mut self.cart, location_id).await
    }

    /// Cancel an outstanding checkout before redirect
    pub fn cancel_checkout(&mut self) {
        self.checkout.cancel(&mut self.cart);
    }

    /// Reconcile control returning from the gateway. First return for a
    /// session clears the cart exactly once and refreshes the balance from
    /// the authoritative source; duplicates are no-ops. When the balance
    /// fetch fails the session stays unreconciled, so a retried notification
    /// re-attempts the refresh without clearing the cart a second time.
    pub async fn handle_checkout_return(
        &mut self,
        session_id: &str,
    ) -> Result<ReturnDisposition, TransportError> {
        let disposition = self.checkout.settle_return(session_id, &mut self.cart);
        if disposition == ReturnDisposition::FirstReturn {
            let balance = self.loyalty.get_balance(&self.user_id).await?;
            self.ledger.confirm(balance);
            self.checkout.mark_reconciled(session_id);
        }
        Ok(disposition)
    }

    /// Pay for a single service through the in-app payment intent flow.
    /// Earned points are credited optimistically and settled against the
    /// authoritative balance once the intent confirms.
    pub async fn pay_for_service(
        &mut self,
        service_id: &str,
        booking_id: Option<&str>,
    ) -> Result<PaymentReceipt, EngineError> {
        let handle = self
            .gateway
            .create_payment_intent(service_id, booking_id)
            .await?;

        self.ledger.apply_optimistic(handle.points_earned as i64)?;

        if let Err(err) = self.gateway.confirm_payment(&handle.payment_intent_id).await {
            let _ = self.ledger.rollback();
            return Err(err.into());
        }

        // never leave the account pending on a failed confirmation fetch
        let balance = match self.loyalty.get_balance(&self.user_id).await {
            Ok(balance) => balance,
            Err(err) => {
                let _ = self.ledger.rollback();
                return Err(err.into());
            }
        };
        self.ledger.confirm(balance);

        Ok(PaymentReceipt {
            payment_intent_id: handle.payment_intent_id,
            amount: handle.amount,
            points_earned: handle.points_earned,
            new_balance: balance,
        })
    }

    // --- rewards ---

    /// Advisory eligibility for rendering claim buttons
    pub fn reward_eligibility(
        &self,
        reward: &RewardDefinition,
        claims_this_month: u32,
    ) -> ClaimEligibility {
        can_claim(reward, self.ledger.balance(), claims_this_month)
    }

    /// Claim a reward through the optimistic debit protocol
    pub async fn claim_reward(
        &mut self,
        reward: &RewardDefinition,
    ) -> Result<RewardClaim, ClaimError> {
        self.rewards
            .claim(&self.user_id, reward, &mut self.ledger)
            .await
    }

    // --- games ---

    /// Validate a prize table and persist it when it passes. Only
    /// validator-approved tables ever reach the store.
    pub async fn publish_game(
        &self,
        kind: GameKind,
        drafts: &[GameItemDraft],
    ) -> Result<ValidatedTable, EngineError> {
        if drafts.len() > self.config.games.max_items_per_game {
            return Err(GameValidationError::TooManyItems {
                max: self.config.games.max_items_per_game,
            }
            .into());
        }

        let table =
            games::validate_with_cap(kind, drafts, self.config.games.max_probability_total)?;

        let definition = GameDefinition {
            kind: table.kind,
            items: table.items.clone(),
            is_publishable: table.publishable,
        };
        self.game_store.save_game(&definition).await?;

        Ok(table)
    }
}
