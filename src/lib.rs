//! Spaflow - Loyalty & Commerce State Engine
//!
//! Client-resident state machine for spa/salon operations: cart aggregation
//! with atomic checkout, an optimistic points ledger with rollback, reward
//! redemption gating, and prize-table validation for the gamification games.
//! Persistent storage, the hosted payment processor, and the server-side
//! prize draw are external collaborators behind the traits in [`services`].

pub mod cart;
pub mod checkout;
pub mod config;
pub mod errors;
pub mod games;
pub mod ledger;
pub mod rewards;
pub mod services;
pub mod session;

pub use cart::{Cart, CartItem, CartItemId, CartItemInput, CartItemPatch};
pub use checkout::{CheckoutOrchestrator, PaymentSession, ReturnDisposition};
pub use config::EngineConfig;
pub use errors::{
    CartError, CheckoutError, ClaimError, ConfigError, EngineError, EngineResult,
    GameValidationError, LedgerError,
};
pub use games::{GameDefinition, GameItem, GameItemDraft, GameKind, PrizeValueKind, ValidatedTable};
pub use ledger::{LedgerState, PointsAccount, PointsLedger};
pub use rewards::{
    can_claim, ClaimBlock, ClaimEligibility, RewardClaim, RewardDefinition, RewardKind,
    RewardRedemptionEngine,
};
pub use services::{
    BookingLineItem, CheckoutSessionHandle, ClaimOutcome, ClaimRejection, GameConfigStore,
    LoyaltyBackend, PaymentGateway, PaymentIntentHandle, TransportError,
};
pub use session::{PaymentReceipt, SessionEngine, SharedSession};
