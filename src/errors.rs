//! Error types for the spaflow state engine
//!
//! Every subsystem gets its own error enum; `EngineError` is the root for
//! callers that cross subsystem boundaries. Validation errors are raised
//! before any collaborator call; remote-origin errors are surfaced only
//! after the paired compensating local action has run.

use thiserror::Error;

/// Cart mutation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// The cart is frozen while a checkout session for it is in flight
    #[error("cart is locked by an in-flight checkout")]
    CheckoutInFlight,
}

/// Checkout submission and reconciliation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// Empty cart or missing location; no request was sent
    #[error("invalid checkout state: {0}")]
    InvalidCheckoutState(String),

    /// A session request for this cart is already outstanding
    #[error("checkout session already in flight")]
    SessionInFlight,

    /// Payment gateway failure; the cart is retained for retry
    #[error("payment gateway error: {0}")]
    Gateway(String),
}

/// Points ledger state-machine violations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// An optimistic mutation is already unconfirmed; settle it first
    #[error("an optimistic mutation is already pending")]
    MutationPending,

    /// Rollback requested with no pending mutation to revert
    #[error("no pending mutation to roll back")]
    NothingPending,
}

/// Reward claim errors. The string payloads carry the server's reason
/// verbatim when the rejection is remote, or the local precheck detail when
/// the claim was blocked before any request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimError {
    #[error("insufficient points: {0}")]
    InsufficientPoints(String),

    #[error("monthly claim limit reached: {0}")]
    QuotaExceeded(String),

    #[error("reward unavailable: {0}")]
    RewardUnavailable(String),

    /// Another ledger mutation is still settling; the claim was not attempted
    #[error("another points operation is still settling")]
    OperationPending,

    /// Transport failure; any optimistic debit has been rolled back
    #[error("network error during claim: {0}")]
    Network(String),
}

/// Prize-table validation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameValidationError {
    /// Scratch probabilities sum past the configured budget; nothing is
    /// persisted
    #[error("prize probabilities total {total}, exceeding the {cap} budget")]
    ProbabilityExceeded { total: f64, cap: f64 },

    /// A single item's probability falls outside the 0-100 percent range
    #[error("prize probability {probability} is outside 0-100")]
    ProbabilityOutOfRange { probability: f64 },

    /// Submitted table is larger than the configured item cap
    #[error("prize table exceeds {max} items")]
    TooManyItems { max: usize },
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid configuration value: {0}")]
    InvalidValue(String),

    #[error("failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Root error type for all engine operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Claim(#[from] ClaimError),

    #[error(transparent)]
    GameValidation(#[from] GameValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Transport failure from a collaborator, after any compensating local
    /// action has already run
    #[error("collaborator unreachable: {0}")]
    Transport(String),
}

/// Convenience alias for engine results
pub type EngineResult<T> = Result<T, EngineError>;
