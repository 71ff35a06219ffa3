//! Reward redemption: eligibility gating and the optimistic claim protocol
//!
//! Client-side checks are advisory; the authoritative balance and quota
//! checks run server-side. A server rejection after a locally-allowed claim
//! is a normal outcome (quota race lost to a concurrent claim), and always
//! pairs with a ledger rollback before it is surfaced.

use crate::errors::ClaimError;
use crate::ledger::PointsLedger;
use crate::services::{ClaimRejection, LoyaltyBackend, TransportError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Reward categories, as issued by the management backend
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RewardKind {
    Credit,
    Discount,
    Service,
    Combo,
    Referral,
}

/// Server-issued reward definition, read-only on the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardDefinition {
    pub id: String,
    pub point_cost: u64,
    pub monthly_limit: u32,
    pub valid_days: u32,
    pub kind: RewardKind,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
}

/// Record of a successful redemption, immutable once created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardClaim {
    pub reward_id: String,
    pub user_id: String,
    pub claimed_at: DateTime<Utc>,
    /// Balance immediately after the debit, as confirmed by the server
    pub resulting_balance: u64,
}

/// Why a claim is blocked. Affordability is reported before quota when both
/// fail, because it is the more actionable signal for the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimBlock {
    InsufficientPoints { needed: u64, available: u64 },
    QuotaExceeded { limit: u32 },
}

impl fmt::Display for ClaimBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClaimBlock::InsufficientPoints { needed, available } => {
                write!(f, "need {} points, have {}", needed, available)
            }
            ClaimBlock::QuotaExceeded { limit } => {
                write!(f, "monthly limit of {} reached", limit)
            }
        }
    }
}

impl From<ClaimBlock> for ClaimError {
    fn from(block: ClaimBlock) -> Self {
        match block {
            ClaimBlock::InsufficientPoints { .. } => {
                ClaimError::InsufficientPoints(block.to_string())
            }
            ClaimBlock::QuotaExceeded { .. } => ClaimError::QuotaExceeded(block.to_string()),
        }
    }
}

/// Advisory eligibility result for rendering claim buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimEligibility {
    pub allowed: bool,
    pub reason: Option<ClaimBlock>,
}

/// Pure eligibility check: affordable AND under the monthly quota
pub fn can_claim(
    reward: &RewardDefinition,
    balance: u64,
    claims_this_month: u32,
) -> ClaimEligibility {
    if balance < reward.point_cost {
        return ClaimEligibility {
            allowed: false,
            reason: Some(ClaimBlock::InsufficientPoints {
                needed: reward.point_cost,
                available: balance,
            }),
        };
    }

    if claims_this_month >= reward.monthly_limit {
        return ClaimEligibility {
            allowed: false,
            reason: Some(ClaimBlock::QuotaExceeded {
                limit: reward.monthly_limit,
            }),
        };
    }

    ClaimEligibility {
        allowed: true,
        reason: None,
    }
}

/// Drives the optimistic claim protocol against the loyalty backend
pub struct RewardRedemptionEngine {
    backend: Arc<dyn LoyaltyBackend>,
}

impl RewardRedemptionEngine {
    pub fn new(backend: Arc<dyn LoyaltyBackend>) -> Self {
        Self { backend }
    }

    /// Claim a reward. Re-validates eligibility at call time, debits the
    /// ledger optimistically, then settles from the server outcome: confirm
    /// on success, rollback on rejection or transport failure.
    ///
    /// Callers must serialize invocations per session (see `SessionEngine`);
    /// a claim arriving while another mutation is pending is rejected with
    /// `OperationPending` rather than corrupting the restore point.
    pub async fn claim(
        &self,
        user_id: &str,
        reward: &RewardDefinition,
        ledger: &mut PointsLedger,
    ) -> Result<RewardClaim, ClaimError> {
        // state may have changed since last render
        let claims_this_month = self
            .backend
            .claims_this_month(user_id, &reward.id)
            .await
            .map_err(transport)?;

        let eligibility = can_claim(reward, ledger.balance(), claims_this_month);
        if let Some(block) = eligibility.reason {
            return Err(block.into());
        }

        ledger
            .apply_optimistic(-(reward.point_cost as i64))
            .map_err(|_| ClaimError::OperationPending)?;

        match self.backend.claim_reward(user_id, &reward.id).await {
            Ok(Ok(outcome)) => {
                ledger.confirm(outcome.new_point_balance);
                info!(
                    reward_id = %reward.id,
                    balance = outcome.new_point_balance,
                    "reward claimed"
                );
                Ok(RewardClaim {
                    reward_id: reward.id.clone(),
                    user_id: user_id.to_string(),
                    claimed_at: Utc::now(),
                    resulting_balance: outcome.new_point_balance,
                })
            }
            Ok(Err(rejection)) => {
                // expected when a concurrent claim wins the quota or balance
                // race; restore the displayed balance before surfacing
                let _ = ledger.rollback();
                debug!(reward_id = %reward.id, reason = rejection.reason(), "claim rejected by server");
                Err(map_rejection(rejection))
            }
            Err(err) => {
                let _ = ledger.rollback();
                Err(transport(err))
            }
        }
    }
}

fn transport(err: TransportError) -> ClaimError {
    ClaimError::Network(err.0)
}

fn map_rejection(rejection: ClaimRejection) -> ClaimError {
    match rejection {
        ClaimRejection::InsufficientPoints { reason } => ClaimError::InsufficientPoints(reason),
        ClaimRejection::QuotaExceeded { reason } => ClaimError::QuotaExceeded(reason),
        ClaimRejection::RewardUnavailable { reason } => ClaimError::RewardUnavailable(reason),
    }
}
