//! Points ledger: optimistic balance projection with rollback
//!
//! The ledger reconciles two truths: the authoritative remote balance and a
//! locally-predicted balance shown immediately for responsiveness. The
//! pending state is a tagged enum, so a double-pending mutation is a typed
//! rejection rather than silent corruption of the restore point.

use crate::errors::LedgerError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Settlement state of the local projection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerState {
    /// Balance matches the last known server value, nothing pending
    Settled,
    /// One local mutation applied speculatively; `previous` is the restore point
    OptimisticPending { previous: u64 },
}

/// Read-only snapshot of the account as the UI observes it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsAccount {
    pub balance: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_previous: Option<u64>,
}

/// In-memory projection of a user's point balance
#[derive(Debug)]
pub struct PointsLedger {
    balance: u64,
    state: LedgerState,
}

impl PointsLedger {
    /// Start from an authoritative balance (fetched at login)
    pub fn new(balance: u64) -> Self {
        Self {
            balance,
            state: LedgerState::Settled,
        }
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn state(&self) -> LedgerState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, LedgerState::OptimisticPending { .. })
    }

    /// Observable account snapshot
    pub fn account(&self) -> PointsAccount {
        PointsAccount {
            balance: self.balance,
            pending_previous: match self.state {
                LedgerState::Settled => None,
                LedgerState::OptimisticPending { previous } => Some(previous),
            },
        }
    }

    /// Apply a speculative delta. Only legal from `Settled`; decrements clamp
    /// at zero, increments never clamp.
    pub fn apply_optimistic(&mut self, delta: i64) -> Result<(), LedgerError> {
        match self.state {
            LedgerState::Settled => {
                let previous = self.balance;
                self.balance = self.balance.saturating_add_signed(delta);
                self.state = LedgerState::OptimisticPending { previous };
                debug!(previous, balance = self.balance, delta, "optimistic apply");
                Ok(())
            }
            LedgerState::OptimisticPending { .. } => Err(LedgerError::MutationPending),
        }
    }

    /// Accept the server's authoritative balance. Legal from any state and
    /// idempotent; this is the only way a confirmed value overrides the
    /// optimistic guess.
    pub fn confirm(&mut self, authoritative: u64) {
        debug!(
            local = self.balance,
            authoritative, "confirming ledger balance"
        );
        self.balance = authoritative;
        self.state = LedgerState::Settled;
    }

    /// Revert the pending mutation, restoring the pre-apply balance
    pub fn rollback(&mut self) -> Result<(), LedgerError> {
        match self.state {
            LedgerState::OptimisticPending { previous } => {
                debug!(from = self.balance, to = previous, "rolling back ledger");
                self.balance = previous;
                self.state = LedgerState::Settled;
                Ok(())
            }
            LedgerState::Settled => Err(LedgerError::NothingPending),
        }
    }

    /// Tear down at logout: zero the projection and drop any pending state
    pub fn reset(&mut self) {
        self.balance = 0;
        self.state = LedgerState::Settled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rollback_restores_previous_for_any_delta() {
        for delta in [-1_000, -40, -1, 0, 1, 40, 1_000] {
            let mut ledger = PointsLedger::new(100);
            ledger.apply_optimistic(delta).unwrap();
            ledger.rollback().unwrap();
            assert_eq!(ledger.balance(), 100, "delta {}", delta);
            assert_eq!(ledger.state(), LedgerState::Settled);
        }
    }

    #[test]
    fn test_balance_clamps_at_zero_on_decrement() {
        let mut ledger = PointsLedger::new(10);
        ledger.apply_optimistic(-50).unwrap();
        assert_eq!(ledger.balance(), 0);

        // rollback still restores the true previous value
        ledger.rollback().unwrap();
        assert_eq!(ledger.balance(), 10);
    }

    #[test]
    fn test_increment_never_clamps() {
        let mut ledger = PointsLedger::new(0);
        ledger.apply_optimistic(250).unwrap();
        assert_eq!(ledger.balance(), 250);
    }

    #[test]
    fn test_double_pending_rejected() {
        let mut ledger = PointsLedger::new(100);
        ledger.apply_optimistic(-10).unwrap();
        assert_eq!(
            ledger.apply_optimistic(-10).unwrap_err(),
            LedgerError::MutationPending
        );
        // the restore point is untouched by the rejected call
        ledger.rollback().unwrap();
        assert_eq!(ledger.balance(), 100);
    }

    #[test]
    fn test_confirm_settles_from_any_state() {
        let mut ledger = PointsLedger::new(100);
        ledger.apply_optimistic(-40).unwrap();
        ledger.confirm(60);
        assert_eq!(ledger.balance(), 60);
        assert_eq!(ledger.state(), LedgerState::Settled);
    }

    #[test]
    fn test_confirm_is_idempotent() {
        let mut ledger = PointsLedger::new(100);
        ledger.confirm(60);
        ledger.confirm(60);
        assert_eq!(ledger.balance(), 60);
    }

    #[test]
    fn test_rollback_without_pending_rejected() {
        let mut ledger = PointsLedger::new(100);
        assert_eq!(ledger.rollback().unwrap_err(), LedgerError::NothingPending);
    }

    #[test]
    fn test_account_snapshot_exposes_pending_previous() {
        let mut ledger = PointsLedger::new(100);
        assert_eq!(ledger.account().pending_previous, None);

        ledger.apply_optimistic(-40).unwrap();
        let account = ledger.account();
        assert_eq!(account.balance, 60);
        assert_eq!(account.pending_previous, Some(100));
    }

    #[test]
    fn test_balance_never_negative_across_sequences() {
        let mut ledger = PointsLedger::new(5);
        let deltas = [-3, 2, -10, 4, -1];
        for delta in deltas {
            ledger.apply_optimistic(delta).unwrap();
            // settle alternately by confirm and rollback; balance is always
            // observable and never below zero
            if delta % 2 == 0 {
                let settled = ledger.balance();
                ledger.confirm(settled);
            } else {
                ledger.rollback().unwrap();
            }
        }
    }

    #[test]
    fn test_reset_clears_projection() {
        let mut ledger = PointsLedger::new(500);
        ledger.apply_optimistic(-100).unwrap();
        ledger.reset();
        assert_eq!(ledger.balance(), 0);
        assert!(!ledger.is_pending());
    }
}
