//! Prize-table validation
//!
//! Runs before every persist. Orphan items (blank title or value) are
//! filtered out, never stored and never an error. Scratch tables must keep
//! their active probabilities within the 100% budget; the remainder below
//! 100 implicitly means "no prize" and is drawn server-side.

use crate::errors::GameValidationError;
use crate::games::types::{GameItem, GameItemDraft, GameKind};
use tracing::warn;

/// Result of a successful validation pass
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedTable {
    pub kind: GameKind,
    pub items: Vec<GameItem>,
    /// False when zero valid items remain: the game saves but cannot activate
    pub publishable: bool,
}

/// Validate a submitted prize table against the standard 100% budget.
/// Upsert semantics: items with an id are edits-in-place, items without are
/// additions, omissions are deletions, so validate-then-save is one
/// full-replace operation per game.
pub fn validate(
    kind: GameKind,
    drafts: &[GameItemDraft],
) -> Result<ValidatedTable, GameValidationError> {
    validate_with_cap(kind, drafts, 100.0)
}

/// Validate with a configured probability budget in place of the standard
/// 100%. Each scratch item must itself sit within 0-100 percent regardless
/// of the budget.
pub fn validate_with_cap(
    kind: GameKind,
    drafts: &[GameItemDraft],
    cap: f64,
) -> Result<ValidatedTable, GameValidationError> {
    let items: Vec<GameItem> = drafts
        .iter()
        .filter(|draft| is_well_formed(draft))
        .map(|draft| GameItem {
            id: draft.id.clone(),
            title: draft.title.trim().to_string(),
            value: draft.value.trim().to_string(),
            value_type: draft.value_type,
            color: draft.color.clone(),
            probability: draft.probability,
            is_active: draft.is_active,
        })
        .collect();

    if kind == GameKind::Scratch {
        // out-of-range items are rejected before summing, so a 130% item
        // cannot hide behind a negative sibling
        if let Some(item) = items
            .iter()
            .find(|item| !(0.0..=100.0).contains(&item.probability))
        {
            return Err(GameValidationError::ProbabilityOutOfRange {
                probability: item.probability,
            });
        }

        let total: f64 = items
            .iter()
            .filter(|item| item.is_active)
            .map(|item| item.probability)
            .sum();
        if total > cap {
            return Err(GameValidationError::ProbabilityExceeded { total, cap });
        }
    }

    let publishable = !items.is_empty();
    if !publishable {
        warn!(%kind, "prize table has no valid items and cannot activate");
    }

    Ok(ValidatedTable {
        kind,
        items,
        publishable,
    })
}

fn is_well_formed(draft: &GameItemDraft) -> bool {
    !draft.title.trim().is_empty() && !draft.value.trim().is_empty()
}
