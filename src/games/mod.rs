//! Gamification prize tables and their validation

pub mod types;
pub mod validator;

pub use types::{GameDefinition, GameItem, GameItemDraft, GameKind, PrizeValueKind};
pub use validator::{validate, validate_with_cap, ValidatedTable};
