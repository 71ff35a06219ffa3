use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported game variants
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    Spin,
    Scratch,
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameKind::Spin => write!(f, "spin"),
            GameKind::Scratch => write!(f, "scratch"),
        }
    }
}

/// What a prize item awards when drawn
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PrizeValueKind {
    Points,
    Discount,
    Service,
    Prize,
}

/// Prize item as submitted by the management UI. An absent id marks a new
/// addition; a present id an edit-in-place. Deletion is expressed by
/// omission from the submitted set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameItemDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub value: String,
    pub value_type: PrizeValueKind,
    pub color: String,
    /// Percent chance of this item, meaningful for scratch only
    #[serde(default)]
    pub probability: f64,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// A prize item that survived validation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub value: String,
    pub value_type: PrizeValueKind,
    pub color: String,
    pub probability: f64,
    pub is_active: bool,
}

impl GameItem {
    /// Whether this item is an edit of an existing record
    pub fn is_edit(&self) -> bool {
        self.id.is_some()
    }
}

/// Complete game configuration, the unit of persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameDefinition {
    pub kind: GameKind,
    pub items: Vec<GameItem>,
    /// Whether the table may be activated for players
    pub is_publishable: bool,
}
