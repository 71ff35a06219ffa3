//! Engine configuration with validation and defaults

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};

/// Top-level engine configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub checkout: CheckoutConfig,
    #[serde(default)]
    pub games: GamesConfig,
}

/// Checkout orchestration limits
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckoutConfig {
    /// Whether a fulfillment location must be selected before submit
    pub require_location: bool,
    /// Upper bound on line items per checkout session
    pub max_cart_items: usize,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            require_location: true,
            max_cart_items: 50,
        }
    }
}

/// Gamification prize-table limits
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GamesConfig {
    /// Probability budget for a scratch table, in percent
    pub max_probability_total: f64,
    /// Maximum items a single game may carry
    pub max_items_per_game: usize,
}

impl Default for GamesConfig {
    fn default() -> Self {
        Self {
            max_probability_total: 100.0,
            max_items_per_game: 32,
        }
    }
}

impl EngineConfig {
    /// Relaxed limits for tests and local development
    pub fn relaxed() -> Self {
        Self {
            checkout: CheckoutConfig {
                require_location: false,
                max_cart_items: 1_000,
            },
            games: GamesConfig::default(),
        }
    }

    /// Parse from TOML, then validate
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(raw).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for logical consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.checkout.max_cart_items == 0 {
            return Err(ConfigError::InvalidValue(
                "checkout.max_cart_items must be > 0".to_string(),
            ));
        }

        if self.games.max_probability_total <= 0.0 {
            return Err(ConfigError::InvalidValue(
                "games.max_probability_total must be > 0".to_string(),
            ));
        }

        if self.games.max_items_per_game == 0 {
            return Err(ConfigError::InvalidValue(
                "games.max_items_per_game must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.checkout.require_location);
    }

    #[test]
    fn test_relaxed_config_is_valid() {
        let config = EngineConfig::relaxed();
        assert!(config.validate().is_ok());
        assert!(!config.checkout.require_location);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = EngineConfig::default();
        config.checkout.max_cart_items = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let raw = r#"
            [checkout]
            require_location = false
            max_cart_items = 10

            [games]
            max_probability_total = 100.0
            max_items_per_game = 8
        "#;
        let config = EngineConfig::from_toml_str(raw).expect("parse failed");
        assert_eq!(config.checkout.max_cart_items, 10);
        assert!(!config.checkout.require_location);
    }

    #[test]
    fn test_toml_zero_item_cap_rejected() {
        let raw = r#"
            [games]
            max_probability_total = 100.0
            max_items_per_game = 0
        "#;
        assert!(EngineConfig::from_toml_str(raw).is_err());
    }
}
