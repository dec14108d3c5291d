//! Game configuration.
//!
//! All sections default to the standard rules, so an empty TOML document is a
//! valid configuration.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Core rule parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Year of the opening Spring.
    pub start_year: u16,
    /// Supply centers needed for solo or allied victory.
    pub solo_threshold: usize,
    /// Active alliances a faction may hold at once. None means unlimited.
    pub max_alliances_per_faction: Option<usize>,
    /// Seed for the game's random source.
    pub seed: u64,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            start_year: 2370,
            solo_threshold: 24,
            max_alliances_per_faction: Some(1),
            seed: 0,
        }
    }
}

/// Faction ability budgets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityConfig {
    pub federation_immunity_charges: u32,
    pub gorn_survival_probability: f64,
    /// Romulan intercepts and Cardassian surveillance per turn.
    pub intel_per_turn: u32,
    pub freezes_per_turn: u32,
    /// Bribes plus sabotages per turn.
    pub ferengi_actions_per_turn: u32,
}

impl Default for AbilityConfig {
    fn default() -> Self {
        Self {
            federation_immunity_charges: 3,
            gorn_survival_probability: 0.5,
            intel_per_turn: 1,
            freezes_per_turn: 1,
            ferengi_actions_per_turn: 2,
        }
    }
}

/// Ferengi latinum economy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    pub starting_latinum: u32,
    pub income_per_center: u32,
    pub bribe_cost: u32,
    pub sabotage_cost: u32,
    pub victory_threshold: u32,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            starting_latinum: 10,
            income_per_center: 3,
            bribe_cost: 8,
            sabotage_cost: 12,
            victory_threshold: 200,
        }
    }
}

/// Turn-coordination settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub orders_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            orders_timeout_secs: 300,
        }
    }
}

impl SessionConfig {
    pub fn orders_timeout(&self) -> Duration {
        Duration::from_secs(self.orders_timeout_secs)
    }
}

/// Complete game configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub rules: RulesConfig,
    pub abilities: AbilityConfig,
    pub economy: EconomyConfig,
    pub session: SessionConfig,
}

impl GameConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(content: &str) -> Result<GameConfig, ConfigError> {
        let config: GameConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<GameConfig, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Returns the same configuration with a different seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rules.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = self.abilities.gorn_survival_probability;
        if !(0.0..=1.0).contains(&p) {
            return Err(ConfigError::Invalid(format!(
                "gorn_survival_probability must be within [0, 1], got {p}"
            )));
        }
        if self.rules.solo_threshold == 0 {
            return Err(ConfigError::Invalid(
                "solo_threshold must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = GameConfig::from_toml_str("").unwrap();
        assert_eq!(config, GameConfig::default());
        assert_eq!(config.rules.start_year, 2370);
        assert_eq!(config.rules.solo_threshold, 24);
        assert_eq!(config.session.orders_timeout(), Duration::from_secs(300));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = GameConfig::from_toml_str(
            r#"
            [rules]
            seed = 42
            max_alliances_per_faction = 2

            [economy]
            bribe_cost = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.rules.seed, 42);
        assert_eq!(config.rules.max_alliances_per_faction, Some(2));
        assert_eq!(config.rules.start_year, 2370);
        assert_eq!(config.economy.bribe_cost, 5);
        assert_eq!(config.economy.sabotage_cost, 12);
    }

    #[test]
    fn rejects_bad_probability() {
        let err = GameConfig::from_toml_str(
            r#"
            [abilities]
            gorn_survival_probability = 1.5
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = GameConfig::from_toml_str("[rules\nseed = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }
}
