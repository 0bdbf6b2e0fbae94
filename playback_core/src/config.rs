//! Engine configuration.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::engine::DisplayMode;
use crate::error::PlaybackError;

/// Configuration for the story engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seed for path tie-breaks and probability conditions.
    /// `None` seeds from system entropy.
    pub seed: Option<u64>,

    /// Publish `condition.*` events for evaluated links.
    pub emit_condition_events: bool,

    /// Keep condition results of taken links in the game state.
    pub record_triggered_conditions: bool,

    /// Offer an explicit "Continue" on the first node after (re)start
    /// instead of advancing automatically.
    pub exempt_first_node_from_auto_advance: bool,

    /// Mode used to rebuild the display history when going back.
    pub display_mode: DisplayMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: None,
            emit_condition_events: true,
            record_triggered_conditions: true,
            exempt_first_node_from_auto_advance: true,
            display_mode: DisplayMode::Full,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from TOML. Missing keys take their defaults.
    pub fn from_toml_str(input: &str) -> Result<Self, PlaybackError> {
        Ok(toml::from_str(input)?)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Build the random source described by this configuration.
    pub fn build_rng(&self) -> Box<dyn RngCore> {
        match self.seed {
            Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
            None => Box::new(StdRng::from_entropy()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert!(config.seed.is_none());
        assert!(config.emit_condition_events);
        assert!(config.exempt_first_node_from_auto_advance);
        assert_eq!(config.display_mode, DisplayMode::Full);
    }

    #[test]
    fn test_from_toml_partial() {
        let config = EngineConfig::from_toml_str(
            r#"
            seed = 7
            emit_condition_events = false
            display_mode = "narrative"
            "#,
        )
        .unwrap();

        assert_eq!(config.seed, Some(7));
        assert!(!config.emit_condition_events);
        assert!(config.record_triggered_conditions);
        assert_eq!(config.display_mode, DisplayMode::Narrative);
    }

    #[test]
    fn test_invalid_toml() {
        let result = EngineConfig::from_toml_str("seed = \"not a number\"");
        assert!(matches!(result, Err(PlaybackError::Config(_))));
    }

    #[test]
    fn test_seeded_rng_is_deterministic() {
        let config = EngineConfig::default().with_seed(99);
        let mut a = config.build_rng();
        let mut b = config.build_rng();
        assert_eq!(a.next_u64(), b.next_u64());
    }
}
