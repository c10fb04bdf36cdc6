//! Combat configuration loader.

use std::path::Path;

use anyhow::Context;
use mud_core::CombatConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for combat tuning from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a [`CombatConfig`] from a TOML file. Missing keys keep their
    /// defaults.
    pub fn load(path: &Path) -> LoadResult<CombatConfig> {
        let content = read_file(path)?;
        Self::parse(&content).with_context(|| format!("in {}", path.display()))
    }

    pub fn parse(content: &str) -> LoadResult<CombatConfig> {
        let config: CombatConfig =
            toml::from_str(content).context("Failed to parse combat config TOML")?;

        anyhow::ensure!(
            config.melee_variance_min > 0.0 && config.melee_variance_min <= config.melee_variance_max,
            "melee variance bounds must satisfy 0 < min <= max (got {}..{})",
            config.melee_variance_min,
            config.melee_variance_max
        );
        anyhow::ensure!(
            config.heal_threat_multiplier >= 0.0,
            "heal_threat_multiplier must not be negative"
        );

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = ConfigLoader::parse("heal_threat_multiplier = 1.5\n").unwrap();
        assert_eq!(config.heal_threat_multiplier, 1.5);
        assert_eq!(config.in_combat_ms, CombatConfig::DEFAULT_IN_COMBAT_MS);
    }

    #[test]
    fn inverted_variance_is_rejected() {
        let err = ConfigLoader::parse("melee_variance_min = 1.5\nmelee_variance_max = 1.0\n")
            .unwrap_err();
        assert!(err.to_string().contains("variance"));
    }
}
