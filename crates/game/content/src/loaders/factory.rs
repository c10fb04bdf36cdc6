//! Content factory for building catalogs from a data directory.

use std::path::{Path, PathBuf};

use mud_core::CombatConfig;

use crate::loaders::{ConfigLoader, LoadResult, SpellLoader};
use crate::spellbook::SpellBook;

/// Content factory that loads all combat content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── combat.toml
/// └── spells.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Factory over the data bundled with this crate.
    pub fn bundled() -> Self {
        Self::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("data"))
    }

    /// Load combat tuning from `combat.toml`, or defaults when absent.
    pub fn load_config(&self) -> LoadResult<CombatConfig> {
        let path = self.data_dir.join("combat.toml");
        if !path.exists() {
            tracing::info!(
                target: "mud::content",
                path = %path.display(),
                "no combat config, using defaults"
            );
            return Ok(CombatConfig::default());
        }
        ConfigLoader::load(&path)
    }

    /// Load the spell catalog from `spells.ron`.
    pub fn load_spells(&self) -> LoadResult<SpellBook> {
        let path = self.data_dir.join("spells.ron");
        SpellLoader::load(&path)
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use mud_core::SpellCatalog;

    use super::*;

    #[test]
    fn bundled_content_loads() {
        let factory = ContentFactory::bundled();
        let config = factory.load_config().unwrap();
        assert_eq!(config.heal_threat_multiplier, 2.0);

        let spells = factory.load_spells().unwrap();
        assert!(spells.contains("renew"));
        assert_eq!(spells.canonical_id("fb"), Some("firebolt"));
    }

    #[test]
    fn missing_config_falls_back_to_defaults() {
        let factory = ContentFactory::new("/nonexistent/mud-data");
        assert_eq!(factory.load_config().unwrap(), CombatConfig::default());
        assert!(factory.load_spells().is_err());
    }
}
