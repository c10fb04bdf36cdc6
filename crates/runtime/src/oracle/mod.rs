//! Runtime wrappers around static combat content.
//!
//! The worker owns an [`OracleBundle`] and builds a [`CombatEnv`] from it for
//! every command and tick. The data is immutable at runtime; dynamic state
//! lives in the [`World`](mud_core::World).
mod spells;

use std::sync::Arc;

use mud_core::{CombatConfig, CombatEnv, DamagePolicy, SpellCatalog, StandardPolicy};

pub use spells::SpellOracle;

/// Collaborators the combat core consults, bundled for the worker.
///
/// The combat config is owned by [`EngineConfig`](crate::EngineConfig);
/// [`TickEngine::new`](crate::TickEngine::new) installs it here.
#[derive(Clone)]
pub struct OracleBundle {
    pub(crate) config: CombatConfig,
    pub(crate) policy: Arc<dyn DamagePolicy>,
    pub(crate) catalog: Arc<dyn SpellCatalog>,
}

impl OracleBundle {
    /// Bundle with the [`StandardPolicy`] gate and default combat tuning.
    pub fn new(catalog: Arc<dyn SpellCatalog>) -> Self {
        Self {
            config: CombatConfig::default(),
            policy: Arc::new(StandardPolicy),
            catalog,
        }
    }

    /// Replaces the damage policy (e.g. a PvP-aware gate from the host).
    #[must_use]
    pub fn with_policy(mut self, policy: Arc<dyn DamagePolicy>) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub(crate) fn with_config(mut self, config: CombatConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Borrowed view handed to `mud-core`.
    pub fn as_combat_env(&self) -> CombatEnv<'_> {
        CombatEnv::new(&self.config, self.policy.as_ref(), self.catalog.as_ref())
    }
}

impl std::fmt::Debug for OracleBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleBundle")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
