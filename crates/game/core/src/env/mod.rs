//! Collaborators the engine reads but never mutates.
//!
//! [`CombatEnv`] bundles the tuning config, the damage-policy gate and the
//! spell catalog so the engine can reach them without hard coupling to
//! concrete implementations. Randomness is passed separately because it is
//! the one collaborator that changes state on use.
mod catalog;
mod rng;

use std::fmt;

pub use catalog::{SpellCatalog, SpellDefinition};
pub use rng::{CombatRng, PcgRng, ScriptedRng};

use crate::combat::DamagePolicy;
use crate::config::CombatConfig;

#[derive(Clone, Copy)]
pub struct CombatEnv<'a> {
    pub config: &'a CombatConfig,
    pub policy: &'a dyn DamagePolicy,
    pub catalog: &'a dyn SpellCatalog,
}

impl<'a> CombatEnv<'a> {
    pub fn new(
        config: &'a CombatConfig,
        policy: &'a dyn DamagePolicy,
        catalog: &'a dyn SpellCatalog,
    ) -> Self {
        Self {
            config,
            policy,
            catalog,
        }
    }
}

impl fmt::Debug for CombatEnv<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombatEnv")
            .field("config", self.config)
            .finish_non_exhaustive()
    }
}
