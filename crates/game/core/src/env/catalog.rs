//! Spell definitions and the read-only catalog interface.

use std::collections::BTreeMap;

use crate::combat::DamageSchool;
use crate::effect::EffectSpec;

/// A castable spell or ability.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpellDefinition {
    pub id: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default = "default_school"))]
    pub school: DamageSchool,
    /// Harmful spells are gated by the damage policy before anything is spent.
    #[cfg_attr(feature = "serde", serde(default))]
    pub harmful: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub mana_cost: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub cooldown_ms: u64,
    /// Direct damage dealt on cast, before variance.
    #[cfg_attr(feature = "serde", serde(default))]
    pub damage: u32,
    /// Direct healing done on cast.
    #[cfg_attr(feature = "serde", serde(default))]
    pub heal: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub status_effect: Option<EffectSpec>,
}

#[cfg(feature = "serde")]
fn default_school() -> DamageSchool {
    DamageSchool::Physical
}

impl SpellDefinition {
    pub fn new(id: impl Into<String>, school: DamageSchool) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            school,
            harmful: false,
            mana_cost: 0,
            cooldown_ms: 0,
            damage: 0,
            heal: 0,
            status_effect: None,
        }
    }

    #[must_use]
    pub fn harmful(mut self) -> Self {
        self.harmful = true;
        self
    }

    /// Damaging or flagged harmful; such casts go through the policy gate.
    pub fn is_offensive(&self) -> bool {
        self.harmful || self.damage > 0
    }

    #[must_use]
    pub fn with_cost(mut self, mana_cost: u32, cooldown_ms: u64) -> Self {
        self.mana_cost = mana_cost;
        self.cooldown_ms = cooldown_ms;
        self
    }

    #[must_use]
    pub fn with_damage(mut self, damage: u32) -> Self {
        self.damage = damage;
        self
    }

    #[must_use]
    pub fn with_heal(mut self, heal: u32) -> Self {
        self.heal = heal;
        self
    }

    #[must_use]
    pub fn with_effect(mut self, effect: EffectSpec) -> Self {
        self.status_effect = Some(effect);
        self
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// Read-only spell lookup.
///
/// Aliases are resolved by the provider when it is built; lookups never
/// mutate the catalog.
pub trait SpellCatalog: Send + Sync {
    fn spell(&self, id: &str) -> Option<&SpellDefinition>;

    fn contains(&self, id: &str) -> bool {
        self.spell(id).is_some()
    }
}

impl SpellCatalog for BTreeMap<String, SpellDefinition> {
    fn spell(&self, id: &str) -> Option<&SpellDefinition> {
        self.get(id)
    }
}
