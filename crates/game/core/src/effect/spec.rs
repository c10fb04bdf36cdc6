//! Effect definitions as supplied by spell and ability content.
//!
//! An [`EffectSpec`] is immutable template data. Applying it to a combatant
//! produces an [`EffectInstance`](super::EffectInstance) owned by that
//! combatant's container.

use std::collections::BTreeSet;

use crate::combat::{DamageSchool, SchoolSet};
use crate::config::CombatConfig;
use crate::error::EffectError;

/// Set of free-form tags used for cleanse selection and protection.
pub type TagSet = BTreeSet<String>;

/// Builds a [`TagSet`] from string slices.
pub fn tags<'a>(values: impl IntoIterator<Item = &'a str>) -> TagSet {
    values.into_iter().map(str::to_owned).collect()
}

/// Percentage modifiers contributed by an effect, expressed as fractions
/// (`0.1` = +10%).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EffectModifiers {
    /// Added to the holder's incoming damage multiplier.
    pub damage_taken_pct: f64,
    /// Added to the holder's outgoing damage multiplier.
    pub damage_dealt_pct: f64,
}

impl EffectModifiers {
    pub const NONE: Self = Self {
        damage_taken_pct: 0.0,
        damage_dealt_pct: 0.0,
    };

    pub fn scaled(self, factor: u32) -> Self {
        let factor = f64::from(factor);
        Self {
            damage_taken_pct: self.damage_taken_pct * factor,
            damage_dealt_pct: self.damage_dealt_pct * factor,
        }
    }
}

/// Rule for what happens when an effect is reapplied into an occupied
/// stacking group.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum StackingPolicy {
    /// Renew duration and modifiers of the existing instance in place.
    #[default]
    Refresh,
    /// Replace the whole payload of the group (spell ranks).
    Overwrite,
    /// Add a stack up to `max_stacks` and renew duration.
    Stack { max_stacks: u32 },
    /// One independent slot per applier.
    VersionedByApplier,
}

/// Category-specific payload of an effect.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EffectKind {
    /// Absorbs incoming damage up to `capacity`.
    Shield {
        capacity: u32,
        /// Empty means the shield absorbs every school.
        #[cfg_attr(feature = "serde", serde(default))]
        schools: SchoolSet,
    },
    /// Damage over time.
    Dot {
        per_tick: u32,
        interval_ms: u64,
        school: DamageSchool,
    },
    /// Heal over time.
    Hot { per_tick: u32, interval_ms: u64 },
    /// Modifier-only beneficial effect.
    Buff,
    /// Modifier-only harmful effect.
    Debuff,
    /// Instantaneous removal of tagged effects on the target.
    Cleanse {
        tags: TagSet,
        max_to_remove: usize,
        #[cfg_attr(feature = "serde", serde(default))]
        protected_tags: TagSet,
    },
}

impl EffectKind {
    /// Category tag implicitly carried by every instance of this kind.
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Shield { .. } => "shield",
            Self::Dot { .. } => "dot",
            Self::Hot { .. } => "hot",
            Self::Buff => "buff",
            Self::Debuff => "debuff",
            Self::Cleanse { .. } => "cleanse",
        }
    }

    /// Whether the effect is instantaneous and never creates an instance.
    pub const fn is_instant(&self) -> bool {
        matches!(self, Self::Cleanse { .. })
    }
}

/// The `status_effect` payload of a spell or ability definition.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectSpec {
    pub id: String,
    /// Display name; falls back to `id` when empty.
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
    /// Total duration in milliseconds. Ignored for instantaneous kinds.
    #[cfg_attr(feature = "serde", serde(default))]
    pub duration_ms: u64,
    pub kind: EffectKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub modifiers: EffectModifiers,
    #[cfg_attr(feature = "serde", serde(default))]
    pub tags: TagSet,
    #[cfg_attr(feature = "serde", serde(default))]
    pub stacking: StackingPolicy,
    /// Bucket key; defaults to `id`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub stacking_group: Option<String>,
    /// Absorption ordering; higher is consumed first.
    #[cfg_attr(feature = "serde", serde(default))]
    pub priority: i32,
}

impl EffectSpec {
    /// Creates a refresh-policy spec with no modifiers or tags.
    pub fn new(id: impl Into<String>, duration_ms: u64, kind: EffectKind) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            duration_ms,
            kind,
            modifiers: EffectModifiers::NONE,
            tags: TagSet::new(),
            stacking: StackingPolicy::Refresh,
            stacking_group: None,
            priority: 0,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_modifiers(mut self, modifiers: EffectModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_tags<'a>(mut self, values: impl IntoIterator<Item = &'a str>) -> Self {
        self.tags.extend(values.into_iter().map(str::to_owned));
        self
    }

    pub fn with_stacking(mut self, policy: StackingPolicy) -> Self {
        self.stacking = policy;
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.stacking_group = Some(group.into());
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// The stacking bucket this spec competes in.
    pub fn group_key(&self) -> &str {
        self.stacking_group.as_deref().unwrap_or(&self.id)
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    /// Rejects specs that cannot produce a well-formed instance.
    pub fn validate(&self) -> Result<(), EffectError> {
        if self.id.trim().is_empty() {
            return Err(EffectError::MissingId);
        }

        if !self.kind.is_instant() && self.duration_ms == 0 {
            return Err(EffectError::NonPositiveDuration {
                effect_id: self.id.clone(),
            });
        }

        match &self.kind {
            EffectKind::Dot { interval_ms, .. } | EffectKind::Hot { interval_ms, .. }
                if *interval_ms == 0 =>
            {
                Err(EffectError::ZeroInterval {
                    effect_id: self.id.clone(),
                })
            }
            EffectKind::Cleanse { tags, .. } if tags.is_empty() => Err(EffectError::EmptyCleanse {
                effect_id: self.id.clone(),
            }),
            _ => match self.stacking {
                StackingPolicy::Stack { max_stacks }
                    if max_stacks == 0 || max_stacks > CombatConfig::MAX_STACKS_CAP =>
                {
                    Err(EffectError::InvalidMaxStacks {
                        effect_id: self.id.clone(),
                        max_stacks,
                    })
                }
                _ => Ok(()),
            },
        }
    }
}
