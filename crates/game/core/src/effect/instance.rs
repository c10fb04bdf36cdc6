//! Live effect instances owned by a combatant.

use std::fmt;

use super::spec::{EffectKind, EffectModifiers, EffectSpec, StackingPolicy, TagSet};
use crate::combat::{DamageSchool, SchoolSet};
use crate::state::{EntityId, Timestamp};

/// Identifier of an instance, unique within its owning container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fx{}", self.0)
    }
}

/// Who applied an effect and through which spell or ability.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectOrigin {
    pub applier: EntityId,
    /// Spell or ability id, when the effect came from catalog content.
    pub source: Option<String>,
}

impl EffectOrigin {
    pub fn new(applier: EntityId) -> Self {
        Self {
            applier,
            source: None,
        }
    }

    pub fn from_spell(applier: EntityId, spell_id: impl Into<String>) -> Self {
        Self {
            applier,
            source: Some(spell_id.into()),
        }
    }

    /// World-originated effect with no attributable applier.
    pub fn world() -> Self {
        Self::new(EntityId::WORLD)
    }
}

/// Mutable, kind-specific state of a live instance.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InstanceState {
    Shield {
        /// Capacity left before the shield is depleted.
        remaining: u32,
        schools: SchoolSet,
    },
    Dot {
        per_tick: u32,
        interval_ms: u64,
        school: DamageSchool,
        next_tick_at: Timestamp,
    },
    Hot {
        per_tick: u32,
        interval_ms: u64,
        next_tick_at: Timestamp,
    },
    Buff,
    Debuff,
}

impl InstanceState {
    /// Builds fresh state for a spec applied at `now`.
    ///
    /// Returns `None` for instantaneous kinds.
    pub(crate) fn from_kind(kind: &EffectKind, now: Timestamp) -> Option<Self> {
        let state = match kind {
            EffectKind::Shield { capacity, schools } => Self::Shield {
                remaining: *capacity,
                schools: *schools,
            },
            EffectKind::Dot {
                per_tick,
                interval_ms,
                school,
            } => Self::Dot {
                per_tick: *per_tick,
                interval_ms: *interval_ms,
                school: *school,
                next_tick_at: now + *interval_ms,
            },
            EffectKind::Hot {
                per_tick,
                interval_ms,
            } => Self::Hot {
                per_tick: *per_tick,
                interval_ms: *interval_ms,
                next_tick_at: now + *interval_ms,
            },
            EffectKind::Buff => Self::Buff,
            EffectKind::Debuff => Self::Debuff,
            EffectKind::Cleanse { .. } => return None,
        };
        Some(state)
    }

    pub fn is_periodic(&self) -> bool {
        matches!(self, Self::Dot { .. } | Self::Hot { .. })
    }
}

/// An applied effect living in a combatant's container.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectInstance {
    pub instance_id: InstanceId,
    pub effect_id: String,
    pub name: String,
    pub origin: EffectOrigin,
    /// Stacking bucket key.
    pub group: String,
    pub applied_at: Timestamp,
    pub expires_at: Timestamp,
    pub state: InstanceState,
    /// Per-stack modifiers.
    pub modifiers: EffectModifiers,
    /// Spec tags plus the implicit category tag.
    pub tags: TagSet,
    pub policy: StackingPolicy,
    pub priority: i32,
    pub stacks: u32,
}

impl EffectInstance {
    /// Instantiates a spec. Returns `None` for instantaneous kinds.
    pub(crate) fn create(
        instance_id: InstanceId,
        spec: &EffectSpec,
        origin: &EffectOrigin,
        now: Timestamp,
    ) -> Option<Self> {
        let state = InstanceState::from_kind(&spec.kind, now)?;
        let mut tags = spec.tags.clone();
        tags.insert(spec.kind.category().to_owned());

        Some(Self {
            instance_id,
            effect_id: spec.id.clone(),
            name: spec.display_name().to_owned(),
            origin: origin.clone(),
            group: spec.group_key().to_owned(),
            applied_at: now,
            expires_at: now + spec.duration_ms,
            state,
            modifiers: spec.modifiers,
            tags,
            policy: spec.stacking,
            priority: spec.priority,
            stacks: 1,
        })
    }

    pub fn applier(&self) -> EntityId {
        self.origin.applier
    }

    /// Active while remaining duration is positive.
    pub fn is_active(&self, now: Timestamp) -> bool {
        self.expires_at > now
    }

    pub fn remaining_ms(&self, now: Timestamp) -> u64 {
        self.expires_at.since(now)
    }

    pub fn is_shield(&self) -> bool {
        matches!(self.state, InstanceState::Shield { .. })
    }

    /// Remaining absorb capacity; zero for non-shields.
    pub fn absorb_remaining(&self) -> u32 {
        match self.state {
            InstanceState::Shield { remaining, .. } => remaining,
            _ => 0,
        }
    }

    /// Modifiers scaled by the current stack count.
    pub fn effective_modifiers(&self) -> EffectModifiers {
        self.modifiers.scaled(self.stacks)
    }

    pub fn has_any_tag(&self, tags: &TagSet) -> bool {
        !self.tags.is_disjoint(tags)
    }

    /// Renews duration, modifiers and payload amounts in place, keeping the
    /// instance id, age and periodic schedule.
    pub(crate) fn refresh_from(&mut self, spec: &EffectSpec, now: Timestamp) {
        self.expires_at = now + spec.duration_ms;
        self.modifiers = spec.modifiers;
        self.priority = spec.priority;
        self.name = spec.display_name().to_owned();

        match (&mut self.state, &spec.kind) {
            (
                InstanceState::Shield { remaining, schools },
                EffectKind::Shield {
                    capacity,
                    schools: new_schools,
                },
            ) => {
                *remaining = *capacity;
                *schools = *new_schools;
            }
            (
                InstanceState::Dot {
                    per_tick,
                    interval_ms,
                    school,
                    ..
                },
                EffectKind::Dot {
                    per_tick: new_per_tick,
                    interval_ms: new_interval,
                    school: new_school,
                },
            ) => {
                *per_tick = *new_per_tick;
                *interval_ms = *new_interval;
                *school = *new_school;
            }
            (
                InstanceState::Hot {
                    per_tick,
                    interval_ms,
                    ..
                },
                EffectKind::Hot {
                    per_tick: new_per_tick,
                    interval_ms: new_interval,
                },
            ) => {
                *per_tick = *new_per_tick;
                *interval_ms = *new_interval;
            }
            _ => {
                // Same id but a different kind; rebuild the payload.
                if let Some(state) = InstanceState::from_kind(&spec.kind, now) {
                    self.state = state;
                }
            }
        }
    }

    /// Adds one stack (bounded) and renews duration.
    pub(crate) fn add_stack(&mut self, spec: &EffectSpec, max_stacks: u32, now: Timestamp) {
        let before = self.stacks;
        self.stacks = (self.stacks + 1).min(max_stacks);
        self.expires_at = now + spec.duration_ms;
        self.modifiers = spec.modifiers;

        if self.stacks > before
            && let (InstanceState::Shield { remaining, .. }, EffectKind::Shield { capacity, .. }) =
                (&mut self.state, &spec.kind)
        {
            *remaining = remaining.saturating_add(*capacity);
        }
    }
}
