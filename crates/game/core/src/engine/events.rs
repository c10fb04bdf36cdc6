//! Events recorded by the engine while it mutates the world.
//!
//! The world keeps them in a journal; the runtime drains it after each
//! command or tick and publishes the events.

use crate::combat::{AttackResult, DamageReport, HealReport};
use crate::effect::ApplyOutcome;
use crate::state::EntityId;

/// Why an effect instance left its container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum RemovalReason {
    Expired,
    Depleted,
    Cleansed,
    Removed,
}

#[derive(Clone, Debug, PartialEq)]
pub enum CombatEvent {
    EffectApplied {
        target: EntityId,
        applier: EntityId,
        effect_id: String,
        outcome: ApplyOutcome,
    },
    EffectRemoved {
        target: EntityId,
        effect_id: String,
        reason: RemovalReason,
    },
    Damaged(DamageReport),
    Healed(HealReport),
    Attacked(AttackResult),
    SpellCast {
        caster: EntityId,
        target: EntityId,
        spell_id: String,
    },
    Died {
        entity: EntityId,
        killer: EntityId,
    },
}

impl CombatEvent {
    /// The combatant the event happened to.
    pub fn subject(&self) -> EntityId {
        match self {
            Self::EffectApplied { target, .. }
            | Self::EffectRemoved { target, .. }
            | Self::SpellCast { target, .. } => *target,
            Self::Damaged(report) => report.defender,
            Self::Healed(report) => report.target,
            Self::Attacked(result) => result.defender,
            Self::Died { entity, .. } => *entity,
        }
    }
}
