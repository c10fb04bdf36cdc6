//! The heal path.

use crate::config::CombatConfig;
use crate::engine::CombatEvent;
use crate::error::{CombatError, ErrorSeverity};
use crate::state::{EntityId, Timestamp, World};
use crate::threat;

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HealReport {
    pub healer: EntityId,
    pub target: EntityId,
    pub requested: u32,
    /// Hp actually restored.
    pub healed: u32,
    pub overheal: u32,
    /// `(npc, threat_added)` for every NPC that noticed the heal.
    pub threat: Vec<(EntityId, u64)>,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum HealError {
    #[error("no combatant {0}")]
    UnknownEntity(EntityId),

    #[error("cannot heal {0}: target is dead")]
    TargetDead(EntityId),
}

impl CombatError for HealError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownEntity(_) => ErrorSeverity::Validation,
            Self::TargetDead(_) => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownEntity(_) => "heal.unknown_entity",
            Self::TargetDead(_) => "heal.target_dead",
        }
    }
}

/// Restores up to `amount` hp on `target`, clamped at max hp.
///
/// Effective healing (overheal excluded) generates threat for `healer` on
/// every NPC in the target's room already engaged with either party.
pub fn apply_heal(
    world: &mut World,
    config: &CombatConfig,
    healer: EntityId,
    target: EntityId,
    amount: u32,
    now: Timestamp,
) -> Result<HealReport, HealError> {
    let patient = world
        .get_mut(target)
        .ok_or(HealError::UnknownEntity(target))?;
    if !patient.alive {
        return Err(HealError::TargetDead(target));
    }

    let healed = patient.hp.credit(amount);
    let room = patient.room.clone();

    let threat = if healed > 0 {
        threat::record_healing(world, config, &room, healer, target, healed, now)
    } else {
        Vec::new()
    };

    let report = HealReport {
        healer,
        target,
        requested: amount,
        healed,
        overheal: amount - healed,
        threat,
    };

    tracing::debug!(
        target: "mud::combat",
        healer = %healer,
        target = %target,
        requested = amount,
        healed,
        "heal applied"
    );
    world.record_event(CombatEvent::Healed(report.clone()));
    Ok(report)
}
