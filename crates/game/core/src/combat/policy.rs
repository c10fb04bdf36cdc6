//! Damage-policy gate.
//!
//! Every hp mutation asks a [`DamagePolicy`] first. A denial means nothing
//! changes: no damage, no mana or cooldown spent, no threat, no combat timer.

use crate::error::{CombatError, ErrorSeverity};
use crate::state::{Combatant, Room, Timestamp};

use super::damage::DamageSource;

/// Everything the gate may inspect besides the two combatants.
#[derive(Clone, Copy, Debug)]
pub struct DamageContext<'a> {
    /// The defender's room, if it still exists.
    pub room: Option<&'a Room>,
    pub source: &'a DamageSource,
    pub now: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PolicyDecision {
    Allow,
    Deny { reason: String },
}

impl PolicyDecision {
    pub fn deny(reason: impl Into<String>) -> Self {
        Self::Deny {
            reason: reason.into(),
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Converts a denial into the typed error surfaced to callers.
    pub fn into_result(self) -> Result<(), PolicyDenied> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny { reason } => Err(PolicyDenied { reason }),
        }
    }
}

/// The gate refused the damage.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct PolicyDenied {
    pub reason: String,
}

impl CombatError for PolicyDenied {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Recoverable
    }

    fn error_code(&self) -> &'static str {
        "combat.denied"
    }
}

/// Decides whether `attacker` may damage `defender`.
///
/// `attacker` is `None` for world-sourced damage (traps, auras) or when the
/// applier of a periodic effect is gone.
pub trait DamagePolicy: Send + Sync {
    fn can_damage(
        &self,
        attacker: Option<&Combatant>,
        defender: &Combatant,
        ctx: &DamageContext<'_>,
    ) -> PolicyDecision;
}

/// Tag that makes a combatant immune to damage.
pub const PROTECTED_TAG: &str = "protected";

/// Room, liveness and protection checks.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardPolicy;

impl DamagePolicy for StandardPolicy {
    fn can_damage(
        &self,
        attacker: Option<&Combatant>,
        defender: &Combatant,
        ctx: &DamageContext<'_>,
    ) -> PolicyDecision {
        if !defender.alive {
            return PolicyDecision::deny("target is already dead");
        }
        if !ctx.room.is_some_and(|room| room.combat_enabled) {
            return PolicyDecision::deny("combat is disabled in this room");
        }
        if defender.has_tag(PROTECTED_TAG) {
            return PolicyDecision::deny("target is protected");
        }
        if let Some(attacker) = attacker
            && ctx.source.is_direct()
        {
            if !attacker.alive {
                return PolicyDecision::deny("attacker is dead");
            }
            if attacker.room != defender.room {
                return PolicyDecision::deny("target is not here");
            }
        }
        PolicyDecision::Allow
    }
}

/// Allows everything. Useful for tests and arena modes.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAll;

impl DamagePolicy for AllowAll {
    fn can_damage(
        &self,
        _attacker: Option<&Combatant>,
        _defender: &Combatant,
        _ctx: &DamageContext<'_>,
    ) -> PolicyDecision {
        PolicyDecision::Allow
    }
}
