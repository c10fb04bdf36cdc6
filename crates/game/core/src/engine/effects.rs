//! Status-effect operations addressed by entity id.
//!
//! Thin wrappers over [`EffectContainer`](crate::effect::EffectContainer)
//! that resolve the combatant, log rejections and journal what changed.

use crate::combat::DamageSchool;
use crate::effect::{
    AbsorbOutcome, ApplyOutcome, CleanseFilter, CombatModifiers, EffectInstance, EffectOrigin,
    EffectSpec,
};
use crate::error::EffectError;
use crate::state::{EntityId, Timestamp, World};

use super::events::{CombatEvent, RemovalReason};

/// Applies `spec` to `target`.
///
/// A malformed spec is logged at `warn` and rejected without mutation.
pub fn apply_effect(
    world: &mut World,
    target: EntityId,
    spec: &EffectSpec,
    origin: &EffectOrigin,
    now: Timestamp,
) -> Result<ApplyOutcome, EffectError> {
    let combatant = world
        .get_mut(target)
        .ok_or(EffectError::UnknownEntity(target))?;
    if !combatant.alive {
        return Err(EffectError::TargetDead(target));
    }

    let outcome = match combatant.effects.apply(spec, origin, now) {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::warn!(
                target: "mud::effect",
                entity = %target,
                effect = %spec.id,
                error = %err,
                "rejected effect"
            );
            return Err(err);
        }
    };

    tracing::debug!(
        target: "mud::effect",
        entity = %target,
        effect = %spec.id,
        applier = %origin.applier,
        ?outcome,
        "effect applied"
    );

    if let ApplyOutcome::Cleansed { removed } = &outcome {
        for effect_id in removed {
            world.record_event(CombatEvent::EffectRemoved {
                target,
                effect_id: effect_id.clone(),
                reason: RemovalReason::Cleansed,
            });
        }
    }
    world.record_event(CombatEvent::EffectApplied {
        target,
        applier: origin.applier,
        effect_id: spec.id.clone(),
        outcome: outcome.clone(),
    });
    Ok(outcome)
}

fn journal_removed(
    world: &mut World,
    target: EntityId,
    removed: &[EffectInstance],
    reason: RemovalReason,
) {
    for instance in removed {
        world.record_event(CombatEvent::EffectRemoved {
            target,
            effect_id: instance.effect_id.clone(),
            reason,
        });
    }
}

/// Removes every instance on `target` matching `predicate`. Returns the count.
pub fn remove_effects(
    world: &mut World,
    target: EntityId,
    predicate: impl FnMut(&EffectInstance) -> bool,
) -> Result<usize, EffectError> {
    let combatant = world
        .get_mut(target)
        .ok_or(EffectError::UnknownEntity(target))?;
    let removed = combatant.effects.remove_where(predicate);
    journal_removed(world, target, &removed, RemovalReason::Removed);
    Ok(removed.len())
}

/// Cleanses `target`. Returns the number of instances removed.
pub fn cleanse(
    world: &mut World,
    target: EntityId,
    filter: &CleanseFilter,
) -> Result<usize, EffectError> {
    let combatant = world
        .get_mut(target)
        .ok_or(EffectError::UnknownEntity(target))?;
    let removed = combatant.effects.cleanse(filter);
    journal_removed(world, target, &removed, RemovalReason::Cleansed);
    Ok(removed.len())
}

/// Aggregated modifiers of `target`'s active effects at `now`.
pub fn snapshot(
    world: &mut World,
    target: EntityId,
    now: Timestamp,
) -> Result<CombatModifiers, EffectError> {
    world
        .get_mut(target)
        .map(|combatant| combatant.effects.snapshot(now))
        .ok_or(EffectError::UnknownEntity(target))
}

/// Runs `incoming` damage of `school` through `target`'s shields without
/// touching hp.
pub fn consume_absorb(
    world: &mut World,
    target: EntityId,
    incoming: u32,
    school: DamageSchool,
    now: Timestamp,
) -> Result<AbsorbOutcome, EffectError> {
    let combatant = world
        .get_mut(target)
        .ok_or(EffectError::UnknownEntity(target))?;
    let outcome = combatant.effects.consume_absorb(incoming, school, now);
    journal_removed(world, target, &outcome.depleted, RemovalReason::Depleted);
    Ok(outcome)
}
