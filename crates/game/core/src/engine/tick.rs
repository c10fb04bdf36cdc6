//! One tick step.
//!
//! [`tick_entity`] advances a single combatant's periodic effects;
//! [`run_tick`] does that for every live combatant and then runs the wired
//! [`TickHook`]s. A failure (error or panic) while processing one combatant
//! is captured in the summary and never stops the others.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::combat::{
    DamageError, DamageRequest, DamageSource, HealError, apply_damage, apply_heal,
};
use crate::effect::PeriodicPayload;
use crate::env::{CombatEnv, CombatRng};
use crate::error::TickProcessingError;
use crate::state::{EntityId, Timestamp, World};

use super::events::{CombatEvent, RemovalReason};
use super::hook::TickHook;

/// What one combatant's periodic evaluation did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// At least one periodic tick was applied.
    pub fired: bool,
    /// Hp removed by damage-over-time.
    pub damage: u32,
    /// Hp restored by heal-over-time.
    pub healing: u32,
    /// Effect ids that expired during this evaluation.
    pub expired: Vec<String>,
    pub died: bool,
}

/// Outcome of a whole tick across the world.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub now: Timestamp,
    /// Combatants evaluated.
    pub processed: usize,
    /// Combatants on which at least one periodic tick fired.
    pub fired: usize,
    pub deaths: Vec<EntityId>,
    pub failures: Vec<TickProcessingError>,
}

/// Fires every due damage/heal-over-time tick on `entity` and evicts expired
/// effects. Deterministic: no randomness is involved.
///
/// Damage ticks go through the damage choke point; heal ticks through the
/// heal path (and so generate healing threat for the applier).
pub fn tick_entity(
    world: &mut World,
    env: &CombatEnv<'_>,
    entity: EntityId,
    now: Timestamp,
) -> Result<TickReport, TickProcessingError> {
    let combatant = world
        .get_mut(entity)
        .ok_or_else(|| TickProcessingError::unknown_entity(entity, now))?;
    if !combatant.alive {
        return Ok(TickReport::default());
    }

    let due = combatant.effects.collect_due(now);
    let mut report = TickReport {
        expired: due.expired.iter().map(|i| i.effect_id.clone()).collect(),
        ..TickReport::default()
    };

    for instance in &due.expired {
        world.record_event(CombatEvent::EffectRemoved {
            target: entity,
            effect_id: instance.effect_id.clone(),
            reason: RemovalReason::Expired,
        });
    }

    for tick in due.ticks {
        if report.died {
            break;
        }

        match tick.payload {
            PeriodicPayload::Damage { school } => {
                let request = DamageRequest {
                    attacker: tick.origin.applier,
                    defender: entity,
                    amount: tick.amount,
                    school,
                    source: DamageSource::Periodic {
                        effect_id: tick.effect_id.clone(),
                    },
                    now,
                };
                match apply_damage(world, env.policy, env.config, request) {
                    Ok(damage) => {
                        report.fired = true;
                        report.damage = report.damage.saturating_add(damage.dealt);
                        report.died |= damage.killed;
                    }
                    Err(DamageError::Denied(denied)) => {
                        tracing::trace!(
                            target: "mud::tick",
                            entity = %entity,
                            effect = %tick.effect_id,
                            reason = %denied.reason,
                            "periodic damage denied"
                        );
                    }
                    Err(DamageError::UnknownEntity(_)) => {
                        return Err(TickProcessingError::unknown_entity(entity, now));
                    }
                }
            }
            PeriodicPayload::Heal => {
                let healer = tick.origin.applier;
                match apply_heal(world, env.config, healer, entity, tick.amount, now) {
                    Ok(heal) => {
                        report.fired = true;
                        report.healing = report.healing.saturating_add(heal.healed);
                    }
                    Err(HealError::TargetDead(_)) => break,
                    Err(HealError::UnknownEntity(_)) => {
                        return Err(TickProcessingError::unknown_entity(entity, now));
                    }
                }
            }
        }
    }

    Ok(report)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_owned()
    }
}

fn process_entity(
    world: &mut World,
    env: &CombatEnv<'_>,
    hooks: &[Arc<dyn TickHook>],
    entity: EntityId,
    now: Timestamp,
    rng: &mut dyn CombatRng,
) -> Result<TickReport, TickProcessingError> {
    let report = tick_entity(world, env, entity, now)?;

    for hook in hooks {
        let Some(combatant) = world.get(entity) else {
            break;
        };
        if !combatant.alive {
            break;
        }
        if hook.should_run(combatant, now) {
            hook.on_tick(world, env, entity, now, rng)?;
        }
    }

    Ok(report)
}

/// Evaluates one tick for every live combatant, room by room.
pub fn run_tick(
    world: &mut World,
    env: &CombatEnv<'_>,
    hooks: &[Arc<dyn TickHook>],
    now: Timestamp,
    rng: &mut dyn CombatRng,
) -> TickSummary {
    let mut summary = TickSummary {
        now,
        ..TickSummary::default()
    };

    for entity in world.live_entities() {
        // An earlier entity's tick may have killed or removed this one.
        if !world.get(entity).is_some_and(|c| c.alive) {
            continue;
        }

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            process_entity(&mut *world, env, hooks, entity, now, &mut *rng)
        }));

        summary.processed += 1;
        match result {
            Ok(Ok(report)) => {
                if report.fired {
                    summary.fired += 1;
                }
                if report.died {
                    summary.deaths.push(entity);
                }
            }
            Ok(Err(err)) => {
                tracing::error!(
                    target: "mud::tick",
                    entity = %entity,
                    error = %err,
                    "entity tick failed"
                );
                summary.failures.push(err);
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(
                    target: "mud::tick",
                    entity = %entity,
                    %message,
                    "entity tick panicked"
                );
                summary
                    .failures
                    .push(TickProcessingError::panicked(entity, message, now));
            }
        }
    }

    summary
}
