//! Per-entity hooks that run after periodic effects each tick.
//!
//! Hooks carry NPC behavior that reacts to threat (retaliation, and whatever
//! else the host wires in). They run in priority order, lower first, and only
//! for combatants still alive after their periodic ticks.

use std::sync::Arc;

use crate::combat::resolve_attack;
use crate::env::{CombatEnv, CombatRng};
use crate::error::TickProcessingError;
use crate::state::{Combatant, EntityId, Timestamp, World};

pub trait TickHook: Send + Sync {
    /// Stable name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Lower values run first. Default 0.
    fn priority(&self) -> i32 {
        0
    }

    /// Cheap pre-check on the combatant about to be processed.
    fn should_run(&self, combatant: &Combatant, now: Timestamp) -> bool;

    fn on_tick(
        &self,
        world: &mut World,
        env: &CombatEnv<'_>,
        entity: EntityId,
        now: Timestamp,
        rng: &mut dyn CombatRng,
    ) -> Result<(), TickProcessingError>;
}

/// Makes an engaged NPC swing at its highest-threat target in the same room,
/// once per swing interval.
#[derive(Clone, Copy, Debug, Default)]
pub struct NpcRetaliationHook;

impl NpcRetaliationHook {
    /// Highest-threat living combatant sharing the NPC's room.
    pub fn pick_target(world: &World, npc: &Combatant) -> Option<EntityId> {
        npc.threat
            .as_ref()?
            .ranked()
            .into_iter()
            .map(|(id, _)| id)
            .find(|id| {
                world
                    .get(*id)
                    .is_some_and(|target| target.alive && target.room == npc.room)
            })
    }
}

impl TickHook for NpcRetaliationHook {
    fn name(&self) -> &'static str {
        "npc_retaliation"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn should_run(&self, combatant: &Combatant, now: Timestamp) -> bool {
        combatant.is_npc() && combatant.is_engaged() && combatant.next_swing_at <= now
    }

    fn on_tick(
        &self,
        world: &mut World,
        env: &CombatEnv<'_>,
        entity: EntityId,
        now: Timestamp,
        rng: &mut dyn CombatRng,
    ) -> Result<(), TickProcessingError> {
        let npc = world
            .get(entity)
            .ok_or_else(|| TickProcessingError::unknown_entity(entity, now))?;
        let Some(target) = Self::pick_target(world, npc) else {
            return Ok(());
        };

        let result = resolve_attack(world, env.policy, env.config, entity, target, now, rng)
            .map_err(|err| TickProcessingError::hook(entity, self.name(), err.to_string(), now))?;

        tracing::debug!(
            target: "mud::npc",
            npc = %entity,
            target = %target,
            outcome = %result,
            "retaliation swing"
        );

        if let Some(npc) = world.get_mut(entity) {
            npc.next_swing_at = now + env.config.npc_swing_interval_ms;
        }
        Ok(())
    }
}

/// Hooks wired into every tick unless the host replaces them.
pub fn default_hooks() -> Arc<[Arc<dyn TickHook>]> {
    let mut hooks: Vec<Arc<dyn TickHook>> = vec![Arc::new(NpcRetaliationHook)];
    hooks.sort_by_key(|hook| hook.priority());
    hooks.into()
}
