//! Combat engine entry points.
//!
//! [`CombatEngine`] borrows the [`World`] together with a [`CombatEnv`] and
//! exposes every mutation the host needs: effect application, ticking, the
//! damage and heal paths, attacks, casts and threat bookkeeping. Everything it
//! changes is journaled as [`CombatEvent`]s on the world.

pub mod effects;
mod events;
mod hook;
mod tick;

pub use events::{CombatEvent, RemovalReason};
pub use hook::{NpcRetaliationHook, TickHook, default_hooks};
pub use tick::{TickReport, TickSummary, run_tick, tick_entity};

use std::sync::Arc;

use crate::combat::{
    self, AttackResult, CastError, CastReport, DamageError, DamageReport, DamageRequest,
    DamageSchool, HealError, HealReport,
};
use crate::effect::{
    AbsorbOutcome, ApplyOutcome, CleanseFilter, CombatModifiers, EffectInstance, EffectOrigin,
    EffectSpec,
};
use crate::env::{CombatEnv, CombatRng};
use crate::error::{EffectError, TickProcessingError};
use crate::state::{EntityId, RoomId, Timestamp, World};
use crate::threat;

/// Mutable view of the world bound to its collaborators.
///
/// Cheap to build; the runtime creates one per command or tick.
pub struct CombatEngine<'a> {
    world: &'a mut World,
    env: CombatEnv<'a>,
}

impl<'a> CombatEngine<'a> {
    pub fn new(world: &'a mut World, env: CombatEnv<'a>) -> Self {
        Self { world, env }
    }

    pub fn world(&self) -> &World {
        self.world
    }

    pub fn env(&self) -> &CombatEnv<'a> {
        &self.env
    }

    // Effects

    pub fn apply_effect(
        &mut self,
        target: EntityId,
        spec: &EffectSpec,
        origin: &EffectOrigin,
        now: Timestamp,
    ) -> Result<ApplyOutcome, EffectError> {
        effects::apply_effect(self.world, target, spec, origin, now)
    }

    pub fn remove_effects(
        &mut self,
        target: EntityId,
        predicate: impl FnMut(&EffectInstance) -> bool,
    ) -> Result<usize, EffectError> {
        effects::remove_effects(self.world, target, predicate)
    }

    pub fn cleanse(&mut self, target: EntityId, filter: &CleanseFilter) -> Result<usize, EffectError> {
        effects::cleanse(self.world, target, filter)
    }

    pub fn snapshot(&mut self, target: EntityId, now: Timestamp) -> Result<CombatModifiers, EffectError> {
        effects::snapshot(self.world, target, now)
    }

    /// Residual damage after `target`'s shields soak `incoming`.
    pub fn consume_absorb(
        &mut self,
        target: EntityId,
        incoming: u32,
        school: DamageSchool,
        now: Timestamp,
    ) -> Result<u32, EffectError> {
        effects::consume_absorb(self.world, target, incoming, school, now)
            .map(|outcome: AbsorbOutcome| outcome.residual)
    }

    // Ticking

    pub fn tick_entity(
        &mut self,
        entity: EntityId,
        now: Timestamp,
    ) -> Result<TickReport, TickProcessingError> {
        tick_entity(self.world, &self.env, entity, now)
    }

    pub fn tick(
        &mut self,
        hooks: &[Arc<dyn TickHook>],
        now: Timestamp,
        rng: &mut dyn CombatRng,
    ) -> TickSummary {
        run_tick(self.world, &self.env, hooks, now, rng)
    }

    // Combat

    pub fn apply_damage(&mut self, request: DamageRequest) -> Result<DamageReport, DamageError> {
        combat::apply_damage(self.world, self.env.policy, self.env.config, request)
    }

    pub fn apply_heal(
        &mut self,
        healer: EntityId,
        target: EntityId,
        amount: u32,
        now: Timestamp,
    ) -> Result<HealReport, HealError> {
        combat::apply_heal(self.world, self.env.config, healer, target, amount, now)
    }

    pub fn resolve_attack(
        &mut self,
        attacker: EntityId,
        defender: EntityId,
        now: Timestamp,
        rng: &mut dyn CombatRng,
    ) -> Result<AttackResult, DamageError> {
        combat::resolve_attack(
            self.world,
            self.env.policy,
            self.env.config,
            attacker,
            defender,
            now,
            rng,
        )
    }

    pub fn cast(
        &mut self,
        caster: EntityId,
        target: EntityId,
        spell_id: &str,
        now: Timestamp,
        rng: &mut dyn CombatRng,
    ) -> Result<CastReport, CastError> {
        combat::cast(self.world, &self.env, caster, target, spell_id, now, rng)
    }

    // Threat

    pub fn record_damage(&mut self, npc: EntityId, source: EntityId, amount: u32) -> Option<u64> {
        threat::record_damage(self.world, npc, source, amount)
    }

    pub fn record_healing(
        &mut self,
        room: &RoomId,
        healer: EntityId,
        healed: EntityId,
        amount: u32,
        now: Timestamp,
    ) -> Vec<(EntityId, u64)> {
        threat::record_healing(self.world, self.env.config, room, healer, healed, amount, now)
    }

    /// Threat `entity` holds on `npc`; 0 when none.
    pub fn threat_value(&self, npc: EntityId, entity: EntityId) -> u64 {
        self.world
            .get(npc)
            .and_then(|c| c.threat.as_ref())
            .map_or(0, |state| threat::threat_value(state, entity))
    }

    pub fn top_threat(&self, npc: EntityId) -> Option<(EntityId, u64)> {
        self.world
            .get(npc)
            .and_then(|c| c.threat.as_ref())
            .and_then(threat::top_threat)
    }

    pub fn drain_events(&mut self) -> Vec<CombatEvent> {
        self.world.drain_events()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::combat::StandardPolicy;
    use crate::config::CombatConfig;
    use crate::effect::{EffectKind, tags};
    use crate::env::{ScriptedRng, SpellDefinition};
    use crate::state::Combatant;

    #[test]
    fn journal_follows_attack() {
        let hall = RoomId::new("hall");
        let mut world = World::new();
        world.add_room(hall.clone(), true);
        let ana = world.spawn(Combatant::player("ana", hall.clone(), 100)).unwrap();
        let rat = world.spawn(Combatant::npc("rat", hall, 3)).unwrap();

        let config = CombatConfig::default();
        let catalog: BTreeMap<String, SpellDefinition> = BTreeMap::new();
        let env = CombatEnv::new(&config, &StandardPolicy, &catalog);
        let mut engine = CombatEngine::new(&mut world, env);

        // Lands; 3% of 100 max hp is 3, variance raw 0 -> 2 (x0.8 floored).
        let first = engine
            .resolve_attack(ana, rat, Timestamp(0), &mut ScriptedRng::new([49, 0]))
            .unwrap();
        assert_eq!(first.dealt(), 2);
        assert_eq!(engine.threat_value(rat, ana), 2);
        assert_eq!(engine.top_threat(rat), Some((ana, 2)));

        let events = engine.drain_events();
        assert!(matches!(events.first(), Some(CombatEvent::Damaged(_))));
        assert!(matches!(events.last(), Some(CombatEvent::Attacked(_))));
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn cleanse_and_absorb_through_facade() {
        let hall = RoomId::new("hall");
        let mut world = World::new();
        world.add_room(hall.clone(), true);
        let ana = world.spawn(Combatant::player("ana", hall, 100)).unwrap();

        let config = CombatConfig::default();
        let catalog: BTreeMap<String, SpellDefinition> = BTreeMap::new();
        let env = CombatEnv::new(&config, &StandardPolicy, &catalog);
        let mut engine = CombatEngine::new(&mut world, env);

        let shield = EffectSpec::new(
            "ward",
            10_000,
            EffectKind::Shield {
                capacity: 5,
                schools: combat::SchoolSet::empty(),
            },
        );
        let origin = EffectOrigin::new(ana);
        engine.apply_effect(ana, &shield, &origin, Timestamp(0)).unwrap();
        assert_eq!(
            engine
                .consume_absorb(ana, 8, DamageSchool::Physical, Timestamp(1))
                .unwrap(),
            3
        );

        let curse = EffectSpec::new("hex", 10_000, EffectKind::Debuff);
        engine.apply_effect(ana, &curse, &origin, Timestamp(0)).unwrap();
        let removed = engine
            .cleanse(ana, &CleanseFilter::new(tags(["debuff"]), 1))
            .unwrap();
        assert_eq!(removed, 1);
        assert!(engine.world().get(ana).unwrap().effects.is_empty());
    }
}
