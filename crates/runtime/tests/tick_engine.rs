use std::sync::Arc;
use std::time::Duration;

use mud_content::ContentFactory;
use mud_core::{
    CombatConfig, CombatEnv, CombatEvent, CombatRng, Combatant, EffectOrigin, EntityId, RoomId,
    TickHook, TickProcessingError, Timestamp, World,
};
use mud_runtime::{
    EngineConfig, Event, OracleBundle, RuntimeError, SpellOracle, TickEngine, TickEvent, Topic,
};

struct Scene {
    world: World,
    priest: EntityId,
    ana: EntityId,
    wolf: EntityId,
}

fn scene() -> Scene {
    let hall = RoomId::new("hall");
    let mut world = World::new();
    world.add_room(hall.clone(), true);

    let priest = world
        .spawn(Combatant::player("priest", hall.clone(), 80).with_mana(200))
        .expect("spawn priest");
    let mut wounded = Combatant::player("ana", hall.clone(), 100);
    wounded.hp.current = 50;
    let ana = world.spawn(wounded).expect("spawn ana");
    let wolf = world
        .spawn(Combatant::npc("wolf", hall, 40))
        .expect("spawn wolf");

    Scene {
        world,
        priest,
        ana,
        wolf,
    }
}

fn oracles() -> OracleBundle {
    let spells = ContentFactory::bundled()
        .load_spells()
        .expect("bundled spells load");
    OracleBundle::new(Arc::new(SpellOracle::new(spells)))
}

fn engine(world: World) -> TickEngine {
    TickEngine::new(EngineConfig::default(), oracles(), world)
}

#[tokio::test(start_paused = true)]
async fn heal_over_time_fires_on_tick_cadence() {
    let s = scene();
    let mut engine = engine(s.world);
    let handle = engine.start().unwrap();

    handle.cast(s.priest, s.ana, "renew").await.unwrap();
    // Ticks due at 2000 and 4000 ms.
    tokio::time::sleep(Duration::from_millis(4_010)).await;

    let world = engine.stop().await.unwrap();
    let ana = world.get(s.ana).unwrap();
    assert_eq!(ana.hp.current, 64);
    assert_eq!(ana.effects.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn combat_tuning_comes_from_engine_config() {
    let s = scene();
    let tuning = CombatConfig::default().with_heal_threat_multiplier(5.0);
    let mut engine = TickEngine::new(
        EngineConfig::default().with_combat(tuning.clone()),
        oracles(),
        s.world,
    );
    assert_eq!(engine.oracles().config(), &tuning);
    let handle = engine.start().unwrap();

    handle.record_damage(s.wolf, s.ana, 1).await.unwrap();
    let heal = handle.apply_heal(s.priest, s.ana, 10).await.unwrap();
    assert_eq!(heal.healed, 10);
    assert_eq!(handle.threat_value(s.wolf, s.priest).await.unwrap(), 50);

    engine.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn start_stop_state_machine() {
    let s = scene();
    let mut engine = engine(s.world);

    assert!(matches!(engine.stop().await, Err(RuntimeError::NotRunning)));

    let handle = engine.start().unwrap();
    assert!(engine.is_running());
    assert!(engine.world().is_none());
    assert!(matches!(engine.start(), Err(RuntimeError::AlreadyRunning)));

    tokio::time::sleep(Duration::from_millis(500)).await;
    let before = handle.now().await.unwrap();
    let world = engine.stop().await.unwrap();
    assert_eq!(world.len(), 3);

    // The old handle is dead once the worker exits.
    assert!(matches!(
        handle.now().await,
        Err(RuntimeError::CommandChannelClosed)
    ));

    // Engine time resumes where it stopped.
    let handle = engine.start().unwrap();
    assert!(handle.now().await.unwrap() >= before);
    engine.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn cast_events_reach_subscribers_in_order() {
    let s = scene();
    let mut engine = engine(s.world);
    let mut combat = engine.subscribe(Topic::Combat);
    let mut effects = engine.subscribe(Topic::Effect);
    let handle = engine.start().unwrap();

    handle.cast(s.priest, s.wolf, "fb").await.unwrap();
    handle.cast(s.priest, s.wolf, "corruption").await.unwrap();

    let first = combat.recv().await.unwrap();
    assert!(matches!(
        first.as_combat(),
        Some(CombatEvent::SpellCast { spell_id, .. }) if spell_id == "firebolt"
    ));
    let second = combat.recv().await.unwrap();
    assert!(matches!(second.as_combat(), Some(CombatEvent::Damaged(report)) if report.defender == s.wolf));

    let applied = effects.recv().await.unwrap();
    assert!(matches!(
        applied.as_combat(),
        Some(CombatEvent::EffectApplied { effect_id, applier, .. })
            if effect_id == "corruption" && *applier == s.priest
    ));

    engine.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn engaged_npc_retaliates_on_its_own() {
    let s = scene();
    let mut engine = engine(s.world);
    let handle = engine.start().unwrap();

    let swing = handle.resolve_attack(s.ana, s.wolf).await.unwrap();
    assert!(swing.is_hit());
    assert_eq!(handle.top_threat(s.wolf).await.unwrap().map(|(id, _)| id), Some(s.ana));

    tokio::time::sleep(Duration::from_millis(100)).await;
    let ana = handle.combatant(s.ana).await.unwrap().unwrap();
    assert!(ana.hp.current < 50);
    assert!(ana.in_combat(handle.now().await.unwrap()));

    engine.stop().await.unwrap();
}

struct FailingHook {
    victim: EntityId,
}

impl TickHook for FailingHook {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn should_run(&self, combatant: &Combatant, _now: Timestamp) -> bool {
        combatant.id == self.victim
    }

    fn on_tick(
        &self,
        _world: &mut World,
        _env: &CombatEnv<'_>,
        entity: EntityId,
        now: Timestamp,
        _rng: &mut dyn CombatRng,
    ) -> Result<(), TickProcessingError> {
        Err(TickProcessingError::hook(entity, self.name(), "boom", now))
    }
}

#[tokio::test(start_paused = true)]
async fn failing_entity_does_not_stop_the_tick() {
    let s = scene();
    let mut engine = engine(s.world).with_hooks(vec![Arc::new(FailingHook { victim: s.priest })]);
    let mut ticks = engine.subscribe(Topic::Tick);
    let handle = engine.start().unwrap();

    handle
        .apply_effect(
            s.ana,
            ContentFactory::bundled()
                .load_spells()
                .unwrap()
                .spells()
                .find(|spell| spell.id == "renew")
                .and_then(|spell| spell.status_effect.clone())
                .unwrap(),
            EffectOrigin::new(s.priest),
        )
        .await
        .unwrap();

    let summary = handle.tick_now().await.unwrap();
    assert_eq!(summary.processed, 3);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].entity(), s.priest);

    let mut saw_failure = false;
    while let Ok(event) = ticks.try_recv() {
        if let Event::Tick(TickEvent::EntityFailed { entity, .. }) = event {
            saw_failure |= entity == s.priest;
        }
    }
    assert!(saw_failure);

    engine.stop().await.unwrap();
}
