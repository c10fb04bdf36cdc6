//! Combat worker that owns the authoritative [`World`].
//!
//! Receives commands from [`EngineHandle`](crate::EngineHandle), executes
//! them through [`CombatEngine`], fires ticks on a fixed interval and
//! publishes the drained journal to the [`EventBus`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use mud_core::{
    ApplyOutcome, AttackResult, CastReport, CleanseFilter, CombatEngine, CombatModifiers,
    Combatant, DamageReport, DamageRequest, DamageSchool, EffectOrigin, EffectSpec, EntityId,
    HealReport, PcgRng, RoomId, TickHook, TickReport, TickSummary, Timestamp, World,
};

use crate::api::{Result, RuntimeError};
use crate::events::{CombatRecord, Event, EventBus, TickEvent};
use crate::oracle::OracleBundle;

use super::EngineClock;

type Reply<T> = oneshot::Sender<T>;

/// Commands that can be sent to the combat worker
pub(crate) enum Command {
    ApplyEffect {
        target: EntityId,
        spec: EffectSpec,
        origin: EffectOrigin,
        reply: Reply<Result<ApplyOutcome>>,
    },
    /// Removes every instance of `effect_id` on `target`.
    RemoveEffect {
        target: EntityId,
        effect_id: String,
        reply: Reply<Result<usize>>,
    },
    Cleanse {
        target: EntityId,
        filter: CleanseFilter,
        reply: Reply<Result<usize>>,
    },
    Snapshot {
        target: EntityId,
        reply: Reply<Result<CombatModifiers>>,
    },
    ConsumeAbsorb {
        target: EntityId,
        incoming: u32,
        school: DamageSchool,
        reply: Reply<Result<u32>>,
    },
    TickEntity {
        entity: EntityId,
        reply: Reply<Result<TickReport>>,
    },
    /// Runs a full tick immediately, outside the interval.
    TickNow { reply: Reply<TickSummary> },
    ApplyDamage {
        request: DamageRequest,
        reply: Reply<Result<DamageReport>>,
    },
    ApplyHeal {
        healer: EntityId,
        target: EntityId,
        amount: u32,
        reply: Reply<Result<HealReport>>,
    },
    Attack {
        attacker: EntityId,
        defender: EntityId,
        reply: Reply<Result<AttackResult>>,
    },
    Cast {
        caster: EntityId,
        target: EntityId,
        spell_id: String,
        reply: Reply<Result<CastReport>>,
    },
    RecordDamage {
        npc: EntityId,
        source: EntityId,
        amount: u32,
        reply: Reply<Option<u64>>,
    },
    RecordHealing {
        room: RoomId,
        healer: EntityId,
        healed: EntityId,
        amount: u32,
        reply: Reply<Vec<(EntityId, u64)>>,
    },
    ThreatValue {
        npc: EntityId,
        entity: EntityId,
        reply: Reply<u64>,
    },
    TopThreat {
        npc: EntityId,
        reply: Reply<Option<(EntityId, u64)>>,
    },
    AddRoom {
        room: RoomId,
        combat_enabled: bool,
        reply: Reply<()>,
    },
    Spawn {
        combatant: Box<Combatant>,
        reply: Reply<Result<EntityId>>,
    },
    Despawn {
        entity: EntityId,
        reply: Reply<Option<Combatant>>,
    },
    MoveTo {
        entity: EntityId,
        room: RoomId,
        reply: Reply<Result<()>>,
    },
    QueryCombatant {
        entity: EntityId,
        reply: Reply<Option<Combatant>>,
    },
    QueryWorld { reply: Reply<World> },
    Now { reply: Reply<Timestamp> },
    /// Exit with the world once the commands queued ahead of it ran.
    Shutdown,
}

/// What the worker hands back when it exits.
pub(crate) struct WorkerExit {
    pub world: World,
    pub now: Timestamp,
    /// RNG state to resume from, so a restart does not replay rolls.
    pub rng: PcgRng,
}

/// Background task that processes combat commands and ticks.
pub(crate) struct CombatWorker {
    world: World,
    oracles: OracleBundle,
    hooks: Arc<[Arc<dyn TickHook>]>,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
    clock: EngineClock,
    rng: PcgRng,
    tick_interval: Duration,
}

impl CombatWorker {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        world: World,
        oracles: OracleBundle,
        hooks: Arc<[Arc<dyn TickHook>]>,
        command_rx: mpsc::Receiver<Command>,
        event_bus: EventBus,
        clock: EngineClock,
        rng: PcgRng,
        tick_interval: Duration,
    ) -> Self {
        info!(
            target: "mud::tick",
            combatants = world.len(),
            hooks = hooks.len(),
            interval_ms = tick_interval.as_millis() as u64,
            "combat worker initialized"
        );

        Self {
            world,
            oracles,
            hooks,
            command_rx,
            event_bus,
            clock,
            rng,
            tick_interval,
        }
    }

    /// Main worker loop. Returns the world once shut down or once every
    /// handle has been dropped.
    pub(crate) async fn run(mut self) -> WorkerExit {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        self.event_bus.publish(Event::Tick(TickEvent::Started {
            at: self.clock.now(),
        }));

        loop {
            tokio::select! {
                // Commands queued before a tick boundary run before it.
                biased;
                cmd = self.command_rx.recv() => match cmd {
                    Some(Command::Shutdown) | None => break,
                    Some(cmd) => self.handle_command(cmd),
                },
                _ = interval.tick() => {
                    self.run_tick();
                }
            }
        }

        let now = self.clock.now();
        self.event_bus
            .publish(Event::Tick(TickEvent::Stopped { at: now }));
        info!(target: "mud::tick", at = now.0, "combat worker stopped");

        WorkerExit {
            world: self.world,
            now,
            rng: self.rng,
        }
    }

    fn run_tick(&mut self) -> TickSummary {
        let now = self.clock.now();
        let env = self.oracles.as_combat_env();
        let mut engine = CombatEngine::new(&mut self.world, env);
        let summary = engine.tick(&self.hooks, now, &mut self.rng);

        if !summary.failures.is_empty() {
            warn!(
                target: "mud::tick",
                at = now.0,
                failures = summary.failures.len(),
                "tick completed with isolated failures"
            );
        }

        self.publish_journal(now);
        for event in TickEvent::from_summary(&summary) {
            self.event_bus.publish(Event::Tick(event));
        }
        summary
    }

    fn publish_journal(&mut self, now: Timestamp) {
        for event in self.world.drain_events() {
            self.event_bus
                .publish(Event::Combat(CombatRecord { at: now, event }));
        }
    }

    fn handle_command(&mut self, cmd: Command) {
        let now = self.clock.now();
        let env = self.oracles.as_combat_env();
        let mut engine = CombatEngine::new(&mut self.world, env);

        // A dropped reply receiver only means the caller stopped waiting.
        let delivered = match cmd {
            Command::ApplyEffect {
                target,
                spec,
                origin,
                reply,
            } => reply
                .send(
                    engine
                        .apply_effect(target, &spec, &origin, now)
                        .map_err(RuntimeError::from),
                )
                .is_ok(),
            Command::RemoveEffect {
                target,
                effect_id,
                reply,
            } => reply
                .send(
                    engine
                        .remove_effects(target, |instance| instance.effect_id == effect_id)
                        .map_err(RuntimeError::from),
                )
                .is_ok(),
            Command::Cleanse {
                target,
                filter,
                reply,
            } => reply
                .send(engine.cleanse(target, &filter).map_err(RuntimeError::from))
                .is_ok(),
            Command::Snapshot { target, reply } => reply
                .send(engine.snapshot(target, now).map_err(RuntimeError::from))
                .is_ok(),
            Command::ConsumeAbsorb {
                target,
                incoming,
                school,
                reply,
            } => reply
                .send(
                    engine
                        .consume_absorb(target, incoming, school, now)
                        .map_err(RuntimeError::from),
                )
                .is_ok(),
            Command::TickEntity { entity, reply } => reply
                .send(engine.tick_entity(entity, now).map_err(RuntimeError::from))
                .is_ok(),
            Command::TickNow { reply } => {
                drop(engine);
                let summary = self.run_tick();
                return self.finish(reply.send(summary).is_ok(), "TickNow", now);
            }
            Command::ApplyDamage { request, reply } => {
                let request = DamageRequest { now, ..request };
                reply
                    .send(engine.apply_damage(request).map_err(RuntimeError::from))
                    .is_ok()
            }
            Command::ApplyHeal {
                healer,
                target,
                amount,
                reply,
            } => reply
                .send(
                    engine
                        .apply_heal(healer, target, amount, now)
                        .map_err(RuntimeError::from),
                )
                .is_ok(),
            Command::Attack {
                attacker,
                defender,
                reply,
            } => reply
                .send(
                    engine
                        .resolve_attack(attacker, defender, now, &mut self.rng)
                        .map_err(RuntimeError::from),
                )
                .is_ok(),
            Command::Cast {
                caster,
                target,
                spell_id,
                reply,
            } => reply
                .send(
                    engine
                        .cast(caster, target, &spell_id, now, &mut self.rng)
                        .map_err(RuntimeError::from),
                )
                .is_ok(),
            Command::RecordDamage {
                npc,
                source,
                amount,
                reply,
            } => reply.send(engine.record_damage(npc, source, amount)).is_ok(),
            Command::RecordHealing {
                room,
                healer,
                healed,
                amount,
                reply,
            } => reply
                .send(engine.record_healing(&room, healer, healed, amount, now))
                .is_ok(),
            Command::ThreatValue { npc, entity, reply } => {
                reply.send(engine.threat_value(npc, entity)).is_ok()
            }
            Command::TopThreat { npc, reply } => reply.send(engine.top_threat(npc)).is_ok(),
            Command::AddRoom {
                room,
                combat_enabled,
                reply,
            } => {
                drop(engine);
                self.world.add_room(room, combat_enabled);
                reply.send(()).is_ok()
            }
            Command::Spawn { combatant, reply } => {
                drop(engine);
                reply
                    .send(self.world.spawn(*combatant).map_err(RuntimeError::from))
                    .is_ok()
            }
            Command::Despawn { entity, reply } => {
                drop(engine);
                reply.send(self.world.despawn(entity)).is_ok()
            }
            Command::MoveTo {
                entity,
                room,
                reply,
            } => {
                drop(engine);
                reply
                    .send(self.world.move_to(entity, room).map_err(RuntimeError::from))
                    .is_ok()
            }
            Command::QueryCombatant { entity, reply } => {
                reply.send(engine.world().get(entity).cloned()).is_ok()
            }
            Command::QueryWorld { reply } => reply.send(engine.world().clone()).is_ok(),
            Command::Now { reply } => reply.send(now).is_ok(),
            Command::Shutdown => true,
        };

        self.finish(delivered, "command", now);
    }

    fn finish(&mut self, delivered: bool, label: &'static str, now: Timestamp) {
        if !delivered {
            debug!(target: "mud::tick", "{label} reply channel closed (caller dropped)");
        }
        self.publish_journal(now);
    }
}
