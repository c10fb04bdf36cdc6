//! Cloneable façade for issuing commands to the combat worker.
//!
//! [`EngineHandle`] hides channel plumbing and mirrors the core operations as
//! async calls. Every call is executed by the worker between ticks, at the
//! engine's current time.
use tokio::sync::{broadcast, mpsc, oneshot};

use mud_core::{
    ApplyOutcome, AttackResult, CastReport, CleanseFilter, CombatModifiers, Combatant,
    DamageReport, DamageRequest, DamageSchool, EffectOrigin, EffectSpec, EntityId, HealReport,
    RoomId, TickReport, TickSummary, Timestamp, World,
};

use super::errors::{Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};
use crate::workers::Command;

/// Client-facing handle to interact with a running engine
#[derive(Clone)]
pub struct EngineHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl EngineHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(make(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    pub(crate) async fn shutdown(&self) -> Result<()> {
        self.command_tx
            .send(Command::Shutdown)
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)
    }

    /// Whether the worker behind this handle is still accepting commands.
    pub fn is_connected(&self) -> bool {
        !self.command_tx.is_closed()
    }

    // ===== effects =====

    pub async fn apply_effect(
        &self,
        target: EntityId,
        spec: EffectSpec,
        origin: EffectOrigin,
    ) -> Result<ApplyOutcome> {
        self.request(|reply| Command::ApplyEffect {
            target,
            spec,
            origin,
            reply,
        })
        .await?
    }

    /// Removes every instance of `effect_id` on `target`; returns the count.
    pub async fn remove_effect(&self, target: EntityId, effect_id: impl Into<String>) -> Result<usize> {
        let effect_id = effect_id.into();
        self.request(|reply| Command::RemoveEffect {
            target,
            effect_id,
            reply,
        })
        .await?
    }

    pub async fn cleanse(&self, target: EntityId, filter: CleanseFilter) -> Result<usize> {
        self.request(|reply| Command::Cleanse {
            target,
            filter,
            reply,
        })
        .await?
    }

    pub async fn snapshot(&self, target: EntityId) -> Result<CombatModifiers> {
        self.request(|reply| Command::Snapshot { target, reply })
            .await?
    }

    /// Residual damage after `target`'s shields soak `incoming`.
    pub async fn consume_absorb(
        &self,
        target: EntityId,
        incoming: u32,
        school: DamageSchool,
    ) -> Result<u32> {
        self.request(|reply| Command::ConsumeAbsorb {
            target,
            incoming,
            school,
            reply,
        })
        .await?
    }

    // ===== ticking =====

    pub async fn tick_entity(&self, entity: EntityId) -> Result<TickReport> {
        self.request(|reply| Command::TickEntity { entity, reply })
            .await?
    }

    /// Runs one full tick right away instead of waiting for the interval.
    pub async fn tick_now(&self) -> Result<TickSummary> {
        self.request(|reply| Command::TickNow { reply }).await
    }

    // ===== combat =====

    /// Routes `request` through the damage choke point. Its `now` is replaced
    /// by the engine clock.
    pub async fn apply_damage(&self, request: DamageRequest) -> Result<DamageReport> {
        self.request(|reply| Command::ApplyDamage { request, reply })
            .await?
    }

    pub async fn apply_heal(
        &self,
        healer: EntityId,
        target: EntityId,
        amount: u32,
    ) -> Result<HealReport> {
        self.request(|reply| Command::ApplyHeal {
            healer,
            target,
            amount,
            reply,
        })
        .await?
    }

    pub async fn resolve_attack(&self, attacker: EntityId, defender: EntityId) -> Result<AttackResult> {
        self.request(|reply| Command::Attack {
            attacker,
            defender,
            reply,
        })
        .await?
    }

    pub async fn cast(
        &self,
        caster: EntityId,
        target: EntityId,
        spell_id: impl Into<String>,
    ) -> Result<CastReport> {
        let spell_id = spell_id.into();
        self.request(|reply| Command::Cast {
            caster,
            target,
            spell_id,
            reply,
        })
        .await?
    }

    // ===== threat =====

    pub async fn record_damage(&self, npc: EntityId, source: EntityId, amount: u32) -> Result<Option<u64>> {
        self.request(|reply| Command::RecordDamage {
            npc,
            source,
            amount,
            reply,
        })
        .await
    }

    pub async fn record_healing(
        &self,
        room: RoomId,
        healer: EntityId,
        healed: EntityId,
        amount: u32,
    ) -> Result<Vec<(EntityId, u64)>> {
        self.request(|reply| Command::RecordHealing {
            room,
            healer,
            healed,
            amount,
            reply,
        })
        .await
    }

    pub async fn threat_value(&self, npc: EntityId, entity: EntityId) -> Result<u64> {
        self.request(|reply| Command::ThreatValue { npc, entity, reply })
            .await
    }

    pub async fn top_threat(&self, npc: EntityId) -> Result<Option<(EntityId, u64)>> {
        self.request(|reply| Command::TopThreat { npc, reply }).await
    }

    // ===== world =====

    pub async fn add_room(&self, room: RoomId, combat_enabled: bool) -> Result<()> {
        self.request(|reply| Command::AddRoom {
            room,
            combat_enabled,
            reply,
        })
        .await
    }

    pub async fn spawn(&self, combatant: Combatant) -> Result<EntityId> {
        self.request(|reply| Command::Spawn {
            combatant: Box::new(combatant),
            reply,
        })
        .await?
    }

    pub async fn despawn(&self, entity: EntityId) -> Result<Option<Combatant>> {
        self.request(|reply| Command::Despawn { entity, reply }).await
    }

    pub async fn move_to(&self, entity: EntityId, room: RoomId) -> Result<()> {
        self.request(|reply| Command::MoveTo {
            entity,
            room,
            reply,
        })
        .await?
    }

    pub async fn combatant(&self, entity: EntityId) -> Result<Option<Combatant>> {
        self.request(|reply| Command::QueryCombatant { entity, reply })
            .await
    }

    /// Clone of the whole world (read-only snapshot).
    pub async fn query_world(&self) -> Result<World> {
        self.request(|reply| Command::QueryWorld { reply }).await
    }

    /// Current engine time.
    pub async fn now(&self) -> Result<Timestamp> {
        self.request(|reply| Command::Now { reply }).await
    }

    // ===== events =====

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Combat` - hits, heals, casts and deaths
    /// - `Topic::Effect` - effect applications and removals
    /// - `Topic::Tick` - tick-loop lifecycle and per-entity failures
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
