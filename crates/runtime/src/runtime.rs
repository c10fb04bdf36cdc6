//! Tick engine orchestrator.
//!
//! [`TickEngine`] is a two-state machine. While stopped it owns the
//! [`World`]; [`start`](TickEngine::start) hands the world to a background
//! worker and returns an [`EngineHandle`]; [`stop`](TickEngine::stop) shuts
//! the worker down at a tick boundary and takes the world back.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use mud_core::{PcgRng, TickHook, Timestamp, World, default_hooks};

use crate::api::{EngineHandle, Result, RuntimeError};
use crate::config::EngineConfig;
use crate::events::{Event, EventBus, Topic};
use crate::oracle::OracleBundle;
use crate::workers::{Command, CombatWorker, EngineClock, WorkerExit};

enum EngineState {
    Stopped { world: World, now: Timestamp },
    Running {
        handle: EngineHandle,
        worker: JoinHandle<WorkerExit>,
    },
    /// The worker died without returning the world.
    Failed,
}

/// Drives the combat core on a fixed cadence.
pub struct TickEngine {
    config: EngineConfig,
    oracles: OracleBundle,
    hooks: Arc<[Arc<dyn TickHook>]>,
    event_bus: EventBus,
    state: EngineState,
    rng: PcgRng,
}

impl TickEngine {
    /// Creates a stopped engine over `world` with the default tick hooks.
    ///
    /// `config.combat` becomes the tuning every command and tick sees.
    pub fn new(config: EngineConfig, oracles: OracleBundle, world: World) -> Self {
        let event_bus = EventBus::with_capacity(config.event_buffer_size);
        let rng = PcgRng::new(config.rng_seed);
        let oracles = oracles.with_config(config.combat.clone());
        Self {
            config,
            oracles,
            hooks: default_hooks(),
            event_bus,
            state: EngineState::Stopped {
                world,
                now: Timestamp::ZERO,
            },
            rng,
        }
    }

    /// Replaces the tick hooks; they run in ascending priority.
    #[must_use]
    pub fn with_hooks(mut self, hooks: Vec<Arc<dyn TickHook>>) -> Self {
        let mut hooks = hooks;
        hooks.sort_by_key(|hook| hook.priority());
        self.hooks = hooks.into();
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn oracles(&self) -> &OracleBundle {
        &self.oracles
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, EngineState::Running { .. })
    }

    /// Handle to the running worker.
    pub fn handle(&self) -> Option<EngineHandle> {
        match &self.state {
            EngineState::Running { handle, .. } => Some(handle.clone()),
            _ => None,
        }
    }

    /// The world, while stopped.
    pub fn world(&self) -> Option<&World> {
        match &self.state {
            EngineState::Stopped { world, .. } => Some(world),
            _ => None,
        }
    }

    /// Mutable world access, while stopped.
    pub fn world_mut(&mut self) -> Option<&mut World> {
        match &mut self.state {
            EngineState::Stopped { world, .. } => Some(world),
            _ => None,
        }
    }

    /// Subscribe to a topic. Subscriptions survive restarts.
    pub fn subscribe(&self, topic: Topic) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// `Stopped -> Running`. Engine time resumes where the last run ended.
    pub fn start(&mut self) -> Result<EngineHandle> {
        let (world, now) = match std::mem::replace(&mut self.state, EngineState::Failed) {
            EngineState::Stopped { world, now } => (world, now),
            running @ EngineState::Running { .. } => {
                self.state = running;
                return Err(RuntimeError::AlreadyRunning);
            }
            EngineState::Failed => return Err(RuntimeError::WorldLost),
        };

        let (command_tx, command_rx) = mpsc::channel::<Command>(self.config.command_buffer_size);
        let handle = EngineHandle::new(command_tx, self.event_bus.clone());

        let worker = CombatWorker::new(
            world,
            self.oracles.clone(),
            Arc::clone(&self.hooks),
            command_rx,
            self.event_bus.clone(),
            EngineClock::starting_at(now),
            self.rng,
            self.config.tick_interval,
        );
        let worker = tokio::spawn(worker.run());

        tracing::info!(
            target: "mud::tick",
            at = now.0,
            interval_ms = self.config.tick_interval.as_millis() as u64,
            "tick engine started"
        );

        self.state = EngineState::Running {
            handle: handle.clone(),
            worker,
        };
        Ok(handle)
    }

    /// `Running -> Stopped`. Commands queued before the call still run; the
    /// world is returned as the last completed tick or command left it.
    pub async fn stop(&mut self) -> Result<&World> {
        let (handle, worker) = match std::mem::replace(&mut self.state, EngineState::Failed) {
            EngineState::Running { handle, worker } => (handle, worker),
            other => {
                self.state = other;
                return Err(RuntimeError::NotRunning);
            }
        };

        // The worker may already have exited if every handle was dropped.
        if handle.shutdown().await.is_err() {
            tracing::debug!(target: "mud::tick", "worker already gone before shutdown");
        }

        let exit = worker.await.map_err(|err| {
            tracing::error!(target: "mud::tick", error = %err, "combat worker failed");
            RuntimeError::WorkerJoin(err)
        })?;

        tracing::info!(target: "mud::tick", at = exit.now.0, "tick engine stopped");
        self.rng = exit.rng;
        self.state = EngineState::Stopped {
            world: exit.world,
            now: exit.now,
        };
        match &self.state {
            EngineState::Stopped { world, .. } => Ok(world),
            _ => Err(RuntimeError::WorldLost),
        }
    }

    /// Stops if needed and returns the world.
    pub async fn into_world(mut self) -> Result<World> {
        if self.is_running() {
            self.stop().await?;
        }
        match self.state {
            EngineState::Stopped { world, .. } => Ok(world),
            _ => Err(RuntimeError::WorldLost),
        }
    }
}
