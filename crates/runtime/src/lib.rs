//! Runtime orchestration for the combat engine.
//!
//! This crate wires the deterministic `mud-core` rules to a clock, a command
//! channel and an event bus. Consumers build a [`TickEngine`], start it to get
//! an [`EngineHandle`], and subscribe to [`Topic`]s for what happens.
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the tick engine state machine
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides the topic-based event bus
//! - [`oracle`] adapts loaded content into the catalogs the core consumes
//! - [`config`] holds runtime configuration and its environment overrides
//! - `workers` keeps the combat worker internal to the crate
pub mod api;
pub mod config;
pub mod events;
pub mod oracle;
pub mod runtime;

mod workers;

pub use api::{EngineHandle, Result, RuntimeError};
pub use config::EngineConfig;
pub use events::{CombatRecord, Event, EventBus, TickEvent, Topic};
pub use oracle::{OracleBundle, SpellOracle};
pub use runtime::TickEngine;
