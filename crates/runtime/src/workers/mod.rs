//! Worker tasks that back the runtime orchestration.
//!
//! The combat worker is the single writer of the world: it executes handle
//! commands and fires ticks on one task.

mod clock;
mod combat;

pub(crate) use clock::EngineClock;
pub(crate) use combat::{Command, CombatWorker, WorkerExit};
