//! Event payloads published by the combat worker.

use mud_core::{CombatEvent, EntityId, Timestamp, TickSummary};

/// Tick-loop lifecycle and per-tick results.
#[derive(Debug, Clone, PartialEq)]
pub enum TickEvent {
    Started { at: Timestamp },
    /// A tick finished. Failures are reported separately.
    Completed {
        at: Timestamp,
        processed: usize,
        fired: usize,
        deaths: Vec<EntityId>,
    },
    /// Processing one entity failed; the rest of the tick went on.
    EntityFailed {
        at: Timestamp,
        entity: EntityId,
        error: String,
    },
    Stopped { at: Timestamp },
}

impl TickEvent {
    /// Splits a summary into a completion event followed by one event per
    /// failed entity.
    pub fn from_summary(summary: &TickSummary) -> Vec<Self> {
        let mut events = Vec::with_capacity(1 + summary.failures.len());
        events.push(Self::Completed {
            at: summary.now,
            processed: summary.processed,
            fired: summary.fired,
            deaths: summary.deaths.clone(),
        });
        events.extend(summary.failures.iter().map(|failure| Self::EntityFailed {
            at: summary.now,
            entity: failure.entity(),
            error: failure.to_string(),
        }));
        events
    }
}

/// Combat journal entry stamped with the engine time it was drained at.
#[derive(Debug, Clone, PartialEq)]
pub struct CombatRecord {
    pub at: Timestamp,
    pub event: CombatEvent,
}
