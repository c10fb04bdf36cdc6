//! Topic-based event bus for runtime events.
//!
//! The combat worker drains the world's journal after every command and
//! tick and publishes each entry here. Consumers subscribe only to the topics
//! they need.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{CombatRecord, TickEvent};
