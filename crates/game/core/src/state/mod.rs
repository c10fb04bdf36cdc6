//! Authoritative world state.
//!
//! Combatants own their effect containers and (for NPCs) their threat tables.
//! Runtime layers query this state but mutate it exclusively through
//! [`crate::engine::CombatEngine`].
mod combatant;
mod common;
mod error;
mod world;

pub use combatant::{CombatStats, Combatant, CombatantKind};
pub use common::{EntityId, ResourceMeter, RoomId, Timestamp};
pub use error::WorldError;
pub use world::{Room, World};
