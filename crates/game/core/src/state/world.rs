use std::collections::{BTreeMap, BTreeSet};

use super::combatant::Combatant;
use super::common::{EntityId, RoomId};
use super::error::WorldError;
use crate::engine::CombatEvent;

/// A location combatants share. Combat policy is decided per room.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Room {
    pub id: RoomId,
    pub combat_enabled: bool,
    pub occupants: BTreeSet<EntityId>,
}

impl Room {
    pub fn new(id: RoomId, combat_enabled: bool) -> Self {
        Self {
            id,
            combat_enabled,
            occupants: BTreeSet::new(),
        }
    }
}

/// Everything the combat engine mutates.
///
/// Ordered maps keep iteration reproducible, so a tick evaluated twice from
/// the same world produces the same result.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct World {
    rooms: BTreeMap<RoomId, Room>,
    combatants: BTreeMap<EntityId, Combatant>,
    next_entity: u32,
    journal: Vec<CombatEvent>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a room, or updates the combat flag of an existing one.
    pub fn add_room(&mut self, id: RoomId, combat_enabled: bool) -> &mut Room {
        let room = self
            .rooms
            .entry(id.clone())
            .or_insert_with(|| Room::new(id, combat_enabled));
        room.combat_enabled = combat_enabled;
        room
    }

    pub fn room(&self, id: &RoomId) -> Option<&Room> {
        self.rooms.get(id)
    }

    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    /// Places a combatant in its room and assigns it a fresh id.
    ///
    /// NPCs start with an empty threat table.
    pub fn spawn(&mut self, mut combatant: Combatant) -> Result<EntityId, WorldError> {
        let room = self
            .rooms
            .get_mut(&combatant.room)
            .ok_or_else(|| WorldError::UnknownRoom(combatant.room.clone()))?;

        if self.next_entity == EntityId::WORLD.0 {
            return Err(WorldError::EntityIdOverflow);
        }
        let id = EntityId(self.next_entity);
        self.next_entity += 1;

        combatant.id = id;
        if combatant.is_npc() && combatant.threat.is_none() {
            combatant.threat = Some(Default::default());
        }
        room.occupants.insert(id);
        self.combatants.insert(id, combatant);
        Ok(id)
    }

    /// Removes a combatant from the world and from every threat table.
    pub fn despawn(&mut self, id: EntityId) -> Option<Combatant> {
        let combatant = self.combatants.remove(&id)?;
        if let Some(room) = self.rooms.get_mut(&combatant.room) {
            room.occupants.remove(&id);
        }
        self.forget_threat_source(id);
        Some(combatant)
    }

    pub fn move_to(&mut self, id: EntityId, destination: RoomId) -> Result<(), WorldError> {
        if !self.rooms.contains_key(&destination) {
            return Err(WorldError::UnknownRoom(destination));
        }
        let combatant = self
            .combatants
            .get_mut(&id)
            .ok_or(WorldError::UnknownEntity(id))?;

        let origin = std::mem::replace(&mut combatant.room, destination.clone());
        if let Some(room) = self.rooms.get_mut(&origin) {
            room.occupants.remove(&id);
        }
        if let Some(room) = self.rooms.get_mut(&destination) {
            room.occupants.insert(id);
        }
        Ok(())
    }

    pub fn get(&self, id: EntityId) -> Option<&Combatant> {
        self.combatants.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Combatant> {
        self.combatants.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.combatants.contains_key(&id)
    }

    pub fn combatants(&self) -> impl Iterator<Item = &Combatant> {
        self.combatants.values()
    }

    pub fn len(&self) -> usize {
        self.combatants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combatants.is_empty()
    }

    /// Ids of every living combatant, room by room.
    pub fn live_entities(&self) -> Vec<EntityId> {
        self.rooms
            .values()
            .flat_map(|room| room.occupants.iter().copied())
            .filter(|id| self.combatants.get(id).is_some_and(|c| c.alive))
            .collect()
    }

    /// Living NPCs in `room` whose threat table has an entry for any of `entities`.
    pub fn engaged_npcs(&self, room: &RoomId, entities: &[EntityId]) -> Vec<EntityId> {
        let Some(room) = self.rooms.get(room) else {
            return Vec::new();
        };

        room.occupants
            .iter()
            .filter_map(|id| self.combatants.get(id))
            .filter(|npc| npc.alive)
            .filter(|npc| {
                npc.threat
                    .as_ref()
                    .is_some_and(|threat| entities.iter().any(|e| threat.is_engaged_with(*e)))
            })
            .map(|npc| npc.id)
            .collect()
    }

    /// Returns true when both combatants exist and share a room.
    pub fn co_located(&self, a: EntityId, b: EntityId) -> bool {
        match (self.combatants.get(&a), self.combatants.get(&b)) {
            (Some(a), Some(b)) => a.room == b.room,
            _ => false,
        }
    }

    pub(crate) fn forget_threat_source(&mut self, source: EntityId) {
        for combatant in self.combatants.values_mut() {
            if let Some(threat) = combatant.threat.as_mut() {
                threat.forget(source);
            }
        }
    }

    pub(crate) fn record_event(&mut self, event: CombatEvent) {
        self.journal.push(event);
    }

    pub(crate) fn journal_len(&self) -> usize {
        self.journal.len()
    }

    /// Drops events recorded after `len`.
    pub(crate) fn rewind_journal(&mut self, len: usize) {
        self.journal.truncate(len);
    }

    /// Takes every event recorded since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.journal)
    }
}
