//! NPC threat (aggro).
//!
//! Each NPC keeps a table of accumulated threat per source entity. Damage adds
//! threat 1:1 to the attacker; healing adds a multiple of the effective heal to
//! the healer on every NPC already engaged with the healer or the healed
//! target. Threat never decays here; it is cleared on death or despawn.

use std::collections::BTreeMap;

use crate::config::CombatConfig;
use crate::state::{EntityId, RoomId, Timestamp, World};

/// Per-NPC threat table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThreatState {
    entries: BTreeMap<EntityId, u64>,
}

impl ThreatState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `amount` to `source`'s entry, creating it if absent.
    pub fn add(&mut self, source: EntityId, amount: u64) -> u64 {
        let entry = self.entries.entry(source).or_insert(0);
        *entry = entry.saturating_add(amount);
        *entry
    }

    pub fn get(&self, source: EntityId) -> u64 {
        self.entries.get(&source).copied().unwrap_or(0)
    }

    /// An entry exists for `source`, even one worth zero.
    pub fn is_engaged_with(&self, source: EntityId) -> bool {
        self.entries.contains_key(&source)
    }

    pub fn forget(&mut self, source: EntityId) -> Option<u64> {
        self.entries.remove(&source)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries ordered by threat descending, then entity id ascending.
    pub fn ranked(&self) -> Vec<(EntityId, u64)> {
        let mut ranked: Vec<_> = self.entries.iter().map(|(id, v)| (*id, *v)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, u64)> + '_ {
        self.entries.iter().map(|(id, value)| (*id, *value))
    }
}

/// Accumulated threat of `entity`, or 0.
pub fn threat_value(state: &ThreatState, entity: EntityId) -> u64 {
    state.get(entity)
}

/// Highest-threat source. Ties go to the lower entity id.
pub fn top_threat(state: &ThreatState) -> Option<(EntityId, u64)> {
    state.ranked().into_iter().next()
}

/// Credits `amount` threat to `source` on `npc`. Returns the new total, or
/// `None` when `npc` is not a living NPC.
pub fn record_damage(world: &mut World, npc: EntityId, source: EntityId, amount: u32) -> Option<u64> {
    if source.is_world() || source == npc {
        return None;
    }

    let target = world.get_mut(npc).filter(|c| c.alive)?;
    let total = target.threat.as_mut()?.add(source, u64::from(amount));

    tracing::trace!(
        target: "mud::threat",
        npc = %npc,
        source = %source,
        amount,
        total,
        "damage threat"
    );
    Some(total)
}

/// Threat a heal of `amount` generates: `floor(amount * multiplier)`.
pub fn healing_threat(amount: u32, multiplier: f64) -> u64 {
    let threat = (f64::from(amount) * multiplier).floor();
    if threat.is_finite() && threat > 0.0 {
        threat as u64
    } else {
        0
    }
}

/// Credits healing threat to `healer` on every living NPC in `room` already
/// engaged with `healer` or `healed`.
///
/// Returns `(npc, threat_added)` for each NPC touched.
pub fn record_healing(
    world: &mut World,
    config: &CombatConfig,
    room: &RoomId,
    healer: EntityId,
    healed: EntityId,
    amount: u32,
    now: Timestamp,
) -> Vec<(EntityId, u64)> {
    let threat = healing_threat(amount, config.heal_threat_multiplier);
    if threat == 0 || healer.is_world() {
        return Vec::new();
    }

    let engaged = world.engaged_npcs(room, &[healer, healed]);
    let mut credited = Vec::with_capacity(engaged.len());

    for npc in engaged {
        if npc == healer {
            continue;
        }
        if let Some(state) = world.get_mut(npc).and_then(|c| c.threat.as_mut()) {
            state.add(healer, threat);
            credited.push((npc, threat));
        }
    }

    if !credited.is_empty() {
        if let Some(combatant) = world.get_mut(healer) {
            combatant.enter_combat(now, config.in_combat_ms);
        }
        tracing::debug!(
            target: "mud::threat",
            healer = %healer,
            healed = %healed,
            amount,
            threat,
            npcs = credited.len(),
            "healing threat"
        );
    }

    credited
}
