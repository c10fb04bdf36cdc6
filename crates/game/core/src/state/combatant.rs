use std::collections::BTreeMap;

use super::common::{EntityId, ResourceMeter, RoomId, Timestamp};
use crate::effect::{EffectContainer, TagSet};
use crate::threat::ThreatState;

/// Whether a combatant is controlled by a player session or by the world.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CombatantKind {
    Player,
    Npc,
}

/// Avoidance and offense stats, all chances in percent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CombatStats {
    /// Flat melee baseline. When absent the baseline derives from max hp.
    pub attack_power: Option<u32>,
    pub dodge_pct: u32,
    pub parry_pct: u32,
    /// Chance to strike back after a successful parry.
    pub riposte_pct: u32,
}

/// A player or NPC that can hold effects and take part in combat.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Combatant {
    pub id: EntityId,
    pub kind: CombatantKind,
    pub name: String,
    pub room: RoomId,
    pub hp: ResourceMeter,
    pub mana: ResourceMeter,
    pub alive: bool,
    pub tags: TagSet,
    pub stats: CombatStats,
    /// Spell id -> time the spell becomes ready again.
    pub cooldowns: BTreeMap<String, Timestamp>,
    pub in_combat_until: Timestamp,
    /// Earliest time an engaged NPC may swing again.
    pub next_swing_at: Timestamp,
    pub effects: EffectContainer,
    /// Present for NPCs only.
    pub threat: Option<ThreatState>,
}

impl Combatant {
    /// Creates a combatant with full hp. The id is assigned on spawn.
    pub fn new(
        kind: CombatantKind,
        name: impl Into<String>,
        room: RoomId,
        max_hp: u32,
    ) -> Self {
        Self {
            id: EntityId::default(),
            kind,
            name: name.into(),
            room,
            hp: ResourceMeter::full(max_hp),
            mana: ResourceMeter::default(),
            alive: true,
            tags: TagSet::new(),
            stats: CombatStats::default(),
            cooldowns: BTreeMap::new(),
            in_combat_until: Timestamp::ZERO,
            next_swing_at: Timestamp::ZERO,
            effects: EffectContainer::default(),
            threat: match kind {
                CombatantKind::Npc => Some(ThreatState::default()),
                CombatantKind::Player => None,
            },
        }
    }

    pub fn player(name: impl Into<String>, room: RoomId, max_hp: u32) -> Self {
        Self::new(CombatantKind::Player, name, room, max_hp)
    }

    pub fn npc(name: impl Into<String>, room: RoomId, max_hp: u32) -> Self {
        Self::new(CombatantKind::Npc, name, room, max_hp)
    }

    #[must_use]
    pub fn with_stats(mut self, stats: CombatStats) -> Self {
        self.stats = stats;
        self
    }

    #[must_use]
    pub fn with_mana(mut self, max_mana: u32) -> Self {
        self.mana = ResourceMeter::full(max_mana);
        self
    }

    #[must_use]
    pub fn with_tags<'a>(mut self, values: impl IntoIterator<Item = &'a str>) -> Self {
        self.tags.extend(values.into_iter().map(str::to_owned));
        self
    }

    pub fn is_npc(&self) -> bool {
        self.kind == CombatantKind::Npc
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn in_combat(&self, now: Timestamp) -> bool {
        self.in_combat_until > now
    }

    pub fn enter_combat(&mut self, now: Timestamp, duration_ms: u64) {
        self.in_combat_until = self.in_combat_until.max(now + duration_ms);
    }

    /// Milliseconds until `spell_id` is ready, or `None` if it is ready now.
    pub fn cooldown_remaining(&self, spell_id: &str, now: Timestamp) -> Option<u64> {
        self.cooldowns
            .get(spell_id)
            .filter(|ready_at| **ready_at > now)
            .map(|ready_at| ready_at.since(now))
    }

    /// Engaged means at least one threat entry exists.
    pub fn is_engaged(&self) -> bool {
        self.threat.as_ref().is_some_and(|threat| !threat.is_empty())
    }

    /// Flags death and drops per-life state: effects and threat.
    pub(crate) fn mark_dead(&mut self) {
        self.alive = false;
        self.hp.current = 0;
        self.effects.clear();
        if let Some(threat) = self.threat.as_mut() {
            threat.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_npcs_get_threat_tables() {
        let room = RoomId::new("hall");
        assert!(Combatant::npc("wolf", room.clone(), 30).threat.is_some());
        assert!(Combatant::player("ana", room, 30).threat.is_none());
    }

    #[test]
    fn cooldown_reports_remaining_time() {
        let mut mage = Combatant::player("ana", RoomId::new("hall"), 30);
        mage.cooldowns.insert("fireball".into(), Timestamp(5_000));

        assert_eq!(mage.cooldown_remaining("fireball", Timestamp(3_000)), Some(2_000));
        assert_eq!(mage.cooldown_remaining("fireball", Timestamp(5_000)), None);
        assert_eq!(mage.cooldown_remaining("frostbolt", Timestamp(0)), None);
    }

    #[test]
    fn combat_timer_never_shortens() {
        let mut ana = Combatant::player("ana", RoomId::new("hall"), 30);
        ana.enter_combat(Timestamp(1_000), 6_000);
        ana.enter_combat(Timestamp(500), 1_000);
        assert_eq!(ana.in_combat_until, Timestamp(7_000));
        assert!(ana.in_combat(Timestamp(6_999)));
        assert!(!ana.in_combat(Timestamp(7_000)));
    }
}
