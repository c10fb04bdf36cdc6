/// Combat tuning constants and tunable parameters.
///
/// Runtime-tunable values live in the struct; structural limits are
/// associated constants.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CombatConfig {
    /// Threat credited to a healer per point of effective healing.
    pub heal_threat_multiplier: f64,

    /// How long a combatant stays flagged "in combat" after dealing or
    /// taking damage.
    pub in_combat_ms: u64,

    /// Lower bound of the melee variance factor.
    pub melee_variance_min: f64,

    /// Upper bound of the melee variance factor.
    pub melee_variance_max: f64,

    /// Melee baseline as a percentage of the attacker's max hp, used when
    /// the attacker has no attack-power stat.
    pub melee_max_hp_percent: u32,

    /// Delay between retaliation swings of an engaged NPC.
    pub npc_swing_interval_ms: u64,
}

impl CombatConfig {
    // ===== structural limits =====
    /// Riposte recursion cap: a riposte never triggers another riposte.
    pub const MAX_RIPOSTE_DEPTH: u8 = 1;
    /// Upper bound on stack counts for `stack`-policy effects.
    pub const MAX_STACKS_CAP: u32 = 255;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_HEAL_THREAT_MULTIPLIER: f64 = 2.0;
    pub const DEFAULT_IN_COMBAT_MS: u64 = 6_000;
    pub const DEFAULT_MELEE_VARIANCE_MIN: f64 = 0.8;
    pub const DEFAULT_MELEE_VARIANCE_MAX: f64 = 1.2;
    pub const DEFAULT_MELEE_MAX_HP_PERCENT: u32 = 3;
    pub const DEFAULT_NPC_SWING_INTERVAL_MS: u64 = 2_000;

    pub fn new() -> Self {
        Self {
            heal_threat_multiplier: Self::DEFAULT_HEAL_THREAT_MULTIPLIER,
            in_combat_ms: Self::DEFAULT_IN_COMBAT_MS,
            melee_variance_min: Self::DEFAULT_MELEE_VARIANCE_MIN,
            melee_variance_max: Self::DEFAULT_MELEE_VARIANCE_MAX,
            melee_max_hp_percent: Self::DEFAULT_MELEE_MAX_HP_PERCENT,
            npc_swing_interval_ms: Self::DEFAULT_NPC_SWING_INTERVAL_MS,
        }
    }

    pub fn with_heal_threat_multiplier(mut self, multiplier: f64) -> Self {
        self.heal_threat_multiplier = multiplier;
        self
    }
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self::new()
    }
}
