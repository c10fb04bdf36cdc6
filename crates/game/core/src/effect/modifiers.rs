//! Aggregated combat modifiers.

/// Sum of the modifiers of every active instance on a combatant.
///
/// Produced by [`EffectContainer::snapshot`](super::EffectContainer::snapshot)
/// and consumed by damage math.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatModifiers {
    pub damage_taken_pct: f64,
    pub damage_dealt_pct: f64,
    /// Total absorb capacity across active shields.
    pub absorb_total: u32,
    /// Number of active instances that contributed.
    pub active_effects: usize,
}

impl CombatModifiers {
    /// Multiplier applied to incoming damage (never negative).
    pub fn damage_taken_factor(&self) -> f64 {
        (1.0 + self.damage_taken_pct).max(0.0)
    }

    /// Multiplier applied to outgoing damage (never negative).
    pub fn damage_dealt_factor(&self) -> f64 {
        (1.0 + self.damage_dealt_pct).max(0.0)
    }
}
