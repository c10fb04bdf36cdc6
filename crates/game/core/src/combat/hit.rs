//! Avoidance rolls.

use crate::env::CombatRng;
use crate::state::CombatStats;

/// How the defender met an incoming swing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Avoidance {
    Dodge,
    Parry,
    None,
}

/// Rolls one d100 against the defender's avoidance table.
///
/// ```text
/// roll <= dodge           -> Dodge
/// roll <= dodge + parry   -> Parry
/// otherwise               -> None (the swing lands)
/// ```
pub fn roll_avoidance(defender: &CombatStats, rng: &mut dyn CombatRng) -> Avoidance {
    let roll = rng.roll_d100();
    let dodge = defender.dodge_pct.min(100);
    let parry = dodge.saturating_add(defender.parry_pct).min(100);

    if roll <= dodge {
        Avoidance::Dodge
    } else if roll <= parry {
        Avoidance::Parry
    } else {
        Avoidance::None
    }
}

/// Rolls a d100 against the riposte chance.
pub fn roll_riposte(defender: &CombatStats, rng: &mut dyn CombatRng) -> bool {
    rng.roll_d100() <= defender.riposte_pct.min(100)
}
