//! Damage calculation and the hp choke point.
//!
//! Every source of damage (melee, riposte, spells, periodic ticks) ends up in
//! [`apply_damage`], which runs the same sequence for all of them:
//!
//! ```text
//! policy gate -> modifier snapshot -> absorption -> hp debit / death
//!             -> combat timers -> threat
//! ```

use crate::config::CombatConfig;
use crate::engine::{CombatEvent, RemovalReason};
use crate::env::CombatRng;
use crate::error::{CombatError, ErrorSeverity};
use crate::state::{Combatant, EntityId, Timestamp, World};
use crate::threat;

use super::policy::{DamageContext, DamagePolicy, PolicyDenied};
use super::school::DamageSchool;

// ============================================================================
// Requests and reports
// ============================================================================

/// What produced a damage request.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DamageSource {
    Melee,
    Riposte,
    Spell { spell_id: String },
    Periodic { effect_id: String },
}

impl DamageSource {
    /// Direct damage needs the attacker present; periodic damage does not.
    pub fn is_direct(&self) -> bool {
        !matches!(self, Self::Periodic { .. })
    }
}

/// Input to the choke point. `attacker` may be [`EntityId::WORLD`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DamageRequest {
    pub attacker: EntityId,
    pub defender: EntityId,
    pub amount: u32,
    pub school: DamageSchool,
    pub source: DamageSource,
    pub now: Timestamp,
}

impl DamageRequest {
    pub fn melee(attacker: EntityId, defender: EntityId, amount: u32, now: Timestamp) -> Self {
        Self {
            attacker,
            defender,
            amount,
            school: DamageSchool::Physical,
            source: DamageSource::Melee,
            now,
        }
    }
}

/// What the choke point did.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageReport {
    pub attacker: EntityId,
    pub defender: EntityId,
    pub school: DamageSchool,
    pub source: DamageSource,
    /// Amount before modifiers.
    pub requested: u32,
    /// Amount after damage-dealt and damage-taken modifiers.
    pub amount: u32,
    pub absorbed: u32,
    /// Hp actually removed.
    pub dealt: u32,
    /// Effect ids of shields depleted by this hit.
    pub depleted_shields: Vec<String>,
    pub killed: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DamageError {
    #[error("no combatant {0}")]
    UnknownEntity(EntityId),

    #[error("damage denied: {0}")]
    Denied(#[from] PolicyDenied),
}

impl CombatError for DamageError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownEntity(_) => ErrorSeverity::Validation,
            Self::Denied(denied) => denied.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownEntity(_) => "damage.unknown_entity",
            Self::Denied(denied) => denied.error_code(),
        }
    }
}

// ============================================================================
// Damage calculation
// ============================================================================

/// Multiplies `amount` by `factor` and floors. Negative factors yield 0.
pub fn scale_amount(amount: u32, factor: f64) -> u32 {
    let scaled = (f64::from(amount) * factor).floor();
    if scaled.is_nan() || scaled <= 0.0 {
        0
    } else if scaled >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        scaled as u32
    }
}

/// Applies the configured variance roll to `base`: floored, at least 1.
pub fn roll_variance(base: u32, config: &CombatConfig, rng: &mut dyn CombatRng) -> u32 {
    let factor = rng
        .uniform(config.melee_variance_min, config.melee_variance_max)
        .clamp(config.melee_variance_min, config.melee_variance_max);
    scale_amount(base, factor).max(1)
}

/// Melee damage roll for `attacker`.
///
/// # Formula
///
/// ```text
/// baseline = attack_power, or max_hp * melee_max_hp_percent / 100
/// damage   = max(1, floor(baseline * uniform(variance_min, variance_max)))
/// ```
pub fn compute_melee_damage(
    attacker: &Combatant,
    config: &CombatConfig,
    rng: &mut dyn CombatRng,
) -> u32 {
    let baseline = attacker
        .stats
        .attack_power
        .unwrap_or_else(|| attacker.hp.maximum.saturating_mul(config.melee_max_hp_percent) / 100);
    roll_variance(baseline, config, rng)
}

// ============================================================================
// Choke point
// ============================================================================

/// Applies damage through the policy gate, modifiers and shields.
///
/// Order:
/// 1. policy gate
/// 2. attacker damage-dealt and defender damage-taken modifiers
/// 3. shield absorption of the modified amount
/// 4. hp, death, combat flags and threat
///
/// Shields therefore soak post-modifier damage: a 20% vulnerability makes a
/// 10-point hit cost a shield 12 points.
///
/// # Errors
///
/// - [`DamageError::UnknownEntity`] if the defender (or the attacker of a
///   direct hit) does not exist
/// - [`DamageError::Denied`] if the policy refuses; nothing is mutated
pub fn apply_damage(
    world: &mut World,
    policy: &dyn DamagePolicy,
    config: &CombatConfig,
    request: DamageRequest,
) -> Result<DamageReport, DamageError> {
    let DamageRequest {
        attacker,
        defender,
        amount: requested,
        school,
        source,
        now,
    } = request;

    let target = world
        .get(defender)
        .ok_or(DamageError::UnknownEntity(defender))?;
    let source_combatant = if attacker.is_world() {
        None
    } else {
        match world.get(attacker) {
            Some(combatant) => Some(combatant),
            None if source.is_direct() => return Err(DamageError::UnknownEntity(attacker)),
            None => None,
        }
    };
    let attacker_present = source_combatant.is_some();

    let ctx = DamageContext {
        room: world.room(&target.room),
        source: &source,
        now,
    };
    if let Err(denied) = policy
        .can_damage(source_combatant, target, &ctx)
        .into_result()
    {
        tracing::debug!(
            target: "mud::combat",
            attacker = %attacker,
            defender = %defender,
            reason = %denied.reason,
            "damage denied"
        );
        return Err(denied.into());
    }

    // Modifier snapshots evict expired effects on both sides.
    let dealt_factor = if attacker_present {
        world
            .get_mut(attacker)
            .map(|c| c.effects.snapshot(now).damage_dealt_factor())
            .unwrap_or(1.0)
    } else {
        1.0
    };

    let target = world
        .get_mut(defender)
        .ok_or(DamageError::UnknownEntity(defender))?;
    let taken_factor = target.effects.snapshot(now).damage_taken_factor();
    let amount = scale_amount(requested, dealt_factor * taken_factor);

    let absorb = target.effects.consume_absorb(amount, school, now);
    let dealt = target.hp.debit(absorb.residual);
    let killed = target.hp.is_empty() && target.alive;
    let defender_is_npc = target.is_npc();
    target.enter_combat(now, config.in_combat_ms);
    if killed {
        target.mark_dead();
    }

    if attacker_present
        && attacker != defender
        && let Some(striker) = world.get_mut(attacker)
    {
        striker.enter_combat(now, config.in_combat_ms);
    }

    if defender_is_npc && !killed && attacker_present {
        threat::record_damage(world, defender, attacker, amount);
    }

    let depleted_shields: Vec<String> = absorb
        .depleted
        .into_iter()
        .map(|instance| instance.effect_id)
        .collect();

    let report = DamageReport {
        attacker,
        defender,
        school,
        source,
        requested,
        amount,
        absorbed: absorb.absorbed,
        dealt,
        depleted_shields,
        killed,
    };

    tracing::debug!(
        target: "mud::combat",
        attacker = %attacker,
        defender = %defender,
        school = %school,
        requested,
        amount,
        absorbed = report.absorbed,
        dealt,
        killed,
        "damage applied"
    );

    for effect_id in &report.depleted_shields {
        world.record_event(CombatEvent::EffectRemoved {
            target: defender,
            effect_id: effect_id.clone(),
            reason: RemovalReason::Depleted,
        });
    }
    world.record_event(CombatEvent::Damaged(report.clone()));

    if killed {
        world.forget_threat_source(defender);
        tracing::info!(target: "mud::combat", entity = %defender, killer = %attacker, "combatant died");
        world.record_event(CombatEvent::Died {
            entity: defender,
            killer: attacker,
        });
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::policy::{AllowAll, StandardPolicy};
    use crate::combat::SchoolSet;
    use crate::effect::{EffectKind, EffectModifiers, EffectOrigin, EffectSpec};
    use crate::env::ScriptedRng;
    use crate::state::{CombatStats, RoomId};

    struct Arena {
        world: World,
        ana: EntityId,
        wolf: EntityId,
    }

    fn arena() -> Arena {
        let hall = RoomId::new("hall");
        let mut world = World::new();
        world.add_room(hall.clone(), true);
        let ana = world.spawn(Combatant::player("ana", hall.clone(), 100)).unwrap();
        let wolf = world.spawn(Combatant::npc("wolf", hall, 40)).unwrap();
        Arena { world, ana, wolf }
    }

    #[test]
    fn melee_baseline_prefers_attack_power() {
        let config = CombatConfig::default();
        let brute = Combatant::player("brute", RoomId::new("hall"), 100).with_stats(CombatStats {
            attack_power: Some(10),
            ..CombatStats::default()
        });

        // Raw 0 maps to the bottom of the variance range.
        assert_eq!(compute_melee_damage(&brute, &config, &mut ScriptedRng::new([0])), 8);
    }

    #[test]
    fn melee_baseline_falls_back_to_max_hp() {
        let config = CombatConfig::default();
        let mage = Combatant::player("mage", RoomId::new("hall"), 200);
        assert_eq!(compute_melee_damage(&mage, &config, &mut ScriptedRng::new([0])), 4);

        let wisp = Combatant::npc("wisp", RoomId::new("hall"), 5);
        assert_eq!(compute_melee_damage(&wisp, &config, &mut ScriptedRng::new([0])), 1);
    }

    #[test]
    fn damage_credits_threat_and_starts_combat() {
        let mut a = arena();
        let config = CombatConfig::default();

        let report = apply_damage(
            &mut a.world,
            &StandardPolicy,
            &config,
            DamageRequest::melee(a.ana, a.wolf, 10, Timestamp(100)),
        )
        .unwrap();

        assert_eq!(report.dealt, 10);
        let wolf = a.world.get(a.wolf).unwrap();
        assert_eq!(wolf.hp.current, 30);
        assert_eq!(threat::threat_value(wolf.threat.as_ref().unwrap(), a.ana), 10);
        assert!(wolf.in_combat(Timestamp(100)));
        assert!(a.world.get(a.ana).unwrap().in_combat(Timestamp(100)));
    }

    #[test]
    fn modifiers_scale_before_absorption() {
        let mut a = arena();
        let config = CombatConfig::default();
        let origin = EffectOrigin::new(a.ana);
        let wolf = a.world.get_mut(a.wolf).unwrap();
        wolf.effects
            .apply(
                &EffectSpec::new("expose", 10_000, EffectKind::Debuff).with_modifiers(
                    EffectModifiers {
                        damage_taken_pct: 0.5,
                        damage_dealt_pct: 0.0,
                    },
                ),
                &origin,
                Timestamp(0),
            )
            .unwrap();
        wolf.effects
            .apply(
                &EffectSpec::new(
                    "bark",
                    10_000,
                    EffectKind::Shield {
                        capacity: 5,
                        schools: SchoolSet::empty(),
                    },
                ),
                &origin,
                Timestamp(0),
            )
            .unwrap();

        let report = apply_damage(
            &mut a.world,
            &AllowAll,
            &config,
            DamageRequest::melee(a.ana, a.wolf, 10, Timestamp(10)),
        )
        .unwrap();

        assert_eq!(report.amount, 15);
        assert_eq!(report.absorbed, 5);
        assert_eq!(report.dealt, 10);
        assert_eq!(report.depleted_shields, vec!["bark".to_owned()]);
        // Threat counts the post-modifier amount, absorbed part included.
        let wolf = a.world.get(a.wolf).unwrap();
        assert_eq!(threat::threat_value(wolf.threat.as_ref().unwrap(), a.ana), 15);
    }

    #[test]
    fn lethal_damage_flags_death_and_clears_state() {
        let mut a = arena();
        let config = CombatConfig::default();
        apply_damage(
            &mut a.world,
            &StandardPolicy,
            &config,
            DamageRequest::melee(a.ana, a.wolf, 5, Timestamp(0)),
        )
        .unwrap();

        let report = apply_damage(
            &mut a.world,
            &StandardPolicy,
            &config,
            DamageRequest::melee(a.ana, a.wolf, 500, Timestamp(10)),
        )
        .unwrap();

        assert!(report.killed);
        assert_eq!(report.dealt, 35);
        let wolf = a.world.get(a.wolf).unwrap();
        assert!(!wolf.alive);
        assert!(!wolf.is_engaged());
        assert!(
            a.world
                .drain_events()
                .iter()
                .any(|event| matches!(event, CombatEvent::Died { entity, .. } if *entity == a.wolf))
        );
    }

    #[test]
    fn denial_mutates_nothing() {
        let mut a = arena();
        let config = CombatConfig::default();
        a.world.add_room(RoomId::new("hall"), false);
        let before = a.world.clone();

        let err = apply_damage(
            &mut a.world,
            &StandardPolicy,
            &config,
            DamageRequest::melee(a.ana, a.wolf, 10, Timestamp(0)),
        )
        .unwrap_err();

        assert_eq!(
            err,
            DamageError::Denied(PolicyDenied {
                reason: "combat is disabled in this room".into()
            })
        );
        assert_eq!(a.world, before);
    }

    #[test]
    fn periodic_damage_survives_missing_applier() {
        let mut a = arena();
        let config = CombatConfig::default();
        let report = apply_damage(
            &mut a.world,
            &StandardPolicy,
            &config,
            DamageRequest {
                attacker: EntityId(999),
                defender: a.wolf,
                amount: 4,
                school: DamageSchool::Shadow,
                source: DamageSource::Periodic {
                    effect_id: "corruption".into(),
                },
                now: Timestamp(0),
            },
        )
        .unwrap();

        assert_eq!(report.dealt, 4);
        assert!(!a.world.get(a.wolf).unwrap().is_engaged());
    }
}
