//! Attack resolution and its result types.

use std::fmt;

use crate::config::CombatConfig;
use crate::engine::CombatEvent;
use crate::env::CombatRng;
use crate::state::{EntityId, Timestamp, World};

use super::damage::{
    DamageError, DamageReport, DamageRequest, DamageSource, apply_damage, compute_melee_damage,
};
use super::hit::{Avoidance, roll_avoidance, roll_riposte};
use super::policy::{DamageContext, DamagePolicy, PolicyDecision};
use super::school::DamageSchool;

/// Outcome of a single swing.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttackOutcome {
    /// The policy gate refused; nothing happened.
    Denied { reason: String },
    Dodged,
    Parried,
    Hit,
}

/// Result of [`resolve_attack`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackResult {
    pub attacker: EntityId,
    pub defender: EntityId,
    pub outcome: AttackOutcome,
    /// Present when the swing landed.
    pub damage: Option<DamageReport>,
    /// The defender's counter after a parry. A riposte never carries one.
    pub riposte: Option<Box<AttackResult>>,
}

impl AttackResult {
    fn new(attacker: EntityId, defender: EntityId, outcome: AttackOutcome) -> Self {
        Self {
            attacker,
            defender,
            outcome,
            damage: None,
            riposte: None,
        }
    }

    pub fn is_hit(&self) -> bool {
        self.outcome == AttackOutcome::Hit
    }

    /// Hp removed from the defender by the initial swing.
    pub fn dealt(&self) -> u32 {
        self.damage.as_ref().map_or(0, |report| report.dealt)
    }

    pub fn riposte_count(&self) -> usize {
        let mut count = 0;
        let mut current = self.riposte.as_deref();
        while let Some(riposte) = current {
            count += 1;
            current = riposte.riposte.as_deref();
        }
        count
    }
}

impl fmt::Display for AttackResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            AttackOutcome::Denied { reason } => {
                write!(f, "{} cannot attack {}: {}.", self.attacker, self.defender, reason)?
            }
            AttackOutcome::Dodged => {
                write!(f, "{} dodges {}'s attack.", self.defender, self.attacker)?
            }
            AttackOutcome::Parried => {
                write!(f, "{} parries {}'s attack.", self.defender, self.attacker)?
            }
            AttackOutcome::Hit => {
                let damage = self.damage.as_ref();
                write!(
                    f,
                    "{} hits {} for {}",
                    self.attacker,
                    self.defender,
                    damage.map_or(0, |d| d.amount)
                )?;
                if let Some(report) = damage
                    && report.absorbed > 0
                {
                    write!(f, " ({} absorbed)", report.absorbed)?;
                }
                f.write_str(".")?;
                if damage.is_some_and(|d| d.killed) {
                    write!(f, " {} dies.", self.defender)?;
                }
            }
        }

        if let Some(riposte) = &self.riposte {
            write!(f, " {} ripostes! {}", riposte.attacker, riposte)?;
        }
        Ok(())
    }
}

/// Resolves one melee swing from `attacker` at `defender`.
///
/// Order: policy gate, d100 avoidance (dodge then parry), damage roll and
/// choke point. A parry may trigger one riposte, an unavoidable counter-hit
/// that itself never ripostes.
///
/// # Errors
///
/// [`DamageError::UnknownEntity`] if either combatant does not exist.
/// Denials are reported as [`AttackOutcome::Denied`], not as errors, and
/// leave the world (journal included) untouched.
pub fn resolve_attack(
    world: &mut World,
    policy: &dyn DamagePolicy,
    config: &CombatConfig,
    attacker: EntityId,
    defender: EntityId,
    now: Timestamp,
    rng: &mut dyn CombatRng,
) -> Result<AttackResult, DamageError> {
    let result = strike(world, policy, config, attacker, defender, now, rng, 0)?;
    if !matches!(result.outcome, AttackOutcome::Denied { .. }) {
        tracing::debug!(target: "mud::combat", %result, "attack resolved");
        world.record_event(CombatEvent::Attacked(result.clone()));
    }
    Ok(result)
}

#[allow(clippy::too_many_arguments)]
fn strike(
    world: &mut World,
    policy: &dyn DamagePolicy,
    config: &CombatConfig,
    attacker: EntityId,
    defender: EntityId,
    now: Timestamp,
    rng: &mut dyn CombatRng,
    depth: u8,
) -> Result<AttackResult, DamageError> {
    let source = if depth == 0 {
        DamageSource::Melee
    } else {
        DamageSource::Riposte
    };

    let striker = world.get(attacker).ok_or(DamageError::UnknownEntity(attacker))?;
    let target = world.get(defender).ok_or(DamageError::UnknownEntity(defender))?;

    let ctx = DamageContext {
        room: world.room(&target.room),
        source: &source,
        now,
    };
    if let PolicyDecision::Deny { reason } = policy.can_damage(Some(striker), target, &ctx) {
        return Ok(AttackResult::new(
            attacker,
            defender,
            AttackOutcome::Denied { reason },
        ));
    }

    let defender_stats = target.stats;
    let striker = striker.clone();

    if depth == 0 {
        match roll_avoidance(&defender_stats, rng) {
            Avoidance::Dodge => {
                return Ok(AttackResult::new(attacker, defender, AttackOutcome::Dodged));
            }
            Avoidance::Parry => {
                let mut result = AttackResult::new(attacker, defender, AttackOutcome::Parried);
                if depth < CombatConfig::MAX_RIPOSTE_DEPTH && roll_riposte(&defender_stats, rng) {
                    let riposte =
                        strike(world, policy, config, defender, attacker, now, rng, depth + 1)?;
                    result.riposte = Some(Box::new(riposte));
                }
                return Ok(result);
            }
            Avoidance::None => {}
        }
    }

    let amount = compute_melee_damage(&striker, config, rng);
    let request = DamageRequest {
        attacker,
        defender,
        amount,
        school: DamageSchool::Physical,
        source,
        now,
    };

    match apply_damage(world, policy, config, request) {
        Ok(report) => {
            let mut result = AttackResult::new(attacker, defender, AttackOutcome::Hit);
            result.damage = Some(report);
            Ok(result)
        }
        Err(DamageError::Denied(denied)) => Ok(AttackResult::new(
            attacker,
            defender,
            AttackOutcome::Denied {
                reason: denied.reason,
            },
        )),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::policy::StandardPolicy;
    use crate::env::{PcgRng, ScriptedRng};
    use crate::state::{CombatStats, Combatant, RoomId};

    struct Duel {
        world: World,
        ana: EntityId,
        duelist: EntityId,
    }

    fn duel(duelist_stats: CombatStats, ana_stats: CombatStats) -> Duel {
        let hall = RoomId::new("hall");
        let mut world = World::new();
        world.add_room(hall.clone(), true);
        let ana = world
            .spawn(Combatant::player("ana", hall.clone(), 100).with_stats(ana_stats))
            .unwrap();
        let duelist = world
            .spawn(Combatant::npc("duelist", hall, 100).with_stats(duelist_stats))
            .unwrap();
        Duel {
            world,
            ana,
            duelist,
        }
    }

    fn always_parry_and_riposte() -> CombatStats {
        CombatStats {
            attack_power: Some(10),
            dodge_pct: 0,
            parry_pct: 100,
            riposte_pct: 100,
        }
    }

    #[test]
    fn hit_routes_through_choke_point() {
        let mut d = duel(
            CombatStats::default(),
            CombatStats {
                attack_power: Some(10),
                ..CombatStats::default()
            },
        );
        // avoidance roll 50 (lands), variance raw 0 (x0.8)
        let mut rng = ScriptedRng::new([49, 0]);

        let result = resolve_attack(
            &mut d.world,
            &StandardPolicy,
            &CombatConfig::default(),
            d.ana,
            d.duelist,
            Timestamp(0),
            &mut rng,
        )
        .unwrap();

        assert!(result.is_hit());
        assert_eq!(result.dealt(), 8);
        assert_eq!(d.world.get(d.duelist).unwrap().hp.current, 92);
        assert_eq!(result.to_string(), format!("{} hits {} for 8.", d.ana, d.duelist));
    }

    #[test]
    fn dodge_deals_nothing() {
        let mut d = duel(
            CombatStats {
                dodge_pct: 100,
                ..CombatStats::default()
            },
            CombatStats::default(),
        );
        let result = resolve_attack(
            &mut d.world,
            &StandardPolicy,
            &CombatConfig::default(),
            d.ana,
            d.duelist,
            Timestamp(0),
            &mut ScriptedRng::d100([1]),
        )
        .unwrap();

        assert_eq!(result.outcome, AttackOutcome::Dodged);
        assert!(d.world.get(d.duelist).unwrap().hp.is_full());
    }

    #[test]
    fn riposte_never_chains() {
        // Both sides parry and riposte every time; only one counter may happen.
        let mut d = duel(always_parry_and_riposte(), always_parry_and_riposte());

        for seed in 0..32 {
            let mut rng = PcgRng::new(seed);
            let result = resolve_attack(
                &mut d.world,
                &StandardPolicy,
                &CombatConfig::default(),
                d.ana,
                d.duelist,
                Timestamp(seed),
                &mut rng,
            )
            .unwrap();

            assert_eq!(result.outcome, AttackOutcome::Parried);
            assert_eq!(result.riposte_count(), 1);
            assert_eq!(result.to_string().matches("ripostes").count(), 1);

            let riposte = result.riposte.as_deref().unwrap();
            assert_eq!(riposte.attacker, d.duelist);
            assert!(riposte.riposte.is_none());

            d.world.get_mut(d.ana).unwrap().hp.current = 100;
        }
    }

    #[test]
    fn failed_riposte_roll_yields_plain_parry() {
        let mut d = duel(
            CombatStats {
                parry_pct: 100,
                riposte_pct: 10,
                ..CombatStats::default()
            },
            CombatStats::default(),
        );
        let result = resolve_attack(
            &mut d.world,
            &StandardPolicy,
            &CombatConfig::default(),
            d.ana,
            d.duelist,
            Timestamp(0),
            &mut ScriptedRng::d100([50, 90]),
        )
        .unwrap();

        assert_eq!(result.outcome, AttackOutcome::Parried);
        assert_eq!(result.riposte_count(), 0);
        assert!(d.world.get(d.ana).unwrap().hp.is_full());
    }

    #[test]
    fn denied_attack_consumes_no_rolls() {
        let mut d = duel(CombatStats::default(), CombatStats::default());
        d.world.add_room(RoomId::new("road"), true);
        d.world.move_to(d.ana, RoomId::new("road")).unwrap();
        let before = d.world.clone();
        let mut rng = ScriptedRng::d100([50, 50]);

        let result = resolve_attack(
            &mut d.world,
            &StandardPolicy,
            &CombatConfig::default(),
            d.ana,
            d.duelist,
            Timestamp(0),
            &mut rng,
        )
        .unwrap();

        assert_eq!(
            result.outcome,
            AttackOutcome::Denied {
                reason: "target is not here".into()
            }
        );
        assert_eq!(rng.remaining(), 2);
        assert_eq!(d.world, before);
    }
}
