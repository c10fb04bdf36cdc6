//! Shield absorption.
//!
//! Eligibility by damage school is decided before ordering: a shield that
//! cannot absorb the incoming school is never consulted, whatever its priority.

use std::cmp::Reverse;

use super::instance::{EffectInstance, InstanceId, InstanceState};
use super::store::EffectContainer;
use crate::combat::DamageSchool;
use crate::state::Timestamp;

/// Result of running incoming damage through a combatant's shields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AbsorbOutcome {
    /// Damage soaked by shields.
    pub absorbed: u32,
    /// Damage left over for hp.
    pub residual: u32,
    /// Shields that reached zero and were evicted in this pass.
    pub depleted: Vec<EffectInstance>,
}

impl EffectContainer {
    /// Consumes `incoming` damage of `school` from eligible active shields.
    ///
    /// Eligible shields are ordered by priority (high first), then age
    /// (oldest first). Every shield depleted in this pass is evicted.
    pub fn consume_absorb(
        &mut self,
        incoming: u32,
        school: DamageSchool,
        now: Timestamp,
    ) -> AbsorbOutcome {
        if incoming == 0 {
            return AbsorbOutcome::default();
        }

        let mut order: Vec<(Reverse<i32>, Timestamp, InstanceId)> = self
            .active_at(now)
            .filter(|instance| match &instance.state {
                InstanceState::Shield { schools, .. } => schools.admits(school),
                _ => false,
            })
            .map(|instance| {
                (
                    Reverse(instance.priority),
                    instance.applied_at,
                    instance.instance_id,
                )
            })
            .collect();
        order.sort_unstable();

        let mut remaining = incoming;
        let mut emptied = Vec::new();

        for (_, _, id) in order {
            if remaining == 0 {
                break;
            }

            let Some(instance) = self
                .instances_mut()
                .iter_mut()
                .find(|instance| instance.instance_id == id)
            else {
                continue;
            };

            if let InstanceState::Shield {
                remaining: capacity,
                ..
            } = &mut instance.state
            {
                let taken = (*capacity).min(remaining);
                *capacity -= taken;
                remaining -= taken;
                if *capacity == 0 {
                    emptied.push(id);
                }
            }
        }

        let depleted = if emptied.is_empty() {
            Vec::new()
        } else {
            self.remove_where(|instance| emptied.contains(&instance.instance_id))
        };

        AbsorbOutcome {
            absorbed: incoming - remaining,
            residual: remaining,
            depleted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::SchoolSet;
    use crate::effect::instance::EffectOrigin;
    use crate::effect::spec::{EffectKind, EffectSpec};
    use crate::state::EntityId;

    fn shield(id: &str, capacity: u32, priority: i32, schools: SchoolSet) -> EffectSpec {
        EffectSpec::new(id, 30_000, EffectKind::Shield { capacity, schools }).with_priority(priority)
    }

    fn container_with(shields: &[EffectSpec]) -> EffectContainer {
        let mut fx = EffectContainer::new();
        let origin = EffectOrigin::new(EntityId(1));
        for (step, spec) in shields.iter().enumerate() {
            fx.apply(spec, &origin, Timestamp(step as u64)).unwrap();
        }
        fx
    }

    fn remaining_of(fx: &EffectContainer, effect_id: &str) -> Option<u32> {
        fx.by_effect(effect_id).next().map(EffectInstance::absorb_remaining)
    }

    #[test]
    fn higher_priority_drains_first_and_is_evicted() {
        let mut fx = container_with(&[
            shield("big_low", 7, 0, SchoolSet::empty()),
            shield("small_high", 5, 10, SchoolSet::empty()),
        ]);

        let outcome = fx.consume_absorb(6, DamageSchool::Physical, Timestamp(10));

        assert_eq!(outcome.absorbed, 6);
        assert_eq!(outcome.residual, 0);
        assert_eq!(outcome.depleted.len(), 1);
        assert_eq!(outcome.depleted[0].effect_id, "small_high");
        assert_eq!(remaining_of(&fx, "small_high"), None);
        assert_eq!(remaining_of(&fx, "big_low"), Some(6));
    }

    #[test]
    fn school_filter_runs_before_priority() {
        let mut fx = container_with(&[
            shield("fire_ward", 50, 10, SchoolSet::FIRE),
            shield("stoneskin", 20, 0, SchoolSet::PHYSICAL),
        ]);

        let outcome = fx.consume_absorb(12, DamageSchool::Physical, Timestamp(10));

        assert_eq!(outcome.absorbed, 12);
        assert_eq!(remaining_of(&fx, "fire_ward"), Some(50));
        assert_eq!(remaining_of(&fx, "stoneskin"), Some(8));
    }

    #[test]
    fn ineligible_shields_leave_full_residual() {
        let mut fx = container_with(&[shield("fire_ward", 50, 10, SchoolSet::FIRE)]);

        let outcome = fx.consume_absorb(9, DamageSchool::Physical, Timestamp(10));

        assert_eq!(outcome.absorbed, 0);
        assert_eq!(outcome.residual, 9);
        assert_eq!(remaining_of(&fx, "fire_ward"), Some(50));
    }

    #[test]
    fn equal_priority_prefers_oldest() {
        let mut fx = container_with(&[
            shield("old", 4, 1, SchoolSet::empty()),
            shield("new", 4, 1, SchoolSet::empty()),
        ]);

        fx.consume_absorb(3, DamageSchool::Arcane, Timestamp(10));

        assert_eq!(remaining_of(&fx, "old"), Some(1));
        assert_eq!(remaining_of(&fx, "new"), Some(4));
    }

    #[test]
    fn multiple_shields_depleted_in_one_pass() {
        let mut fx = container_with(&[
            shield("a", 3, 5, SchoolSet::empty()),
            shield("b", 2, -4, SchoolSet::empty()),
        ]);

        let outcome = fx.consume_absorb(10, DamageSchool::Frost, Timestamp(10));

        assert_eq!(outcome.absorbed, 5);
        assert_eq!(outcome.residual, 5);
        assert_eq!(outcome.depleted.len(), 2);
        assert!(fx.is_empty());
    }

    #[test]
    fn zero_damage_is_a_no_op() {
        let mut fx = container_with(&[shield("a", 3, 5, SchoolSet::empty())]);
        assert_eq!(
            fx.consume_absorb(0, DamageSchool::Physical, Timestamp(10)),
            AbsorbOutcome::default()
        );
        assert_eq!(remaining_of(&fx, "a"), Some(3));
    }

    #[test]
    fn expired_shields_are_ignored() {
        let mut fx = container_with(&[shield("a", 3, 5, SchoolSet::empty())]);
        let outcome = fx.consume_absorb(2, DamageSchool::Physical, Timestamp(40_000));
        assert_eq!(outcome.residual, 2);
    }
}
