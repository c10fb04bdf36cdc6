//! Stacking policy resolution.
//!
//! Resolution is a pure function over a container's instance list: it never
//! mutates, it only decides where an incoming spec lands.

use super::instance::EffectInstance;
use super::spec::{EffectSpec, StackingPolicy};
use crate::state::EntityId;

/// Where an incoming application lands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// No slot exists for this application; create a new instance.
    Insert,
    /// Renew the instance at this index in place.
    Refresh(usize),
    /// Replace the instance at this index with a fresh one.
    Replace(usize),
    /// Add a stack to the instance at this index.
    AddStack { index: usize, max_stacks: u32 },
}

/// Placement plus any extra bucket members that must go to keep the
/// one-instance-per-slot invariant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StackingDecision {
    pub placement: Placement,
    /// Indices to evict, in ascending order. Never contains the placement index.
    pub evict: Vec<usize>,
}

/// Decides how `spec`, applied by `applier`, merges into `instances`.
///
/// Expects expired instances to have been evicted already.
pub fn resolve(instances: &[EffectInstance], spec: &EffectSpec, applier: EntityId) -> StackingDecision {
    let group = spec.group_key();
    let bucket: Vec<usize> = instances
        .iter()
        .enumerate()
        .filter(|(_, instance)| instance.group == group)
        .map(|(index, _)| index)
        .collect();

    if let StackingPolicy::VersionedByApplier = spec.stacking {
        let slot = bucket
            .iter()
            .copied()
            .find(|&index| instances[index].applier() == applier);

        let placement = match slot {
            Some(index) if instances[index].effect_id == spec.id => Placement::Refresh(index),
            Some(index) => Placement::Replace(index),
            None => Placement::Insert,
        };

        // Slots of other appliers coexist; only a duplicate for this applier
        // (possible after a policy change in content) is dropped.
        let evict = bucket
            .iter()
            .copied()
            .filter(|&index| Some(index) != slot && instances[index].applier() == applier)
            .collect();

        return StackingDecision { placement, evict };
    }

    let Some(&first) = bucket.first() else {
        return StackingDecision {
            placement: Placement::Insert,
            evict: Vec::new(),
        };
    };

    // Prefer the same-id instance as the slot when the bucket holds several.
    let slot = bucket
        .iter()
        .copied()
        .find(|&index| instances[index].effect_id == spec.id)
        .unwrap_or(first);
    let same_id = instances[slot].effect_id == spec.id;

    let placement = match spec.stacking {
        StackingPolicy::Refresh if same_id => Placement::Refresh(slot),
        StackingPolicy::Stack { max_stacks } if same_id => Placement::AddStack {
            index: slot,
            max_stacks,
        },
        _ => Placement::Replace(slot),
    };

    let evict = bucket.into_iter().filter(|&index| index != slot).collect();

    StackingDecision { placement, evict }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::instance::{EffectOrigin, InstanceId};
    use crate::effect::spec::EffectKind;
    use crate::state::Timestamp;

    fn instance(id: u64, spec: &EffectSpec, applier: u32) -> EffectInstance {
        EffectInstance::create(
            InstanceId(id),
            spec,
            &EffectOrigin::new(EntityId(applier)),
            Timestamp::ZERO,
        )
        .expect("non-instant spec")
    }

    #[test]
    fn empty_bucket_inserts() {
        let spec = EffectSpec::new("ward", 1_000, EffectKind::Buff);
        let decision = resolve(&[], &spec, EntityId(1));
        assert_eq!(decision.placement, Placement::Insert);
        assert!(decision.evict.is_empty());
    }

    #[test]
    fn refresh_targets_same_id() {
        let spec = EffectSpec::new("ward", 1_000, EffectKind::Buff);
        let existing = [instance(1, &spec, 1)];
        assert_eq!(
            resolve(&existing, &spec, EntityId(2)).placement,
            Placement::Refresh(0)
        );
    }

    #[test]
    fn overwrite_replaces_other_rank_in_group() {
        let rank1 = EffectSpec::new("armor_1", 1_000, EffectKind::Buff)
            .with_group("armor")
            .with_stacking(StackingPolicy::Overwrite);
        let rank2 = EffectSpec::new("armor_2", 1_000, EffectKind::Buff)
            .with_group("armor")
            .with_stacking(StackingPolicy::Overwrite);
        let other = EffectSpec::new("haste", 1_000, EffectKind::Buff);

        let existing = [instance(1, &other, 1), instance(2, &rank1, 1)];
        let decision = resolve(&existing, &rank2, EntityId(1));
        assert_eq!(decision.placement, Placement::Replace(1));
        assert!(decision.evict.is_empty());
    }

    #[test]
    fn versioned_slots_are_per_applier() {
        let dot = EffectSpec::new(
            "rot",
            6_000,
            EffectKind::Dot {
                per_tick: 2,
                interval_ms: 1_000,
                school: crate::combat::DamageSchool::Shadow,
            },
        )
        .with_stacking(StackingPolicy::VersionedByApplier);

        let existing = [instance(1, &dot, 7)];
        assert_eq!(
            resolve(&existing, &dot, EntityId(7)).placement,
            Placement::Refresh(0)
        );
        assert_eq!(
            resolve(&existing, &dot, EntityId(8)).placement,
            Placement::Insert
        );
    }

    #[test]
    fn non_versioned_policy_collapses_crowded_bucket() {
        let versioned = EffectSpec::new("mark", 1_000, EffectKind::Debuff)
            .with_stacking(StackingPolicy::VersionedByApplier);
        let existing = [instance(1, &versioned, 1), instance(2, &versioned, 2)];

        let refresh = EffectSpec::new("mark", 1_000, EffectKind::Debuff);
        let decision = resolve(&existing, &refresh, EntityId(3));
        assert_eq!(decision.placement, Placement::Refresh(0));
        assert_eq!(decision.evict, vec![1]);
    }
}
