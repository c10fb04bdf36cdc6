//! Per-combatant effect container.
//!
//! The container is a uniform arena: one flat list of instances tagged with
//! their stacking group and applier. Stacking policy decides placement via
//! [`stacking::resolve`](super::stacking::resolve); the container only carries
//! the decision out.

use super::instance::{EffectInstance, EffectOrigin, InstanceId};
use super::modifiers::CombatModifiers;
use super::periodic::{self, PeriodicTick};
use super::spec::{EffectKind, EffectSpec, TagSet};
use super::stacking::{self, Placement};
use crate::error::EffectError;
use crate::state::Timestamp;

/// Result of a successful application.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// A new instance was created.
    Inserted(InstanceId),
    /// An existing instance was renewed in place.
    Refreshed(InstanceId),
    /// The bucket's previous occupant was superseded.
    Replaced {
        instance_id: InstanceId,
        replaced: String,
    },
    /// A stack was added (or the cap was already reached).
    Stacked { instance_id: InstanceId, stacks: u32 },
    /// An instantaneous cleanse ran; lists the removed effect ids.
    Cleansed { removed: Vec<String> },
}

impl ApplyOutcome {
    pub fn instance_id(&self) -> Option<InstanceId> {
        match self {
            Self::Inserted(id) | Self::Refreshed(id) => Some(*id),
            Self::Replaced { instance_id, .. } | Self::Stacked { instance_id, .. } => {
                Some(*instance_id)
            }
            Self::Cleansed { .. } => None,
        }
    }
}

/// Selection rule for a cleanse.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CleanseFilter {
    /// Instances must carry at least one of these tags.
    pub tags: TagSet,
    /// Instances carrying any of these tags are never removed.
    pub protected_tags: TagSet,
    pub max_to_remove: usize,
}

impl CleanseFilter {
    pub fn new(tags: TagSet, max_to_remove: usize) -> Self {
        Self {
            tags,
            protected_tags: TagSet::new(),
            max_to_remove,
        }
    }

    pub fn protecting(mut self, protected_tags: TagSet) -> Self {
        self.protected_tags = protected_tags;
        self
    }

    pub fn matches(&self, instance: &EffectInstance) -> bool {
        instance.has_any_tag(&self.tags) && !instance.has_any_tag(&self.protected_tags)
    }
}

/// Active effects owned by one combatant.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectContainer {
    instances: Vec<EffectInstance>,
    next_instance: u64,
    /// Periodic ticks settled by an eviction that the scheduler has not
    /// applied yet.
    #[cfg_attr(feature = "serde", serde(default))]
    owed: Vec<PeriodicTick>,
}

impl EffectContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `spec` at `now` according to its stacking policy.
    ///
    /// A malformed spec is rejected without touching the container.
    pub fn apply(
        &mut self,
        spec: &EffectSpec,
        origin: &EffectOrigin,
        now: Timestamp,
    ) -> Result<ApplyOutcome, EffectError> {
        spec.validate()?;
        self.purge_expired(now);

        if let EffectKind::Cleanse {
            tags,
            max_to_remove,
            protected_tags,
        } = &spec.kind
        {
            let filter = CleanseFilter {
                tags: tags.clone(),
                protected_tags: protected_tags.clone(),
                max_to_remove: *max_to_remove,
            };
            let removed = self
                .cleanse(&filter)
                .into_iter()
                .map(|instance| instance.effect_id)
                .collect();
            return Ok(ApplyOutcome::Cleansed { removed });
        }

        let decision = stacking::resolve(&self.instances, spec, origin.applier);

        let outcome = match decision.placement {
            Placement::Insert => {
                let instance = self.instantiate(spec, origin, now)?;
                let id = instance.instance_id;
                self.instances.push(instance);
                ApplyOutcome::Inserted(id)
            }
            Placement::Refresh(index) => {
                let slot = &mut self.instances[index];
                slot.refresh_from(spec, now);
                ApplyOutcome::Refreshed(slot.instance_id)
            }
            Placement::Replace(index) => {
                let instance = self.instantiate(spec, origin, now)?;
                let id = instance.instance_id;
                let previous = std::mem::replace(&mut self.instances[index], instance);
                ApplyOutcome::Replaced {
                    instance_id: id,
                    replaced: previous.effect_id,
                }
            }
            Placement::AddStack { index, max_stacks } => {
                let slot = &mut self.instances[index];
                slot.add_stack(spec, max_stacks, now);
                ApplyOutcome::Stacked {
                    instance_id: slot.instance_id,
                    stacks: slot.stacks,
                }
            }
        };

        for index in decision.evict.into_iter().rev() {
            self.instances.remove(index);
        }

        Ok(outcome)
    }

    fn instantiate(
        &mut self,
        spec: &EffectSpec,
        origin: &EffectOrigin,
        now: Timestamp,
    ) -> Result<EffectInstance, EffectError> {
        let id = InstanceId(self.next_instance);
        let instance = EffectInstance::create(id, spec, origin, now).ok_or_else(|| {
            EffectError::NotInstantiable {
                effect_id: spec.id.clone(),
            }
        })?;
        self.next_instance += 1;
        Ok(instance)
    }

    /// Removes every instance matching `predicate`. Returns the removed instances.
    pub fn remove_where(
        &mut self,
        mut predicate: impl FnMut(&EffectInstance) -> bool,
    ) -> Vec<EffectInstance> {
        let mut removed = Vec::new();
        self.instances.retain(|instance| {
            if predicate(instance) {
                removed.push(instance.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    /// Removes up to `filter.max_to_remove` matching instances, oldest first.
    pub fn cleanse(&mut self, filter: &CleanseFilter) -> Vec<EffectInstance> {
        let mut candidates: Vec<(Timestamp, InstanceId)> = self
            .instances
            .iter()
            .filter(|instance| filter.matches(instance))
            .map(|instance| (instance.applied_at, instance.instance_id))
            .collect();
        candidates.sort_unstable();
        candidates.truncate(filter.max_to_remove);

        if candidates.is_empty() {
            return Vec::new();
        }

        self.remove_where(|instance| {
            candidates
                .iter()
                .any(|(_, id)| *id == instance.instance_id)
        })
    }

    /// Aggregates modifiers of active instances, evicting expired ones.
    pub fn snapshot(&mut self, now: Timestamp) -> CombatModifiers {
        self.purge_expired(now);

        self.instances
            .iter()
            .fold(CombatModifiers::default(), |mut acc, instance| {
                let modifiers = instance.effective_modifiers();
                acc.damage_taken_pct += modifiers.damage_taken_pct;
                acc.damage_dealt_pct += modifiers.damage_dealt_pct;
                acc.absorb_total = acc.absorb_total.saturating_add(instance.absorb_remaining());
                acc.active_effects += 1;
                acc
            })
    }

    /// Evicts instances whose duration has elapsed. Returns them.
    ///
    /// Periodic ticks an evicted instance still owes up to its expiry are
    /// kept for the next [`collect_due`](Self::collect_due).
    pub fn purge_expired(&mut self, now: Timestamp) -> Vec<EffectInstance> {
        let mut removed = self.remove_where(|instance| !instance.is_active(now));
        self.owed
            .extend(removed.iter_mut().filter_map(|instance| periodic::settle(instance, now)));
        removed
    }

    pub(crate) fn take_owed(&mut self) -> Vec<PeriodicTick> {
        std::mem::take(&mut self.owed)
    }

    /// Drops every instance along with any owed periodic ticks.
    pub fn clear(&mut self) -> Vec<EffectInstance> {
        self.owed.clear();
        std::mem::take(&mut self.instances)
    }

    pub fn get(&self, id: InstanceId) -> Option<&EffectInstance> {
        self.instances.iter().find(|instance| instance.instance_id == id)
    }

    /// Instances with the given effect id, in insertion order.
    pub fn by_effect<'a>(&'a self, effect_id: &'a str) -> impl Iterator<Item = &'a EffectInstance> + 'a {
        self.instances
            .iter()
            .filter(move |instance| instance.effect_id == effect_id)
    }

    /// Instances still active at `now` (expired ones may linger until the
    /// next evaluation).
    pub fn active_at(&self, now: Timestamp) -> impl Iterator<Item = &EffectInstance> + '_ {
        self.instances
            .iter()
            .filter(move |instance| instance.is_active(now))
    }

    pub fn iter(&self) -> impl Iterator<Item = &EffectInstance> {
        self.instances.iter()
    }

    pub(crate) fn instances_mut(&mut self) -> &mut Vec<EffectInstance> {
        &mut self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::DamageSchool;
    use crate::effect::spec::{EffectModifiers, StackingPolicy, tags};
    use crate::state::EntityId;

    fn at(ms: u64) -> Timestamp {
        Timestamp(ms)
    }

    fn vulnerability(id: &str, pct: f64) -> EffectSpec {
        EffectSpec::new(id, 10_000, EffectKind::Debuff).with_modifiers(EffectModifiers {
            damage_taken_pct: pct,
            damage_dealt_pct: 0.0,
        })
    }

    #[test]
    fn refresh_is_idempotent_for_snapshot() {
        let mut fx = EffectContainer::new();
        let spec = vulnerability("expose", 0.2);
        let origin = EffectOrigin::new(EntityId(1));

        let first = fx.apply(&spec, &origin, at(0)).unwrap();
        let second = fx.apply(&spec, &origin, at(500)).unwrap();

        assert!(matches!(first, ApplyOutcome::Inserted(_)));
        assert_eq!(second, ApplyOutcome::Refreshed(first.instance_id().unwrap()));
        assert_eq!(fx.len(), 1);
        assert!((fx.snapshot(at(600)).damage_taken_pct - 0.2).abs() < 1e-9);
    }

    #[test]
    fn refresh_renews_duration() {
        let mut fx = EffectContainer::new();
        let spec = vulnerability("expose", 0.2);
        let origin = EffectOrigin::new(EntityId(1));

        fx.apply(&spec, &origin, at(0)).unwrap();
        fx.apply(&spec, &origin, at(9_000)).unwrap();

        let instance = fx.by_effect("expose").next().unwrap();
        assert_eq!(instance.expires_at, at(19_000));
        assert_eq!(instance.applied_at, at(0));
    }

    #[test]
    fn overwrite_rank_two_supersedes_rank_one() {
        let mut fx = EffectContainer::new();
        let origin = EffectOrigin::new(EntityId(1));
        let rank1 = vulnerability("sunder_1", 0.1)
            .with_group("sunder")
            .with_stacking(StackingPolicy::Overwrite);
        let rank2 = vulnerability("sunder_2", 0.3)
            .with_group("sunder")
            .with_stacking(StackingPolicy::Overwrite);

        fx.apply(&rank1, &origin, at(0)).unwrap();
        let outcome = fx.apply(&rank2, &origin, at(100)).unwrap();

        assert!(matches!(outcome, ApplyOutcome::Replaced { ref replaced, .. } if replaced == "sunder_1"));
        assert_eq!(fx.len(), 1);
        assert!((fx.snapshot(at(200)).damage_taken_pct - 0.3).abs() < 1e-9);
    }

    #[test]
    fn stack_policy_caps_at_max_stacks() {
        let mut fx = EffectContainer::new();
        let origin = EffectOrigin::new(EntityId(1));
        let spec = vulnerability("shred", 0.05).with_stacking(StackingPolicy::Stack { max_stacks: 3 });

        let mut last = None;
        for step in 0..5 {
            last = Some(fx.apply(&spec, &origin, at(step * 100)).unwrap());
        }

        assert!(matches!(last, Some(ApplyOutcome::Stacked { stacks: 3, .. })));
        assert_eq!(fx.len(), 1);
        assert!((fx.snapshot(at(500)).damage_taken_pct - 0.15).abs() < 1e-9);
    }

    #[test]
    fn versioned_dot_keeps_one_slot_per_applier() {
        let mut fx = EffectContainer::new();
        let dot = EffectSpec::new(
            "corruption",
            12_000,
            EffectKind::Dot {
                per_tick: 4,
                interval_ms: 3_000,
                school: DamageSchool::Shadow,
            },
        )
        .with_stacking(StackingPolicy::VersionedByApplier);

        let alice = EffectOrigin::new(EntityId(1));
        let bob = EffectOrigin::new(EntityId(2));

        let a = fx.apply(&dot, &alice, at(0)).unwrap();
        let b = fx.apply(&dot, &bob, at(1_000)).unwrap();
        assert_eq!(fx.by_effect("corruption").count(), 2);
        assert_ne!(a.instance_id(), b.instance_id());

        let again = fx.apply(&dot, &alice, at(5_000)).unwrap();
        assert_eq!(again, ApplyOutcome::Refreshed(a.instance_id().unwrap()));

        let bob_slot = fx.get(b.instance_id().unwrap()).unwrap();
        assert_eq!(bob_slot.expires_at, at(13_000));
        let alice_slot = fx.get(a.instance_id().unwrap()).unwrap();
        assert_eq!(alice_slot.expires_at, at(17_000));
    }

    #[test]
    fn malformed_spec_is_a_no_op() {
        let mut fx = EffectContainer::new();
        let origin = EffectOrigin::new(EntityId(1));
        fx.apply(&vulnerability("expose", 0.2), &origin, at(0)).unwrap();

        let bad = EffectSpec::new("broken", 0, EffectKind::Buff);
        assert!(fx.apply(&bad, &origin, at(10)).is_err());
        assert_eq!(fx.len(), 1);
    }

    #[test]
    fn cleanse_respects_protected_tags_and_age() {
        let mut fx = EffectContainer::new();
        let origin = EffectOrigin::new(EntityId(9));

        let curse = vulnerability("doom", 0.5).with_tags(["magic", "no_cleanse"]);
        let hex = vulnerability("hex", 0.1).with_tags(["magic"]);
        let slow = vulnerability("slow", 0.0).with_tags(["magic"]);

        fx.apply(&curse, &origin, at(0)).unwrap();
        fx.apply(&hex, &origin, at(10)).unwrap();
        fx.apply(&slow, &origin, at(20)).unwrap();

        let filter = CleanseFilter::new(tags(["magic"]), 1).protecting(tags(["no_cleanse"]));
        let removed = fx.cleanse(&filter);

        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].effect_id, "hex");
        assert!(fx.by_effect("doom").next().is_some());
        assert!(fx.by_effect("slow").next().is_some());
    }

    #[test]
    fn cleanse_kind_runs_instantly() {
        let mut fx = EffectContainer::new();
        let origin = EffectOrigin::new(EntityId(9));
        fx.apply(&vulnerability("hex", 0.1).with_tags(["magic"]), &origin, at(0))
            .unwrap();

        let purify = EffectSpec::new(
            "purify",
            0,
            EffectKind::Cleanse {
                tags: tags(["magic"]),
                max_to_remove: 5,
                protected_tags: TagSet::new(),
            },
        );
        let outcome = fx.apply(&purify, &origin, at(5)).unwrap();

        assert_eq!(
            outcome,
            ApplyOutcome::Cleansed {
                removed: vec!["hex".to_owned()]
            }
        );
        assert!(fx.is_empty());
    }

    #[test]
    fn snapshot_evicts_expired_instances() {
        let mut fx = EffectContainer::new();
        let origin = EffectOrigin::new(EntityId(1));
        fx.apply(&vulnerability("expose", 0.2), &origin, at(0)).unwrap();

        let summary = fx.snapshot(at(10_000));
        assert_eq!(summary.active_effects, 0);
        assert_eq!(summary.damage_taken_pct, 0.0);
        assert!(fx.is_empty());
    }

    #[test]
    fn category_tag_is_implicit() {
        let mut fx = EffectContainer::new();
        let origin = EffectOrigin::new(EntityId(1));
        fx.apply(&vulnerability("expose", 0.2), &origin, at(0)).unwrap();

        let removed = fx.cleanse(&CleanseFilter::new(tags(["debuff"]), 10));
        assert_eq!(removed.len(), 1);
    }
}
