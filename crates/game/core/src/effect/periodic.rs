//! Damage- and heal-over-time scheduling.
//!
//! The container only computes what is due; applying the amounts is the
//! engine's job so that periodic damage goes through the same choke point as
//! direct hits.

use super::instance::{EffectInstance, EffectOrigin, InstanceId, InstanceState};
use super::store::EffectContainer;
use crate::combat::DamageSchool;
use crate::state::Timestamp;

/// What a periodic tick does to its holder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PeriodicPayload {
    Damage { school: DamageSchool },
    Heal,
}

/// One due periodic application, already multiplied by elapsed intervals
/// and stack count.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeriodicTick {
    pub instance_id: InstanceId,
    pub effect_id: String,
    pub origin: EffectOrigin,
    pub payload: PeriodicPayload,
    pub amount: u32,
    /// Number of intervals folded into `amount`.
    pub ticks: u32,
}

/// Everything the scheduler found when evaluating a container at `now`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DueTicks {
    pub ticks: Vec<PeriodicTick>,
    /// Instances evicted because their duration elapsed.
    pub expired: Vec<EffectInstance>,
}

/// Number of whole intervals due between `next_tick_at` and `limit`, inclusive
/// of a tick landing exactly on `limit`.
fn intervals_due(next_tick_at: Timestamp, limit: Timestamp, interval_ms: u64) -> u64 {
    if next_tick_at > limit || interval_ms == 0 {
        return 0;
    }
    limit.since(next_tick_at) / interval_ms + 1
}

/// Advances one instance's schedule up to `now`, clamped to its expiry.
///
/// Returns `None` for non-periodic instances or when nothing is due.
pub(crate) fn settle(instance: &mut EffectInstance, now: Timestamp) -> Option<PeriodicTick> {
    let limit = now.min(instance.expires_at);
    let stacks = instance.stacks.max(1);

    let (per_tick, interval_ms, next_tick_at, payload) = match &mut instance.state {
        InstanceState::Dot {
            per_tick,
            interval_ms,
            school,
            next_tick_at,
        } => (
            *per_tick,
            *interval_ms,
            next_tick_at,
            PeriodicPayload::Damage { school: *school },
        ),
        InstanceState::Hot {
            per_tick,
            interval_ms,
            next_tick_at,
        } => (*per_tick, *interval_ms, next_tick_at, PeriodicPayload::Heal),
        _ => return None,
    };

    let intervals = intervals_due(*next_tick_at, limit, interval_ms);
    if intervals == 0 {
        return None;
    }

    *next_tick_at = *next_tick_at + intervals * interval_ms;

    let ticks = u32::try_from(intervals).unwrap_or(u32::MAX);
    Some(PeriodicTick {
        instance_id: instance.instance_id,
        effect_id: instance.effect_id.clone(),
        origin: instance.origin.clone(),
        payload,
        amount: per_tick.saturating_mul(stacks).saturating_mul(ticks),
        ticks,
    })
}

impl EffectContainer {
    /// Advances every periodic schedule to `now` and evicts expired instances.
    ///
    /// Ticks never run past an instance's expiry; a tick scheduled exactly at
    /// expiry still fires. Ticks owed by instances evicted earlier (by an
    /// apply or a snapshot) are returned first.
    pub fn collect_due(&mut self, now: Timestamp) -> DueTicks {
        let mut due = self.take_owed();
        due.extend(self.instances_mut().iter_mut().filter_map(|i| settle(i, now)));

        DueTicks {
            ticks: due,
            expired: self.purge_expired(now),
        }
    }
}
