//! Spell casting.
//!
//! Every refusal happens before anything is spent: the catalog lookup, target
//! checks, the policy gate (any spell that is harmful or deals damage), effect
//! validation, cooldown and mana are all checked first. Only then is mana
//! debited, the cooldown started and the payload delivered. If the damage
//! step still refuses, the spend and its journal entries are rolled back.

use crate::effect::{ApplyOutcome, EffectOrigin};
use crate::engine::CombatEvent;
use crate::engine::effects::apply_effect;
use crate::env::{CombatEnv, CombatRng};
use crate::error::{CombatError, EffectError, ErrorSeverity};
use crate::state::{EntityId, Timestamp, World};

use super::damage::{
    DamageError, DamageReport, DamageRequest, DamageSource, apply_damage, roll_variance,
};
use super::heal::{HealReport, apply_heal};
use super::policy::{DamageContext, PolicyDenied};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CastError {
    #[error("unknown spell '{0}'")]
    UnknownSpell(String),

    #[error("no combatant {0}")]
    UnknownEntity(EntityId),

    #[error("you are dead")]
    CasterDead,

    #[error("{0} is dead")]
    TargetDead(EntityId),

    #[error("{0} is not here")]
    TargetNotHere(EntityId),

    #[error("{0}")]
    Denied(#[from] PolicyDenied),

    #[error("'{spell_id}' is on cooldown for {remaining_ms}ms")]
    OnCooldown { spell_id: String, remaining_ms: u64 },

    #[error("not enough mana ({available}/{required})")]
    InsufficientMana { required: u32, available: u32 },

    #[error("spell carries an invalid effect: {0}")]
    InvalidEffect(EffectError),
}

impl CombatError for CastError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownSpell(_) | Self::UnknownEntity(_) | Self::InvalidEffect(_) => {
                ErrorSeverity::Validation
            }
            _ => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownSpell(_) => "cast.unknown_spell",
            Self::UnknownEntity(_) => "cast.unknown_entity",
            Self::CasterDead => "cast.caster_dead",
            Self::TargetDead(_) => "cast.target_dead",
            Self::TargetNotHere(_) => "cast.target_not_here",
            Self::Denied(_) => "cast.denied",
            Self::OnCooldown { .. } => "cast.on_cooldown",
            Self::InsufficientMana { .. } => "cast.insufficient_mana",
            Self::InvalidEffect(_) => "cast.invalid_effect",
        }
    }
}

/// What a successful cast did.
#[derive(Clone, Debug, PartialEq)]
pub struct CastReport {
    pub caster: EntityId,
    pub target: EntityId,
    pub spell_id: String,
    pub mana_spent: u32,
    pub damage: Option<DamageReport>,
    pub heal: Option<HealReport>,
    /// `None` when the spell has no status effect or the target died first.
    pub effect: Option<ApplyOutcome>,
}

/// Casts `spell_id` from `caster` at `target`.
///
/// # Errors
///
/// Any [`CastError`]. A refused cast leaves mana, cooldowns and hp untouched.
pub fn cast(
    world: &mut World,
    env: &CombatEnv<'_>,
    caster: EntityId,
    target: EntityId,
    spell_id: &str,
    now: Timestamp,
    rng: &mut dyn CombatRng,
) -> Result<CastReport, CastError> {
    let spell = env
        .catalog
        .spell(spell_id)
        .ok_or_else(|| CastError::UnknownSpell(spell_id.to_owned()))?;

    let source = world.get(caster).ok_or(CastError::UnknownEntity(caster))?;
    let victim = world.get(target).ok_or(CastError::UnknownEntity(target))?;

    if !source.alive {
        return Err(CastError::CasterDead);
    }

    if spell.is_offensive() {
        let damage_source = DamageSource::Spell {
            spell_id: spell.id.clone(),
        };
        let ctx = DamageContext {
            room: world.room(&victim.room),
            source: &damage_source,
            now,
        };
        env.policy
            .can_damage(Some(source), victim, &ctx)
            .into_result()?;
    } else {
        if !victim.alive {
            return Err(CastError::TargetDead(target));
        }
        if victim.room != source.room {
            return Err(CastError::TargetNotHere(target));
        }
    }

    if let Some(effect) = &spell.status_effect {
        effect.validate().map_err(CastError::InvalidEffect)?;
    }

    if let Some(remaining_ms) = source.cooldown_remaining(&spell.id, now) {
        return Err(CastError::OnCooldown {
            spell_id: spell.id.clone(),
            remaining_ms,
        });
    }

    if source.mana.current < spell.mana_cost {
        return Err(CastError::InsufficientMana {
            required: spell.mana_cost,
            available: source.mana.current,
        });
    }

    // Checks passed: spend.
    let journal_mark = world.journal_len();
    let mut spent = Spend::default();
    if let Some(source) = world.get_mut(caster) {
        spent.mana = source.mana.debit(spell.mana_cost);
        if spell.cooldown_ms > 0 {
            spent.started_cooldown = true;
            spent.previous_cooldown = source
                .cooldowns
                .insert(spell.id.clone(), now + spell.cooldown_ms);
        }
    }

    tracing::debug!(
        target: "mud::cast",
        caster = %caster,
        target = %target,
        spell = %spell.id,
        mana = spell.mana_cost,
        "spell cast"
    );
    world.record_event(CombatEvent::SpellCast {
        caster,
        target,
        spell_id: spell.id.clone(),
    });

    let damage = if spell.damage > 0 {
        let request = DamageRequest {
            attacker: caster,
            defender: target,
            amount: roll_variance(spell.damage, env.config, rng),
            school: spell.school,
            source: DamageSource::Spell {
                spell_id: spell.id.clone(),
            },
            now,
        };
        match apply_damage(world, env.policy, env.config, request) {
            Ok(report) => Some(report),
            Err(err) => {
                spent.refund(world, caster, &spell.id, journal_mark);
                return Err(match err {
                    DamageError::Denied(denied) => denied.into(),
                    DamageError::UnknownEntity(id) => CastError::UnknownEntity(id),
                });
            }
        }
    } else {
        None
    };

    let heal = if spell.heal > 0 {
        match apply_heal(world, env.config, caster, target, spell.heal, now) {
            Ok(report) => Some(report),
            Err(err) => {
                tracing::warn!(
                    target: "mud::cast",
                    caster = %caster,
                    target = %target,
                    spell = %spell.id,
                    error = %err,
                    "spell heal not applied"
                );
                None
            }
        }
    } else {
        None
    };

    let effect = match &spell.status_effect {
        Some(spec) => {
            let origin = EffectOrigin::from_spell(caster, spell.id.clone());
            match apply_effect(world, target, spec, &origin, now) {
                Ok(outcome) => Some(outcome),
                Err(EffectError::TargetDead(_)) => None,
                Err(err) => return Err(CastError::InvalidEffect(err)),
            }
        }
        None => None,
    };

    Ok(CastReport {
        caster,
        target,
        spell_id: spell.id.clone(),
        mana_spent: spell.mana_cost,
        damage,
        heal,
        effect,
    })
}

/// What a cast spent, so a late refusal can give it back.
#[derive(Default)]
struct Spend {
    mana: u32,
    started_cooldown: bool,
    previous_cooldown: Option<Timestamp>,
}

impl Spend {
    fn refund(self, world: &mut World, caster: EntityId, spell_id: &str, journal_mark: usize) {
        if let Some(source) = world.get_mut(caster) {
            source.mana.credit(self.mana);
            if self.started_cooldown {
                match self.previous_cooldown {
                    Some(ready_at) => {
                        source.cooldowns.insert(spell_id.to_owned(), ready_at);
                    }
                    None => {
                        source.cooldowns.remove(spell_id);
                    }
                }
            }
        }
        world.rewind_journal(journal_mark);
    }
}
