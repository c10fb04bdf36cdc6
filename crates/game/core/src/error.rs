//! Common error infrastructure for mud-core.
//!
//! Shared classification types live here together with the errors that cross
//! module boundaries (effect validation, tick processing). Errors tied to a
//! single operation (`PolicyDenied`, `CastError`) are defined next to it.
//!
//! None of these errors ever unwinds into the tick loop: every fallible
//! operation returns them as values.

use crate::state::{EntityId, Timestamp};

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: the same request may succeed later (cooldown, range)
/// - **Validation**: malformed input, rejected without retry
/// - **Internal**: unexpected state inconsistency worth investigating
/// - **Fatal**: world state can no longer be trusted
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Examples: spell on cooldown, not enough mana, policy denial.
    Recoverable,

    /// Examples: effect spec without id, zero duration.
    Validation,

    /// Examples: a tick hook failed on one entity.
    Internal,

    /// Examples: a panic while evaluating an entity.
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Contextual information attached to errors for diagnostics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorContext {
    /// Combatant being processed when the error occurred.
    pub entity: Option<EntityId>,

    /// Effect being processed, if any.
    pub effect_id: Option<String>,

    /// World time of the failure.
    pub at: Timestamp,
}

impl ErrorContext {
    pub const fn new(at: Timestamp) -> Self {
        Self {
            entity: None,
            effect_id: None,
            at,
        }
    }

    #[must_use]
    pub const fn with_entity(mut self, entity: EntityId) -> Self {
        self.entity = Some(entity);
        self
    }

    #[must_use]
    pub fn with_effect(mut self, effect_id: impl Into<String>) -> Self {
        self.effect_id = Some(effect_id.into());
        self
    }
}

/// Common trait for all mud-core errors.
///
/// Provides a uniform classification interface so the runtime can pick log
/// levels and recovery strategies without matching on concrete types.
pub trait CombatError: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    fn context(&self) -> Option<&ErrorContext> {
        None
    }

    /// Stable identifier for metrics and tests.
    fn error_code(&self) -> &'static str;
}

/// A malformed effect spec or an application that cannot land.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EffectError {
    #[error("effect spec is missing an id")]
    MissingId,

    #[error("effect '{effect_id}' has a non-positive duration")]
    NonPositiveDuration { effect_id: String },

    #[error("periodic effect '{effect_id}' has a zero tick interval")]
    ZeroInterval { effect_id: String },

    #[error("effect '{effect_id}' declares invalid max stacks {max_stacks}")]
    InvalidMaxStacks { effect_id: String, max_stacks: u32 },

    #[error("cleanse effect '{effect_id}' selects no tags")]
    EmptyCleanse { effect_id: String },

    #[error("effect '{effect_id}' cannot be instantiated")]
    NotInstantiable { effect_id: String },

    #[error("no combatant {0}")]
    UnknownEntity(EntityId),

    #[error("combatant {0} is dead")]
    TargetDead(EntityId),
}

impl CombatError for EffectError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownEntity(_) | Self::TargetDead(_) => ErrorSeverity::Recoverable,
            _ => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingId => "effect.missing_id",
            Self::NonPositiveDuration { .. } => "effect.non_positive_duration",
            Self::ZeroInterval { .. } => "effect.zero_interval",
            Self::InvalidMaxStacks { .. } => "effect.invalid_max_stacks",
            Self::EmptyCleanse { .. } => "effect.empty_cleanse",
            Self::NotInstantiable { .. } => "effect.not_instantiable",
            Self::UnknownEntity(_) => "effect.unknown_entity",
            Self::TargetDead(_) => "effect.target_dead",
        }
    }
}

/// Failure while evaluating one entity during a tick.
///
/// Always isolated to that entity; the rest of the tick proceeds.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TickProcessingError {
    #[error("entity {entity} vanished during tick")]
    UnknownEntity {
        entity: EntityId,
        context: ErrorContext,
    },

    #[error("hook '{hook}' failed on {entity}: {message}")]
    Hook {
        entity: EntityId,
        hook: &'static str,
        message: String,
        context: ErrorContext,
    },

    #[error("panic while processing {entity}: {message}")]
    Panicked {
        entity: EntityId,
        message: String,
        context: ErrorContext,
    },
}

impl TickProcessingError {
    pub fn unknown_entity(entity: EntityId, at: Timestamp) -> Self {
        Self::UnknownEntity {
            entity,
            context: ErrorContext::new(at).with_entity(entity),
        }
    }

    pub fn hook(
        entity: EntityId,
        hook: &'static str,
        message: impl Into<String>,
        at: Timestamp,
    ) -> Self {
        Self::Hook {
            entity,
            hook,
            message: message.into(),
            context: ErrorContext::new(at).with_entity(entity),
        }
    }

    pub fn panicked(entity: EntityId, message: impl Into<String>, at: Timestamp) -> Self {
        Self::Panicked {
            entity,
            message: message.into(),
            context: ErrorContext::new(at).with_entity(entity),
        }
    }

    pub fn entity(&self) -> EntityId {
        match self {
            Self::UnknownEntity { entity, .. }
            | Self::Hook { entity, .. }
            | Self::Panicked { entity, .. } => *entity,
        }
    }
}

impl CombatError for TickProcessingError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownEntity { .. } | Self::Hook { .. } => ErrorSeverity::Internal,
            Self::Panicked { .. } => ErrorSeverity::Fatal,
        }
    }

    fn context(&self) -> Option<&ErrorContext> {
        match self {
            Self::UnknownEntity { context, .. }
            | Self::Hook { context, .. }
            | Self::Panicked { context, .. } => Some(context),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownEntity { .. } => "tick.unknown_entity",
            Self::Hook { .. } => "tick.hook_failed",
            Self::Panicked { .. } => "tick.panicked",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_not_recoverable() {
        let err = EffectError::MissingId;
        assert_eq!(err.severity(), ErrorSeverity::Validation);
        assert!(!err.severity().is_recoverable());
    }

    #[test]
    fn tick_errors_carry_entity_context() {
        let err = TickProcessingError::panicked(EntityId(3), "boom", Timestamp(40));
        assert_eq!(err.entity(), EntityId(3));
        assert_eq!(err.context().and_then(|ctx| ctx.entity), Some(EntityId(3)));
        assert!(err.severity().is_internal());
    }
}
