//! Status-effect and combat-resolution rules for a text MUD.
//!
//! `mud-core` owns the canonical combat rules (effects, damage, threat, ticks)
//! over an in-memory [`World`]. It performs no I/O and owns no clock: callers
//! pass the current [`Timestamp`] and an injectable [`CombatRng`]. All
//! mutation flows through the functions re-exported here or through
//! [`engine::CombatEngine`]; the runtime crate drives them on a timer.
pub mod combat;
pub mod config;
pub mod effect;
pub mod engine;
pub mod env;
pub mod error;
pub mod state;
pub mod threat;

pub use combat::{
    AllowAll, AttackOutcome, AttackResult, CastError, CastReport, DamageContext, DamageError,
    DamagePolicy, DamageReport, DamageRequest, DamageSchool, DamageSource, HealError, HealReport,
    PolicyDecision, PolicyDenied, SchoolSet, StandardPolicy,
};
pub use config::CombatConfig;
pub use effect::{
    AbsorbOutcome, ApplyOutcome, CleanseFilter, CombatModifiers, EffectContainer, EffectInstance,
    EffectKind, EffectModifiers, EffectOrigin, EffectSpec, StackingPolicy, TagSet,
};
pub use engine::{
    CombatEngine, CombatEvent, NpcRetaliationHook, RemovalReason, TickHook, TickReport,
    TickSummary, default_hooks,
};
pub use env::{CombatEnv, CombatRng, PcgRng, ScriptedRng, SpellCatalog, SpellDefinition};
pub use error::{CombatError, EffectError, ErrorContext, ErrorSeverity, TickProcessingError};
pub use state::{
    CombatStats, Combatant, CombatantKind, EntityId, ResourceMeter, Room, RoomId, Timestamp, World,
    WorldError,
};
pub use threat::ThreatState;
