//! Status effects: definitions, live instances and their per-combatant store.
//!
//! - [`spec`]: immutable effect definitions supplied by content
//! - [`instance`]: live instances and their kind-specific state
//! - [`stacking`]: pure stacking-policy resolution
//! - [`store`]: the per-combatant container (apply / remove / cleanse / snapshot)
//! - [`absorb`]: school-filtered, priority-ordered shield consumption
//! - [`periodic`]: damage/heal-over-time scheduling

pub mod absorb;
pub mod instance;
pub mod modifiers;
pub mod periodic;
pub mod spec;
pub mod stacking;
pub mod store;

pub use absorb::AbsorbOutcome;
pub use instance::{EffectInstance, EffectOrigin, InstanceId, InstanceState};
pub use modifiers::CombatModifiers;
pub use periodic::{DueTicks, PeriodicPayload, PeriodicTick};
pub use spec::{EffectKind, EffectModifiers, EffectSpec, StackingPolicy, TagSet, tags};
pub use stacking::{Placement, StackingDecision};
pub use store::{ApplyOutcome, CleanseFilter, EffectContainer};
