//! Combat resolution.
//!
//! All hp loss flows through [`apply_damage`]; all hp gain through
//! [`apply_heal`]. Attacks and casts are thin layers on top of those two.
//!
//! - [`policy`]: the damage-policy gate consulted before any mutation
//! - [`damage`]: melee damage rolls and the damage choke point
//! - [`heal`]: the heal path and healing threat
//! - [`hit`]: d100 avoidance and riposte rolls
//! - [`result`]: attack resolution with a depth-capped riposte
//! - [`cast`]: spell casting against the injected catalog

pub mod cast;
pub mod damage;
pub mod heal;
pub mod hit;
pub mod policy;
pub mod result;
mod school;

pub use cast::{CastError, CastReport, cast};
pub use damage::{
    DamageError, DamageReport, DamageRequest, DamageSource, apply_damage, compute_melee_damage,
};
pub use heal::{HealError, HealReport, apply_heal};
pub use hit::{Avoidance, roll_avoidance, roll_riposte};
pub use policy::{
    AllowAll, DamageContext, DamagePolicy, PROTECTED_TAG, PolicyDecision, PolicyDenied,
    StandardPolicy,
};
pub use result::{AttackOutcome, AttackResult, resolve_attack};
pub use school::{DamageSchool, SchoolSet};
