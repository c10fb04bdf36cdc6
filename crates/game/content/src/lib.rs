//! Data-driven combat content and its loaders.
//!
//! This crate houses the static content the combat engine consumes:
//! - Spell catalog with aliases (RON), served through [`SpellBook`]
//! - Combat tuning (TOML)
//!
//! Content is consumed through read-only catalogs and never appears in the
//! world state.

pub mod spellbook;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use spellbook::{SpellBook, SpellBookError};

#[cfg(feature = "loaders")]
pub use loaders::{ConfigLoader, ContentFactory, SpellLoader};
