//! Spell catalog loader.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use mud_core::SpellDefinition;
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};
use crate::spellbook::SpellBook;

/// Spell catalog structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpellCatalogFile {
    pub spells: Vec<SpellDefinition>,
    /// `alias -> spell id` (or another alias).
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

/// Loader for the spell catalog from RON files.
pub struct SpellLoader;

impl SpellLoader {
    /// Load and validate a spell catalog, resolving its aliases.
    pub fn load(path: &Path) -> LoadResult<SpellBook> {
        let content = read_file(path)?;
        Self::parse(&content).with_context(|| format!("in {}", path.display()))
    }

    pub fn parse(content: &str) -> LoadResult<SpellBook> {
        let file: SpellCatalogFile =
            ron::from_str(content).context("Failed to parse spell catalog RON")?;
        let book = SpellBook::build(file.spells, file.aliases)?;
        Ok(book)
    }
}

#[cfg(test)]
mod tests {
    use mud_core::{DamageSchool, EffectKind, SpellCatalog, StackingPolicy};

    use super::*;

    const CATALOG: &str = r#"(
        spells: [
            (
                id: "firebolt",
                name: "Firebolt",
                school: fire,
                harmful: true,
                mana_cost: 10,
                cooldown_ms: 3000,
                damage: 12,
            ),
            (
                id: "sunder",
                school: physical,
                harmful: true,
                mana_cost: 5,
                status_effect: Some((
                    id: "sunder",
                    duration_ms: 15000,
                    kind: debuff,
                    modifiers: (damage_taken_pct: 0.05),
                    stacking: stack(max_stacks: 5),
                )),
            ),
        ],
        aliases: { "fb": "firebolt" },
    )"#;

    #[test]
    fn parses_spells_effects_and_aliases() {
        let book = SpellLoader::parse(CATALOG).unwrap();

        let firebolt = book.spell("fb").unwrap();
        assert_eq!(firebolt.school, DamageSchool::Fire);
        assert_eq!(firebolt.display_name(), "Firebolt");

        let sunder = book.spell("sunder").unwrap().status_effect.as_ref().unwrap();
        assert_eq!(sunder.kind, EffectKind::Debuff);
        assert_eq!(sunder.stacking, StackingPolicy::Stack { max_stacks: 5 });
        assert_eq!(sunder.modifiers.damage_taken_pct, 0.05);
    }

    #[test]
    fn unknown_alias_target_fails_to_load() {
        let err = SpellLoader::parse(r#"(spells: [], aliases: { "x": "nothing" })"#).unwrap_err();
        assert!(err.to_string().contains("unknown spell"));
    }
}
