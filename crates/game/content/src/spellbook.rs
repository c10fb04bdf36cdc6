//! Read-only spell catalog with aliases resolved at build time.

use std::collections::BTreeMap;

use mud_core::{EffectError, SpellCatalog, SpellDefinition};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SpellBookError {
    #[error("spell '{0}' is defined more than once")]
    DuplicateSpell(String),

    #[error("alias '{alias}' points at unknown spell '{target}'")]
    UnknownAliasTarget { alias: String, target: String },

    #[error("alias '{0}' shadows a spell id")]
    AliasShadowsSpell(String),

    #[error("alias '{0}' is part of a cycle")]
    AliasCycle(String),

    #[error("spell '{spell_id}' carries an invalid status effect: {source}")]
    InvalidEffect {
        spell_id: String,
        #[source]
        source: EffectError,
    },
}

/// Immutable spell lookup keyed by id, with aliases flattened to their
/// canonical id.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpellBook {
    spells: BTreeMap<String, SpellDefinition>,
    aliases: BTreeMap<String, String>,
}

impl SpellBook {
    /// Builds the book, validating every definition and resolving alias
    /// chains (`a -> b -> spell`) to the final spell id.
    pub fn build(
        definitions: impl IntoIterator<Item = SpellDefinition>,
        aliases: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self, SpellBookError> {
        let mut spells = BTreeMap::new();
        for spell in definitions {
            if let Some(effect) = &spell.status_effect {
                effect
                    .validate()
                    .map_err(|source| SpellBookError::InvalidEffect {
                        spell_id: spell.id.clone(),
                        source,
                    })?;
            }
            if spells.contains_key(&spell.id) {
                return Err(SpellBookError::DuplicateSpell(spell.id));
            }
            spells.insert(spell.id.clone(), spell);
        }

        let raw: BTreeMap<String, String> = aliases.into_iter().collect();
        let mut resolved = BTreeMap::new();
        for alias in raw.keys() {
            if spells.contains_key(alias) {
                return Err(SpellBookError::AliasShadowsSpell(alias.clone()));
            }
            let target = Self::resolve_chain(alias, &raw, &spells)?;
            resolved.insert(alias.clone(), target);
        }

        tracing::debug!(
            target: "mud::content",
            spells = spells.len(),
            aliases = resolved.len(),
            "spell book built"
        );

        Ok(Self {
            spells,
            aliases: resolved,
        })
    }

    fn resolve_chain(
        alias: &str,
        raw: &BTreeMap<String, String>,
        spells: &BTreeMap<String, SpellDefinition>,
    ) -> Result<String, SpellBookError> {
        let mut current = alias;
        // Each hop must land on a fresh alias; more hops than aliases is a cycle.
        for _ in 0..=raw.len() {
            let Some(next) = raw.get(current) else {
                return Err(SpellBookError::UnknownAliasTarget {
                    alias: alias.to_owned(),
                    target: current.to_owned(),
                });
            };
            if spells.contains_key(next) {
                return Ok(next.clone());
            }
            current = next;
        }
        Err(SpellBookError::AliasCycle(alias.to_owned()))
    }

    /// Canonical id for `name`, which may be a spell id or an alias.
    pub fn canonical_id<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        if self.spells.contains_key(name) {
            Some(name)
        } else {
            self.aliases.get(name).map(String::as_str)
        }
    }

    pub fn len(&self) -> usize {
        self.spells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spells.is_empty()
    }

    pub fn spells(&self) -> impl Iterator<Item = &SpellDefinition> {
        self.spells.values()
    }

    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(a, t)| (a.as_str(), t.as_str()))
    }
}

impl SpellCatalog for SpellBook {
    fn spell(&self, id: &str) -> Option<&SpellDefinition> {
        self.canonical_id(id).and_then(|id| self.spells.get(id))
    }
}

#[cfg(test)]
mod tests {
    use mud_core::{DamageSchool, EffectKind, EffectSpec};

    use super::*;

    fn alias(a: &str, t: &str) -> (String, String) {
        (a.to_owned(), t.to_owned())
    }

    fn no_aliases() -> Vec<(String, String)> {
        Vec::new()
    }

    fn firebolt() -> SpellDefinition {
        SpellDefinition::new("firebolt", DamageSchool::Fire)
            .harmful()
            .with_damage(10)
    }

    #[test]
    fn aliases_resolve_to_the_same_definition() {
        let book = SpellBook::build(
            [firebolt()],
            [alias("fb", "firebolt"), alias("bolt", "fb")],
        )
        .unwrap();

        assert_eq!(book.spell("fb").unwrap().id, "firebolt");
        assert_eq!(book.spell("bolt").unwrap().id, "firebolt");
        assert_eq!(book.canonical_id("bolt"), Some("firebolt"));
        assert!(!book.contains("meteor"));
    }

    #[test]
    fn broken_aliases_are_rejected() {
        assert_eq!(
            SpellBook::build([firebolt()], [alias("mt", "meteor")]).unwrap_err(),
            SpellBookError::UnknownAliasTarget {
                alias: "mt".into(),
                target: "meteor".into()
            }
        );
        assert_eq!(
            SpellBook::build([firebolt()], [alias("a", "b"), alias("b", "a")]).unwrap_err(),
            SpellBookError::AliasCycle("a".into())
        );
        assert_eq!(
            SpellBook::build([firebolt()], [alias("firebolt", "firebolt")]).unwrap_err(),
            SpellBookError::AliasShadowsSpell("firebolt".into())
        );
    }

    #[test]
    fn invalid_effects_and_duplicates_fail_the_build() {
        let broken = SpellDefinition::new("rot", DamageSchool::Nature).with_effect(EffectSpec::new(
            "rot",
            6_000,
            EffectKind::Dot {
                per_tick: 2,
                interval_ms: 0,
                school: DamageSchool::Nature,
            },
        ));
        assert!(matches!(
            SpellBook::build([broken], no_aliases()).unwrap_err(),
            SpellBookError::InvalidEffect { .. }
        ));
        assert_eq!(
            SpellBook::build([firebolt(), firebolt()], no_aliases()).unwrap_err(),
            SpellBookError::DuplicateSpell("firebolt".into())
        );
    }
}
