use std::sync::Arc;

use mud_content::SpellBook;
use mud_core::{SpellCatalog, SpellDefinition};

/// Spell catalog backed by a loaded [`SpellBook`].
#[derive(Debug, Clone)]
pub struct SpellOracle {
    book: Arc<SpellBook>,
}

impl SpellOracle {
    pub fn new(book: SpellBook) -> Self {
        Self {
            book: Arc::new(book),
        }
    }

    pub fn book(&self) -> &SpellBook {
        &self.book
    }
}

impl SpellCatalog for SpellOracle {
    fn spell(&self, id: &str) -> Option<&SpellDefinition> {
        self.book.spell(id)
    }
}

#[cfg(test)]
mod tests {
    use mud_core::DamageSchool;

    use super::*;

    #[test]
    fn lookups_go_through_aliases() {
        let book = SpellBook::build(
            [SpellDefinition::new("firebolt", DamageSchool::Fire)],
            [("fb".to_owned(), "firebolt".to_owned())],
        )
        .unwrap();
        let oracle = SpellOracle::new(book);
        assert_eq!(oracle.spell("fb").map(|s| s.id.as_str()), Some("firebolt"));
        assert!(!oracle.contains("meteor"));
    }
}
