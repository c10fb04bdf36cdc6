//! Damage schools and school sets.

use bitflags::bitflags;

/// School of a damage event, used by shield eligibility and resistances.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DamageSchool {
    /// Melee swings, arrows, falling rocks.
    Physical,
    Fire,
    Frost,
    Nature,
    Shadow,
    Holy,
    Arcane,
}

impl DamageSchool {
    /// The single-bit set containing this school.
    pub const fn mask(self) -> SchoolSet {
        match self {
            Self::Physical => SchoolSet::PHYSICAL,
            Self::Fire => SchoolSet::FIRE,
            Self::Frost => SchoolSet::FROST,
            Self::Nature => SchoolSet::NATURE,
            Self::Shadow => SchoolSet::SHADOW,
            Self::Holy => SchoolSet::HOLY,
            Self::Arcane => SchoolSet::ARCANE,
        }
    }
}

bitflags! {
    /// Set of damage schools a shield is restricted to.
    ///
    /// The empty set means "no restriction": the shield absorbs every school.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct SchoolSet: u8 {
        const PHYSICAL = 1 << 0;
        const FIRE = 1 << 1;
        const FROST = 1 << 2;
        const NATURE = 1 << 3;
        const SHADOW = 1 << 4;
        const HOLY = 1 << 5;
        const ARCANE = 1 << 6;
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for SchoolSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        bitflags::serde::serialize(self, serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for SchoolSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        bitflags::serde::deserialize(deserializer)
    }
}

impl SchoolSet {
    /// Whether a shield restricted to this set may absorb `school`.
    pub fn admits(self, school: DamageSchool) -> bool {
        self.is_empty() || self.contains(school.mask())
    }
}

impl FromIterator<DamageSchool> for SchoolSet {
    fn from_iter<I: IntoIterator<Item = DamageSchool>>(iter: I) -> Self {
        iter.into_iter()
            .fold(SchoolSet::empty(), |set, school| set | school.mask())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn empty_set_admits_everything() {
        assert!(SchoolSet::empty().admits(DamageSchool::Physical));
        assert!(SchoolSet::empty().admits(DamageSchool::Arcane));
    }

    #[test]
    fn restricted_set_admits_only_members() {
        let set: SchoolSet = [DamageSchool::Fire, DamageSchool::Frost].into_iter().collect();
        assert!(set.admits(DamageSchool::Fire));
        assert!(!set.admits(DamageSchool::Physical));
    }

    #[test]
    fn school_names_round_trip_through_strum() {
        assert_eq!(DamageSchool::Shadow.to_string(), "shadow");
        assert_eq!(DamageSchool::from_str("holy"), Ok(DamageSchool::Holy));
    }
}
