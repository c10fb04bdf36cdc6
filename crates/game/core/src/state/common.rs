use std::fmt;

/// Unique identifier for any combatant tracked in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId(pub u32);

impl EntityId {
    /// Reserved identifier for world-originated effects (traps, zone auras).
    ///
    /// Effects applied by `WORLD` are never attributed to a combatant for
    /// threat purposes.
    pub const WORLD: Self = Self(u32::MAX);

    /// Returns true if this identifier is the world pseudo-entity.
    #[inline]
    pub const fn is_world(self) -> bool {
        self.0 == Self::WORLD.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of a room (the unit of co-location and combat policy).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoomId(pub String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Monotonic world time in milliseconds.
///
/// Every time-dependent operation takes the current timestamp explicitly,
/// so evaluation is fully deterministic given fixed inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub const ZERO: Self = Self(0);

    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Milliseconds elapsed since `earlier`, zero if `earlier` is in the future.
    pub const fn since(self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::ops::Add<u64> for Timestamp {
    type Output = Timestamp;
    fn add(self, rhs: u64) -> Timestamp {
        Timestamp(self.0.saturating_add(rhs))
    }
}

impl std::ops::Sub<u64> for Timestamp {
    type Output = Timestamp;
    fn sub(self, rhs: u64) -> Timestamp {
        Timestamp(self.0.saturating_sub(rhs))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Integer resource meter (health, mana) tracked per combatant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourceMeter {
    pub current: u32,
    pub maximum: u32,
}

impl ResourceMeter {
    pub fn new(current: u32, maximum: u32) -> Self {
        Self {
            current: current.min(maximum),
            maximum,
        }
    }

    /// A full meter.
    pub fn full(maximum: u32) -> Self {
        Self::new(maximum, maximum)
    }

    /// Removes up to `amount`, clamped at zero. Returns the amount removed.
    pub fn debit(&mut self, amount: u32) -> u32 {
        let removed = amount.min(self.current);
        self.current -= removed;
        removed
    }

    /// Adds up to `amount`, clamped at the maximum. Returns the amount added.
    pub fn credit(&mut self, amount: u32) -> u32 {
        let added = amount.min(self.maximum.saturating_sub(self.current));
        self.current += added;
        added
    }

    pub fn is_empty(&self) -> bool {
        self.current == 0
    }

    pub fn is_full(&self) -> bool {
        self.current == self.maximum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meter_clamps_both_ends() {
        let mut hp = ResourceMeter::new(8, 10);
        assert_eq!(hp.credit(5), 2);
        assert!(hp.is_full());
        assert_eq!(hp.debit(25), 10);
        assert!(hp.is_empty());
    }

    #[test]
    fn credit_on_overfilled_meter_adds_nothing() {
        let mut mana = ResourceMeter::new(12, 10);
        assert_eq!(mana.credit(5), 0);
        assert_eq!(mana.current, 12);
    }

    #[test]
    fn timestamp_arithmetic_saturates() {
        let t = Timestamp(100);
        assert_eq!(t - 500, Timestamp::ZERO);
        assert_eq!(Timestamp(50).since(t), 0);
        assert_eq!((t + 2_000).since(t), 2_000);
    }
}
