//! Injectable randomness for combat rolls.
//!
//! Every random decision (avoidance rolls, riposte rolls, damage variance)
//! draws from a [`CombatRng`] passed in by the caller. Replaying the same
//! sequence of values replays the same fight.

use std::collections::VecDeque;

/// Source of combat randomness.
pub trait CombatRng {
    fn next_u32(&mut self) -> u32;

    /// Roll a d100 (1-100 inclusive).
    fn roll_d100(&mut self) -> u32 {
        (self.next_u32() % 100) + 1
    }

    /// Uniform value in `[min, max]`.
    fn uniform(&mut self, min: f64, max: f64) -> f64 {
        if max <= min {
            return min;
        }
        let unit = f64::from(self.next_u32()) / f64::from(u32::MAX);
        min + (max - min) * unit
    }
}

impl<R: CombatRng + ?Sized> CombatRng for &mut R {
    fn next_u32(&mut self) -> u32 {
        (**self).next_u32()
    }
}

/// PCG random number generator (PCG-XSH-RR, 64-bit state, 32-bit output).
///
/// Same seed, same sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PcgRng {
    state: u64,
}

impl PcgRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    pub const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    #[inline]
    fn step(state: u64) -> u64 {
        state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT)
    }

    #[inline]
    fn output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }
}

impl Default for PcgRng {
    fn default() -> Self {
        Self::new(0x853c_49e6_748f_ea9b)
    }
}

impl CombatRng for PcgRng {
    fn next_u32(&mut self) -> u32 {
        self.state = Self::step(self.state);
        Self::output(self.state)
    }
}

/// Replays a fixed sequence of raw values, then repeats the last one.
///
/// Intended for tests and replays. Use [`ScriptedRng::d100`] to script
/// die faces directly.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRng {
    values: VecDeque<u32>,
    last: u32,
}

impl ScriptedRng {
    pub fn new(values: impl IntoIterator<Item = u32>) -> Self {
        Self {
            values: values.into_iter().collect(),
            last: 0,
        }
    }

    /// Scripts `roll_d100` results (each in 1..=100).
    pub fn d100(rolls: impl IntoIterator<Item = u32>) -> Self {
        Self::new(rolls.into_iter().map(|roll| roll.clamp(1, 100) - 1))
    }

    /// Number of scripted values not yet consumed.
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl CombatRng for ScriptedRng {
    fn next_u32(&mut self) -> u32 {
        if let Some(value) = self.values.pop_front() {
            self.last = value;
        }
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pcg_is_deterministic_per_seed() {
        let mut a = PcgRng::new(42);
        let mut b = PcgRng::new(42);
        let seq_a: Vec<_> = (0..8).map(|_| a.next_u32()).collect();
        let seq_b: Vec<_> = (0..8).map(|_| b.next_u32()).collect();
        assert_eq!(seq_a, seq_b);
        assert_ne!(seq_a[0], seq_a[1]);
    }

    #[test]
    fn d100_stays_in_range() {
        let mut rng = PcgRng::new(7);
        for _ in 0..1_000 {
            let roll = rng.roll_d100();
            assert!((1..=100).contains(&roll));
        }
    }

    #[test]
    fn uniform_respects_bounds() {
        let mut rng = PcgRng::new(7);
        for _ in 0..1_000 {
            let value = rng.uniform(0.8, 1.2);
            assert!((0.8..=1.2).contains(&value));
        }
        assert_eq!(ScriptedRng::new([0]).uniform(0.8, 1.2), 0.8);
    }

    #[test]
    fn scripted_rng_replays_die_faces() {
        let mut rng = ScriptedRng::d100([5, 100, 42]);
        assert_eq!(rng.roll_d100(), 5);
        assert_eq!(rng.roll_d100(), 100);
        assert_eq!(rng.roll_d100(), 42);
        assert_eq!(rng.roll_d100(), 42);
    }
}
