//! Runtime configuration.

use std::time::Duration;

use mud_core::CombatConfig;

use crate::api::{Result, RuntimeError};

/// Configuration shared by the [`TickEngine`](crate::TickEngine) and its worker.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Combat tuning handed to the core.
    pub combat: CombatConfig,
    /// Cadence of the tick loop.
    pub tick_interval: Duration,
    pub command_buffer_size: usize,
    /// Capacity of each event topic; slow subscribers lag rather than block.
    pub event_buffer_size: usize,
    /// Seed of the worker's combat RNG.
    pub rng_seed: u64,
}

impl EngineConfig {
    pub const DEFAULT_TICK_MS: u64 = 50;
    pub const DEFAULT_COMMAND_BUFFER: usize = 64;
    pub const DEFAULT_EVENT_BUFFER: usize = 256;

    pub const TICK_MS_VAR: &'static str = "MUD_TICK_MS";
    pub const COMMAND_BUFFER_VAR: &'static str = "MUD_COMMAND_BUFFER";
    pub const EVENT_BUFFER_VAR: &'static str = "MUD_EVENT_BUFFER";
    pub const RNG_SEED_VAR: &'static str = "MUD_RNG_SEED";

    /// Defaults overridden by `MUD_*` environment variables.
    ///
    /// Callers load `.env` (e.g. with `dotenvy`) before calling this.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(ms) = parse_var::<u64>(&lookup, Self::TICK_MS_VAR)? {
            if ms == 0 {
                return Err(RuntimeError::InvalidConfig {
                    key: Self::TICK_MS_VAR,
                    value: ms.to_string(),
                });
            }
            config.tick_interval = Duration::from_millis(ms);
        }
        if let Some(size) = parse_var::<usize>(&lookup, Self::COMMAND_BUFFER_VAR)? {
            config.command_buffer_size = size.max(1);
        }
        if let Some(size) = parse_var::<usize>(&lookup, Self::EVENT_BUFFER_VAR)? {
            config.event_buffer_size = size.max(1);
        }
        if let Some(seed) = parse_var::<u64>(&lookup, Self::RNG_SEED_VAR)? {
            config.rng_seed = seed;
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_combat(mut self, combat: CombatConfig) -> Self {
        self.combat = combat;
        self
    }

    #[must_use]
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    #[must_use]
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = seed;
        self
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| RuntimeError::InvalidConfig { key, value: raw }),
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            combat: CombatConfig::default(),
            tick_interval: Duration::from_millis(Self::DEFAULT_TICK_MS),
            command_buffer_size: Self::DEFAULT_COMMAND_BUFFER,
            event_buffer_size: Self::DEFAULT_EVENT_BUFFER,
            rng_seed: 0x853c_49e6_748f_ea9b,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn unset_variables_keep_defaults() {
        let config = EngineConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.tick_interval, Duration::from_millis(50));
    }

    #[test]
    fn variables_override_defaults() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("MUD_TICK_MS", "100"),
            ("MUD_COMMAND_BUFFER", " 8 "),
            ("MUD_EVENT_BUFFER", "0"),
        ]))
        .unwrap();
        assert_eq!(config.tick_interval, Duration::from_millis(100));
        assert_eq!(config.command_buffer_size, 8);
        assert_eq!(config.event_buffer_size, 1);
    }

    #[test]
    fn malformed_values_are_errors() {
        let err = EngineConfig::from_lookup(lookup(&[("MUD_TICK_MS", "fast")])).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::InvalidConfig { key: "MUD_TICK_MS", .. }
        ));
        assert!(EngineConfig::from_lookup(lookup(&[("MUD_TICK_MS", "0")])).is_err());
    }
}
