use tokio::time::Instant;

use mud_core::Timestamp;

/// Engine time in milliseconds, continuing from `base` across restarts.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EngineClock {
    origin: Instant,
    base: Timestamp,
}

impl EngineClock {
    pub(crate) fn starting_at(base: Timestamp) -> Self {
        Self {
            origin: Instant::now(),
            base,
        }
    }

    pub(crate) fn now(&self) -> Timestamp {
        let elapsed = u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.base + elapsed
    }
}
