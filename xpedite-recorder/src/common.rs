use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A timestamp measured from the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
pub struct AbsTimestamp {
    /// Whole seconds component of the timestamp, measured from the Unix epoch.
    pub secs: u64,
    /// Sub-second component of the timestamp, measured in microseconds.
    pub subsec_micros: u32,
}

impl AbsTimestamp {
    pub fn now() -> Self {
        let now = jiff::Timestamp::now();
        Self {
            // Before the epoch is clamped to the epoch.
            secs: u64::try_from(now.as_second()).unwrap_or(0),
            subsec_micros: u32::try_from(now.subsec_microsecond()).unwrap_or(0),
        }
    }

    pub fn as_duration_since_epoch(&self) -> Duration {
        Duration::from_secs(self.secs) + Duration::from_micros(self.subsec_micros as u64)
    }
}
