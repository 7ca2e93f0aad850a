//! Pulse profile derived from the request mode

use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::{MODE_TEST, NORMAL_PULSE_COUNT, NORMAL_PULSE_MS, TEST_PULSE_COUNT, TEST_PULSE_MS};

/// Shape of a pulse train
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PulseProfile {
    /// Number of on/off pairs
    pub pulse_count: u32,
    /// Hold time with the pulse high (milliseconds)
    pub on_ms: u64,
    /// Hold time with the pulse low (milliseconds)
    pub off_ms: u64,
}

impl PulseProfile {
    /// Normal identify: short and distinct
    pub const NORMAL: Self = Self {
        pulse_count: NORMAL_PULSE_COUNT,
        on_ms: NORMAL_PULSE_MS,
        off_ms: NORMAL_PULSE_MS,
    };

    /// Test pattern: longer and more obvious
    pub const TEST: Self = Self {
        pulse_count: TEST_PULSE_COUNT,
        on_ms: TEST_PULSE_MS,
        off_ms: TEST_PULSE_MS,
    };

    /// Mode 1 is the test pattern, anything else is normal
    pub fn for_mode(mode: i32) -> Self {
        if mode == MODE_TEST {
            Self::TEST
        } else {
            Self::NORMAL
        }
    }

    pub fn on_duration(&self) -> Duration {
        Duration::from_millis(self.on_ms)
    }

    pub fn off_duration(&self) -> Duration {
        Duration::from_millis(self.off_ms)
    }

    /// Expected wall-clock length of the whole train
    pub fn total_duration(&self) -> Duration {
        Duration::from_millis((self.on_ms + self.off_ms) * self.pulse_count as u64)
    }
}
