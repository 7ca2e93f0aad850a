//! Parsed identify request

use serde::{Deserialize, Serialize};
use crate::types::PulseProfile;
use crate::{DEFAULT_CHANNEL, DEFAULT_MODE, DEFAULT_TARGET_ID};

/// Target/channel/mode triple produced by the command parser
///
/// Values are carried as given: negative input is not clamped, and modes
/// above 1 are passed through to the sequencer (which runs them as normal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentifyRequest {
    /// Physical device to react
    pub target_id: i32,
    /// Logical zone/indicator on the device
    pub channel: i32,
    /// Pulse profile selector (0 = normal, 1 = test)
    pub mode: i32,
}

impl Default for IdentifyRequest {
    fn default() -> Self {
        Self {
            target_id: DEFAULT_TARGET_ID,
            channel: DEFAULT_CHANNEL,
            mode: DEFAULT_MODE,
        }
    }
}

impl IdentifyRequest {
    pub fn new(target_id: i32, channel: i32, mode: i32) -> Self {
        Self { target_id, channel, mode }
    }

    /// Same target and channel, different mode
    pub fn with_mode(self, mode: i32) -> Self {
        Self { mode, ..self }
    }

    /// Pulse profile selected by this request's mode
    pub fn profile(&self) -> PulseProfile {
        PulseProfile::for_mode(self.mode)
    }
}

impl std::fmt::Display for IdentifyRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.target_id, self.channel, self.mode)
    }
}
