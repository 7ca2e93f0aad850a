//! Observable identify state and property keys

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// Property names written by the sequencer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateKey {
    /// 1 while a pulse is on, 0 otherwise
    IdentifyPulse,
    /// Which board should react
    IdentifyTargetId,
    /// Which logical channel/zone on the board
    IdentifyChannel,
    /// 0 = normal identify, 1 = test pattern
    IdentifyMode,
}

impl StateKey {
    pub const ALL: [StateKey; 4] = [
        StateKey::IdentifyPulse,
        StateKey::IdentifyTargetId,
        StateKey::IdentifyChannel,
        StateKey::IdentifyMode,
    ];

    /// Property name as seen by the host bus
    pub fn as_str(&self) -> &'static str {
        match self {
            StateKey::IdentifyPulse => "IdentifyPulse",
            StateKey::IdentifyTargetId => "IdentifyTargetId",
            StateKey::IdentifyChannel => "IdentifyChannel",
            StateKey::IdentifyMode => "IdentifyMode",
        }
    }
}

impl std::fmt::Display for StateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Externally visible projection of the sequencer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservableState {
    pub pulse_level: i32,
    pub target_id: i32,
    pub channel: i32,
    pub mode: i32,
}

impl ObservableState {
    /// All-zero quadruple the sequencer restores after every run
    pub const IDLE: Self = Self {
        pulse_level: 0,
        target_id: 0,
        channel: 0,
        mode: 0,
    };

    pub fn is_idle(&self) -> bool {
        *self == Self::IDLE
    }
}

/// One property write, as broadcast to bus subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyChange {
    pub timestamp: DateTime<Utc>,
    pub key: StateKey,
    pub value: i32,
}

impl PropertyChange {
    pub fn new(key: StateKey, value: i32) -> Self {
        Self {
            timestamp: Utc::now(),
            key,
            value,
        }
    }

    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        let (color, marker) = match (self.key, self.value) {
            (StateKey::IdentifyPulse, 0) => ("\x1b[90m", "○"),
            (StateKey::IdentifyPulse, _) => ("\x1b[33m", "●"),
            _ => ("\x1b[36m", "·"),
        };
        format!(
            "{}{} {} {}={}\x1b[0m",
            color,
            marker,
            self.timestamp.format("%H:%M:%S%.3f"),
            self.key,
            self.value
        )
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        format!(
            "{} {}={}",
            self.timestamp.format("%H:%M:%S%.3f"),
            self.key,
            self.value
        )
    }
}
