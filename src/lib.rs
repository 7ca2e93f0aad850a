//! identify-pulse: identify-trigger sequencer
//!
//! Direct action / HTTP request → command parser → pulse sequencer → property bus

pub mod core;
pub mod error;
pub mod types;

// =============================================================================
// PULSE PROFILES
// =============================================================================

/// Pulse count for normal identify (mode 0 and every unknown mode)
pub const NORMAL_PULSE_COUNT: u32 = 5;

/// On/off hold for normal identify (milliseconds)
pub const NORMAL_PULSE_MS: u64 = 300;

/// Pulse count for the test pattern (mode 1)
pub const TEST_PULSE_COUNT: u32 = 10;

/// On/off hold for the test pattern (milliseconds)
pub const TEST_PULSE_MS: u64 = 200;

/// Mode value that selects the test pattern
pub const MODE_TEST: i32 = 1;

// =============================================================================
// PARSER DEFAULTS
// =============================================================================

/// Target used when the command does not name one
pub const DEFAULT_TARGET_ID: i32 = 1;
pub const DEFAULT_CHANNEL: i32 = 0;
pub const DEFAULT_MODE: i32 = 0;

/// Field separator in `target:channel:mode`
pub const COMMAND_SEPARATOR: char = ':';

// =============================================================================
// HOST SURFACE
// =============================================================================

/// Action that runs the mode from its payload
pub const ACTION_IDENTIFY: &str = "Trigger Identify Blink";

/// Action that always runs the test pattern
pub const ACTION_TEST_PATTERN: &str = "Trigger Test Pattern";

/// Default listen address for the HTTP control surface
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:16888";

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
