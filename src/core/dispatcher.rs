//! Direct trigger path: action payload → parser → sequencer
//!
//! Action callbacks are fire-and-continue. The run is handed to the tokio
//! runtime, which owns it from then on; the caller gets the join handle back
//! and may await or drop it.

use tokio::task::JoinHandle;
use tracing::debug;

use crate::core::command_parser::CommandParser;
use crate::core::sequencer::PulseSequencer;
use crate::types::{IdentifyRequest, SequenceReport};
use crate::MODE_TEST;

/// Turns raw action payloads into sequencer runs
#[derive(Debug, Clone)]
pub struct TriggerDispatcher {
    parser: CommandParser,
    sequencer: PulseSequencer,
}

impl TriggerDispatcher {
    pub fn new(sequencer: PulseSequencer) -> Self {
        Self {
            parser: CommandParser::new(),
            sequencer,
        }
    }

    /// Parse `raw`, then apply `force_mode` on top of the parsed mode
    pub fn resolve(&self, raw: &str, force_mode: Option<i32>) -> IdentifyRequest {
        let req = self.parser.parse(raw);
        match force_mode {
            Some(mode) => req.with_mode(mode),
            None => req,
        }
    }

    /// Start a run and return without waiting for it
    pub fn trigger_identify(&self, raw: &str, force_mode: Option<i32>) -> JoinHandle<SequenceReport> {
        let req = self.resolve(raw, force_mode);
        debug!(raw, %req, ?force_mode, "identify triggered");
        self.sequencer.spawn(req)
    }

    /// "Trigger Identify Blink": mode taken from the payload
    pub fn identify(&self, raw: &str) -> JoinHandle<SequenceReport> {
        self.trigger_identify(raw, None)
    }

    /// "Trigger Test Pattern": payload mode is overridden with the test pattern
    pub fn test_pattern(&self, raw: &str) -> JoinHandle<SequenceReport> {
        self.trigger_identify(raw, Some(MODE_TEST))
    }
}

// =============================================================================
// TESTS
// =============================================================================
