//! Device drivers for the network path
//!
//! The HTTP surface addresses a device by an opaque selector (e.g. `COM3`)
//! instead of a `target:channel:mode` command. A driver turns that selector
//! into whatever actually makes the device blink.

use std::collections::HashMap;
use std::str::FromStr;
use async_trait::async_trait;
use tracing::{info, warn};

use crate::core::command_parser::parse_command;
use crate::core::sequencer::PulseSequencer;
use crate::error::{DriverError, SelectorMappingError};
use crate::types::IdentifyRequest;

/// Selector-keyed identify collaborator
#[async_trait]
pub trait DeviceDriver: Send + Sync {
    async fn identify(&self, selector: &str) -> Result<(), DriverError>;
}

/// Accepts every selector and does nothing but log it
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDriver;

#[async_trait]
impl DeviceDriver for NoopDriver {
    async fn identify(&self, selector: &str) -> Result<(), DriverError> {
        info!(selector, "identify requested (no driver attached)");
        Ok(())
    }
}

/// One `SELECTOR=TARGET[:CHANNEL[:MODE]]` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorMapping {
    pub selector: String,
    pub request: IdentifyRequest,
}

impl FromStr for SelectorMapping {
    type Err = SelectorMappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (selector, command) = s
            .split_once('=')
            .ok_or_else(|| SelectorMappingError(s.to_string()))?;
        let selector = selector.trim();
        if selector.is_empty() {
            return Err(SelectorMappingError(s.to_string()));
        }
        Ok(Self {
            selector: selector.to_string(),
            request: parse_command(command),
        })
    }
}

/// Selector → identify request table
#[derive(Debug, Clone, Default)]
pub struct SelectorMap {
    entries: HashMap<String, IdentifyRequest>,
}

impl SelectorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, selector: impl Into<String>, request: IdentifyRequest) {
        self.entries.insert(selector.into(), request);
    }

    pub fn get(&self, selector: &str) -> Option<IdentifyRequest> {
        self.entries.get(selector).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<SelectorMapping> for SelectorMap {
    fn from_iter<I: IntoIterator<Item = SelectorMapping>>(iter: I) -> Self {
        let entries = iter.into_iter().map(|m| (m.selector, m.request)).collect();
        Self { entries }
    }
}

/// Drives the pulse sequencer for mapped selectors
///
/// Both trigger paths end in the same sequencer: this driver looks the
/// selector up and fires the mapped request exactly as a direct action would.
#[derive(Debug, Clone)]
pub struct SequencerDriver {
    selectors: SelectorMap,
    sequencer: PulseSequencer,
}

impl SequencerDriver {
    pub fn new(selectors: SelectorMap, sequencer: PulseSequencer) -> Self {
        Self { selectors, sequencer }
    }
}

#[async_trait]
impl DeviceDriver for SequencerDriver {
    async fn identify(&self, selector: &str) -> Result<(), DriverError> {
        let Some(req) = self.selectors.get(selector) else {
            warn!(selector, "identify requested for unmapped selector");
            return Err(DriverError::UnknownSelector(selector.to_string()));
        };
        info!(selector, %req, "identify via selector");
        // Completion is not awaited; the runtime owns the run
        drop(self.sequencer.spawn(req));
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
