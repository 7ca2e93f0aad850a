//! Result of one sequencer run

use std::time::Duration;
use serde::Serialize;
use crate::types::{IdentifyRequest, PulseProfile};

/// Summary returned when a pulse train finishes
#[derive(Debug, Clone, Serialize)]
pub struct SequenceReport {
    pub request: IdentifyRequest,
    pub profile: PulseProfile,
    /// On/off pairs actually emitted
    pub pulses: u32,
    pub elapsed: Duration,
}
