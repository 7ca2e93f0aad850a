//! Pulse sequencer: drives the identify pulse train
//!
//! Run shape:
//! - publish target / channel / mode
//! - `pulse_count` × (pulse=1, hold on_ms, pulse=0, hold off_ms)
//! - publish target / channel / mode = 0
//!
//! Holds are tokio timers, so a run never occupies a worker thread while it
//! waits. The idle reset lives in a drop guard: it runs when the train
//! finishes and also when the runtime drops the task at shutdown.

use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::core::publisher::StatePublisher;
use crate::types::{IdentifyRequest, SequenceReport, StateKey};

/// How overlapping runs share the state sink
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunPolicy {
    /// Runs proceed independently; interleaved writes, last writer wins
    #[default]
    Overlap,
    /// Runs queue behind each other in arrival order
    Serialized,
}

/// Pulse sequencer bound to one state sink
#[derive(Clone)]
pub struct PulseSequencer {
    publisher: Arc<dyn StatePublisher>,
    run_lock: Option<Arc<Mutex<()>>>,
}

impl std::fmt::Debug for PulseSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PulseSequencer")
            .field("policy", &self.policy())
            .finish_non_exhaustive()
    }
}

impl PulseSequencer {
    /// Sequencer with the default (overlapping) run policy
    pub fn new(publisher: Arc<dyn StatePublisher>) -> Self {
        Self::with_policy(publisher, RunPolicy::default())
    }

    pub fn with_policy(publisher: Arc<dyn StatePublisher>, policy: RunPolicy) -> Self {
        let run_lock = match policy {
            RunPolicy::Overlap => None,
            RunPolicy::Serialized => Some(Arc::new(Mutex::new(()))),
        };
        Self { publisher, run_lock }
    }

    pub fn policy(&self) -> RunPolicy {
        if self.run_lock.is_some() {
            RunPolicy::Serialized
        } else {
            RunPolicy::Overlap
        }
    }

    /// Run one pulse train to completion
    pub async fn run(&self, req: IdentifyRequest) -> SequenceReport {
        // tokio's Mutex is fair, so queued runs start in arrival order
        let _turn = match &self.run_lock {
            Some(lock) => Some(lock.lock().await),
            None => None,
        };

        let profile = req.profile();
        let started = Instant::now();
        info!(
            target_id = req.target_id,
            channel = req.channel,
            mode = req.mode,
            pulses = profile.pulse_count,
            on_ms = profile.on_ms,
            off_ms = profile.off_ms,
            "identify sequence started"
        );

        let publisher = self.publisher.as_ref();
        let mut reset = IdleReset::new(publisher);

        publisher.publish(StateKey::IdentifyTargetId, req.target_id);
        publisher.publish(StateKey::IdentifyChannel, req.channel);
        publisher.publish(StateKey::IdentifyMode, req.mode);

        let mut pulses: u32 = 0;
        for _ in 0..profile.pulse_count {
            reset.pulse_high = true;
            publisher.publish(StateKey::IdentifyPulse, 1);
            sleep(profile.on_duration()).await;

            publisher.publish(StateKey::IdentifyPulse, 0);
            reset.pulse_high = false;
            sleep(profile.off_duration()).await;

            pulses += 1;
        }

        drop(reset);

        let elapsed = started.elapsed();
        info!(
            target_id = req.target_id,
            pulses,
            elapsed_ms = elapsed.as_millis() as u64,
            "identify sequence finished"
        );

        SequenceReport {
            request: req,
            profile,
            pulses,
            elapsed,
        }
    }

    /// Hand a run to the runtime and return at once
    pub fn spawn(&self, req: IdentifyRequest) -> JoinHandle<SequenceReport> {
        let sequencer = self.clone();
        tokio::spawn(async move { sequencer.run(req).await })
    }
}

/// Restores the idle quadruple when a run ends, however it ends
struct IdleReset<'a> {
    publisher: &'a dyn StatePublisher,
    pulse_high: bool,
}

impl<'a> IdleReset<'a> {
    fn new(publisher: &'a dyn StatePublisher) -> Self {
        Self {
            publisher,
            pulse_high: false,
        }
    }
}

impl Drop for IdleReset<'_> {
    fn drop(&mut self) {
        if self.pulse_high {
            debug!("identify sequence interrupted during on-phase");
            self.publisher.publish(StateKey::IdentifyPulse, 0);
        }
        self.publisher.publish(StateKey::IdentifyTargetId, 0);
        self.publisher.publish(StateKey::IdentifyChannel, 0);
        self.publisher.publish(StateKey::IdentifyMode, 0);
    }
}

// =============================================================================
// TESTS
// =============================================================================
