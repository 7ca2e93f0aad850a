//! Core types for identify-pulse

mod request;
mod profile;
mod state;
mod report;

pub use request::IdentifyRequest;
pub use profile::PulseProfile;
pub use state::{StateKey, ObservableState, PropertyChange};
pub use report::SequenceReport;
