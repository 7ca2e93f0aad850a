//! Core modules for identify-pulse

pub mod command_parser;
pub mod publisher;
pub mod sequencer;
pub mod dispatcher;
pub mod driver;
pub mod api;
pub mod plugin;

pub use command_parser::{CommandParser, parse_command};
pub use publisher::{StatePublisher, PropertyBus};
pub use sequencer::{PulseSequencer, RunPolicy};
pub use dispatcher::TriggerDispatcher;
pub use driver::{DeviceDriver, NoopDriver, SelectorMap, SelectorMapping, SequencerDriver};
pub use api::{create_router, serve, MISSING_SELECTOR_BODY};
pub use plugin::{ActionHandler, ActionTable, IdentifyPlugin, PluginConfig};
