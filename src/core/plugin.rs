//! Plugin lifecycle: properties, actions and the HTTP listener
//!
//! `init()` registers the four identify properties and both actions on the
//! in-process bus, then binds the listener. `shutdown()` stops the listener;
//! pulse sequences already running finish on their own.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::core::api::{create_router, serve};
use crate::core::dispatcher::TriggerDispatcher;
use crate::core::driver::{DeviceDriver, NoopDriver, SelectorMap, SequencerDriver};
use crate::core::publisher::PropertyBus;
use crate::core::sequencer::{PulseSequencer, RunPolicy};
use crate::error::PluginError;
use crate::types::{SequenceReport, StateKey};
use crate::{ACTION_IDENTIFY, ACTION_TEST_PATTERN, DEFAULT_LISTEN_ADDR};

/// Callback behind a named action; receives the raw string payload
pub type ActionHandler = Arc<dyn Fn(&str) -> JoinHandle<SequenceReport> + Send + Sync>;

/// Named actions exposed to the host
#[derive(Default, Clone)]
pub struct ActionTable {
    actions: BTreeMap<String, ActionHandler>,
}

impl std::fmt::Debug for ActionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.actions.keys()).finish()
    }
}

impl ActionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace an action
    pub fn register(&mut self, name: impl Into<String>, handler: ActionHandler) {
        let name = name.into();
        debug!(action = %name, "registered action");
        self.actions.insert(name, handler);
    }

    /// Invoke an action by name with its payload
    pub fn invoke(&self, name: &str, payload: &str) -> Result<JoinHandle<SequenceReport>, PluginError> {
        let handler = self
            .actions
            .get(name)
            .ok_or_else(|| PluginError::UnknownAction(name.to_string()))?;
        Ok(handler(payload))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// Registered action names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.actions.keys().map(String::as_str).collect()
    }
}

/// Plugin configuration
#[derive(Debug, Clone)]
pub struct PluginConfig {
    /// Address the HTTP listener binds to
    pub listen_addr: String,
    pub run_policy: RunPolicy,
    /// Selectors the HTTP path can resolve to a sequencer run
    pub selectors: SelectorMap,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            run_policy: RunPolicy::default(),
            selectors: SelectorMap::new(),
        }
    }
}

/// Running HTTP listener
struct ListenerHandle {
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
    task: JoinHandle<std::io::Result<()>>,
}

/// The identify plugin
pub struct IdentifyPlugin {
    config: PluginConfig,
    bus: Arc<PropertyBus>,
    dispatcher: TriggerDispatcher,
    driver: Arc<dyn DeviceDriver>,
    actions: ActionTable,
    listener: Option<ListenerHandle>,
}

impl IdentifyPlugin {
    /// Build the plugin; nothing is registered or bound until `init()`
    ///
    /// With an empty selector map the HTTP path uses `NoopDriver`, otherwise
    /// mapped selectors drive the same sequencer as the actions.
    pub fn new(config: PluginConfig) -> Self {
        let bus = Arc::new(PropertyBus::new());
        let sequencer = PulseSequencer::with_policy(bus.clone(), config.run_policy);
        let driver: Arc<dyn DeviceDriver> = if config.selectors.is_empty() {
            Arc::new(NoopDriver)
        } else {
            Arc::new(SequencerDriver::new(config.selectors.clone(), sequencer.clone()))
        };

        Self {
            config,
            bus,
            dispatcher: TriggerDispatcher::new(sequencer),
            driver,
            actions: ActionTable::new(),
            listener: None,
        }
    }

    /// Replace the driver used by the HTTP path
    pub fn with_driver(mut self, driver: Arc<dyn DeviceDriver>) -> Self {
        self.driver = driver;
        self
    }

    /// Register properties and actions, then start the listener
    pub async fn init(&mut self) -> Result<SocketAddr, PluginError> {
        if let Some(listener) = &self.listener {
            return Err(PluginError::AlreadyRunning(listener.addr));
        }
        self.register();
        self.start_listener().await
    }

    /// Register the four identify properties (initially 0) and both actions
    ///
    /// Split from `init()` so hosts without a network surface can use it.
    pub fn register(&mut self) {
        for key in StateKey::ALL {
            self.bus.add_property(key, 0);
        }

        let dispatcher = self.dispatcher.clone();
        self.actions
            .register(ACTION_IDENTIFY, Arc::new(move |payload: &str| dispatcher.identify(payload)));

        let dispatcher = self.dispatcher.clone();
        self.actions
            .register(ACTION_TEST_PATTERN, Arc::new(move |payload: &str| dispatcher.test_pattern(payload)));
    }

    async fn start_listener(&mut self) -> Result<SocketAddr, PluginError> {
        let addr = &self.config.listen_addr;
        let listener = TcpListener::bind(addr.as_str()).await.map_err(|source| PluginError::Bind {
            addr: addr.clone(),
            source,
        })?;
        let local = listener.local_addr()?;

        let (stop, stopped) = oneshot::channel::<()>();
        let router = create_router(self.driver.clone());
        let task = tokio::spawn(serve(listener, router, async move {
            // A dropped sender also stops the listener
            let _ = stopped.await;
        }));

        info!(addr = %local, policy = ?self.config.run_policy, "identify plugin started");
        self.listener = Some(ListenerHandle { addr: local, stop, task });
        Ok(local)
    }

    /// Stop the listener and wait for it to close
    ///
    /// In-flight pulse sequences are left running. Calling this when the
    /// listener is not running is a no-op.
    pub async fn shutdown(&mut self) -> Result<(), PluginError> {
        let Some(listener) = self.listener.take() else {
            debug!("shutdown requested with no listener running");
            return Ok(());
        };
        let _ = listener.stop.send(());
        listener.task.await??;
        info!(addr = %listener.addr, "identify plugin stopped");
        Ok(())
    }

    pub fn bus(&self) -> &Arc<PropertyBus> {
        &self.bus
    }

    pub fn actions(&self) -> &ActionTable {
        &self.actions
    }

    pub fn dispatcher(&self) -> &TriggerDispatcher {
        &self.dispatcher
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    /// Bound listener address while running
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().map(|l| l.addr)
    }

    pub fn is_listening(&self) -> bool {
        self.listener.is_some()
    }
}

// =============================================================================
// TESTS
// =============================================================================
