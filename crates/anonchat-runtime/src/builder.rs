//! Runtime Builder API
//!
//! Provides a builder-style API for consumers (CLI/tests) to register
//! transports and get command, event and app-event handles.

use anonchat_core::{
    channel::{
        create_app_event_channel, create_command_channel, create_effect_channel,
        create_effect_receiver, create_event_channel, AppEventReceiver, CommandSender,
        EffectReceiver, EffectSender, EventSender,
    },
    AnonchatConfig, AnonchatError, AnonchatResult, Command, Event, Matchmaker, TransportTask,
};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::logic::CoreLogicTask;

/// How long `shutdown` waits for the Core Logic task to drain
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

// ----------------------------------------------------------------------------
// Runtime Builder
// ----------------------------------------------------------------------------

/// Builder for an anonchat runtime
pub struct RuntimeBuilder {
    config: AnonchatConfig,
    transports: Vec<Box<dyn TransportTask>>,
    verify_invariants: bool,
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config: AnonchatConfig::default(),
            transports: Vec::new(),
            verify_invariants: cfg!(debug_assertions),
        }
    }

    /// Set the anonchat configuration
    pub fn with_config(mut self, config: AnonchatConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a transport task
    pub fn add_transport(mut self, transport: Box<dyn TransportTask>) -> Self {
        self.transports.push(transport);
        self
    }

    /// Check engine invariants after every event (on by default in debug builds)
    pub fn verify_invariants(mut self, enabled: bool) -> Self {
        self.verify_invariants = enabled;
        self
    }

    /// Build and start the runtime
    pub async fn build_and_start(self) -> AnonchatResult<RuntimeHandle> {
        self.config.validate()?;
        info!(
            "Building anonchat runtime with {} transport(s)",
            self.transports.len()
        );

        let channel_config = &self.config.channels;
        let (command_sender, command_receiver) = create_command_channel(channel_config);
        let (app_event_sender, app_event_receiver) = create_app_event_channel(channel_config);
        let (event_sender, event_receiver) = create_event_channel(channel_config);
        let (effect_sender, _effect_receiver) = create_effect_channel(channel_config);

        let matchmaker = Matchmaker::new(self.config.matching.clone());

        let mut core_task = CoreLogicTask::new(
            matchmaker.clone(),
            command_receiver,
            event_receiver,
            effect_sender.clone(),
            app_event_sender,
        )
        .with_invariant_checks(self.verify_invariants);

        // Subscribe every transport before the core task can emit anything
        let mut transport_handles = Vec::new();
        for mut transport in self.transports {
            transport.attach_channels(event_sender.clone(), create_effect_receiver(&effect_sender))?;
            transport.attach_command_sender(command_sender.clone());

            let handle = tokio::spawn(async move {
                let name = transport.name();
                info!("Transport {} starting", name);
                let result = transport.run().await;
                match &result {
                    Ok(()) => info!("Transport {} stopped", name),
                    Err(e) => warn!("Transport {} stopped with error: {}", name, e),
                }
                result
            });
            transport_handles.push(handle);
        }

        let core_handle = tokio::spawn(async move { core_task.run().await });

        info!("Anonchat runtime started successfully");

        Ok(RuntimeHandle {
            command_sender,
            event_sender,
            effect_sender,
            app_event_receiver: Some(app_event_receiver),
            matchmaker,
            core_handle: Some(core_handle),
            transport_handles,
            running: true,
        })
    }
}

// ----------------------------------------------------------------------------
// Runtime Handle
// ----------------------------------------------------------------------------

/// Handle to a running anonchat runtime
pub struct RuntimeHandle {
    command_sender: CommandSender,
    event_sender: EventSender,
    effect_sender: EffectSender,
    app_event_receiver: Option<AppEventReceiver>,
    matchmaker: Matchmaker,
    core_handle: Option<JoinHandle<AnonchatResult<()>>>,
    transport_handles: Vec<JoinHandle<AnonchatResult<()>>>,
    running: bool,
}

impl RuntimeHandle {
    /// Get a command sender for sending commands to the runtime
    pub fn command_sender(&self) -> CommandSender {
        self.command_sender.clone()
    }

    /// Get an event sender for feeding participant events without a transport
    pub fn event_sender(&self) -> EventSender {
        self.event_sender.clone()
    }

    /// Subscribe to the effects the core emits from now on
    pub fn subscribe_effects(&self) -> EffectReceiver {
        create_effect_receiver(&self.effect_sender)
    }

    /// Take the app event receiver (can only be called once)
    pub fn take_app_event_receiver(&mut self) -> Option<AppEventReceiver> {
        self.app_event_receiver.take()
    }

    /// Shared handle to the engine the runtime drives
    pub fn matchmaker(&self) -> &Matchmaker {
        &self.matchmaker
    }

    /// Send a command to the runtime
    pub async fn send_command(&self, command: Command) -> AnonchatResult<()> {
        self.command_sender
            .send(command)
            .await
            .map_err(|_| AnonchatError::channel_error("Failed to send command to runtime"))
    }

    /// Send a participant event to the runtime
    pub async fn send_event(&self, event: Event) -> AnonchatResult<()> {
        self.event_sender
            .send(event)
            .await
            .map_err(|_| AnonchatError::channel_error("Failed to send event to runtime"))
    }

    /// Check if the runtime is still running
    pub fn is_running(&self) -> bool {
        self.running
            && self
                .core_handle
                .as_ref()
                .is_some_and(|h| !h.is_finished())
    }

    /// Wait for the Core Logic task to complete
    pub async fn wait(&mut self) -> AnonchatResult<()> {
        let Some(handle) = self.core_handle.take() else {
            return Ok(());
        };
        let result = handle.await.map_err(|e| {
            AnonchatError::channel_error(format!("Core Logic task panicked: {}", e))
        })?;
        self.abort_transports();
        self.running = false;
        result
    }

    /// Shutdown the runtime gracefully
    pub async fn shutdown(&mut self) -> AnonchatResult<()> {
        info!("Shutting down anonchat runtime");

        // The core task may already have exited on its own
        let _ = self.send_command(Command::Shutdown).await;

        if let Some(handle) = self.core_handle.take() {
            if tokio::time::timeout(SHUTDOWN_GRACE, handle).await.is_err() {
                warn!("Core Logic task did not stop within {:?}", SHUTDOWN_GRACE);
            }
        }

        self.abort_transports();
        self.running = false;
        info!("Anonchat runtime shut down");
        Ok(())
    }

    fn abort_transports(&self) {
        for handle in &self.transport_handles {
            handle.abort();
        }
    }
}

// ----------------------------------------------------------------------------
// Convenience Functions
// ----------------------------------------------------------------------------

/// Create a runtime with small buffers, invariant checks and no transports
pub async fn create_test_runtime() -> AnonchatResult<RuntimeHandle> {
    RuntimeBuilder::new()
        .with_config(AnonchatConfig::testing())
        .verify_invariants(true)
        .build_and_start()
        .await
}
