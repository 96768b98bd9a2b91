//! Transport Task Trait Definition
//!
//! Defines the interface every chat front end implements to plug into the
//! runtime. Concrete transports live outside the core crate.

use crate::{
    channel::{CommandSender, EffectReceiver, EventSender},
    errors::Result as AnonchatResult,
};

// ----------------------------------------------------------------------------
// Transport Task Trait
// ----------------------------------------------------------------------------

/// Common interface for transport tasks
///
/// A transport task turns whatever its users type into [`Event`]s for the
/// Core Logic task and renders the [`Effect`]s it gets back. It holds no
/// matchmaking state of its own.
///
/// - Receives effects from Core Logic via an `EffectReceiver` (broadcast, so
///   it must ignore effects for participants it does not serve)
/// - Sends events to Core Logic via an `EventSender`
/// - Lifecycle (spawning/aborting) is managed by the runtime
///
/// [`Event`]: crate::channel::Event
/// [`Effect`]: crate::channel::Effect
#[async_trait::async_trait]
pub trait TransportTask: Send + Sync {
    /// Attach CSP channels created by the runtime
    fn attach_channels(
        &mut self,
        event_sender: EventSender,
        effect_receiver: EffectReceiver,
    ) -> AnonchatResult<()>;

    /// Hand over an operator command channel
    ///
    /// Only transports that accept operator input need to keep it.
    fn attach_command_sender(&mut self, _command_sender: CommandSender) {}

    /// Run the transport's main loop until its input ends or it is aborted
    async fn run(&mut self) -> AnonchatResult<()>;

    /// Name used in logs
    fn name(&self) -> &'static str;
}
