//! Integration tests for the anonchat runtime
//!
//! Start the runtime with in-memory transports, drive participants through it
//! and observe the effects and app events that come back out.

use anonchat_core::{
    channel::{EffectReceiver, EventSender},
    AnonchatConfig, AnonchatResult, AppEvent, Command, Effect, Event, MatchingConfig, Notice,
    ParticipantId, Payload, TransportTask,
};
use anonchat_runtime::RuntimeBuilder;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{timeout, Duration};
use tokio_test::assert_ok;

const STEP_TIMEOUT: Duration = Duration::from_secs(2);

fn p(raw: u64) -> ParticipantId {
    ParticipantId::new(raw)
}

// ----------------------------------------------------------------------------
// In-memory Transport
// ----------------------------------------------------------------------------

/// Transport that plays a fixed script of events and reports every effect it sees
struct ScriptedTransport {
    script: Vec<Event>,
    observed: mpsc::UnboundedSender<Effect>,
    event_sender: Option<EventSender>,
    effect_receiver: Option<EffectReceiver>,
}

impl ScriptedTransport {
    fn new(script: Vec<Event>) -> (Self, mpsc::UnboundedReceiver<Effect>) {
        let (observed, rx) = mpsc::unbounded_channel();
        let transport = Self {
            script,
            observed,
            event_sender: None,
            effect_receiver: None,
        };
        (transport, rx)
    }
}

#[async_trait::async_trait]
impl TransportTask for ScriptedTransport {
    fn attach_channels(
        &mut self,
        event_sender: EventSender,
        effect_receiver: EffectReceiver,
    ) -> AnonchatResult<()> {
        self.event_sender = Some(event_sender);
        self.effect_receiver = Some(effect_receiver);
        Ok(())
    }

    async fn run(&mut self) -> AnonchatResult<()> {
        let (Some(events), Some(mut effects)) =
            (self.event_sender.take(), self.effect_receiver.take())
        else {
            return Err(anonchat_core::AnonchatError::channel_error("channels not attached"));
        };

        for event in self.script.drain(..) {
            events
                .send(event)
                .await
                .map_err(|_| anonchat_core::AnonchatError::channel_error("core gone"))?;
        }

        loop {
            match effects.recv().await {
                Ok(effect) => {
                    if self.observed.send(effect).is_err() {
                        return Ok(());
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return Ok(()),
            }
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

async fn next_effect(rx: &mut mpsc::UnboundedReceiver<Effect>) -> Effect {
    timeout(STEP_TIMEOUT, rx.recv())
        .await
        .expect("Effect should be received within timeout")
        .expect("Effect stream should not end")
}

async fn next_broadcast(rx: &mut EffectReceiver) -> Effect {
    timeout(STEP_TIMEOUT, rx.recv())
        .await
        .expect("Effect should be received within timeout")
        .expect("Effect channel should stay open")
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_conversation_through_transport() {
    let script = vec![
        Event::Connect { participant: p(1) },
        Event::Connect { participant: p(2) },
        Event::Message {
            participant: p(1),
            payload: Payload::from("hi"),
        },
        Event::Stop { participant: p(2) },
    ];
    let (transport, mut observed) = ScriptedTransport::new(script);

    let mut runtime = RuntimeBuilder::new()
        .with_config(AnonchatConfig::testing())
        .add_transport(Box::new(transport))
        .build_and_start()
        .await
        .expect("Failed to start runtime");

    let expected = vec![
        Effect::notify(p(1), Notice::Waiting),
        Effect::notify(p(2), Notice::Connected),
        Effect::notify(p(1), Notice::Connected),
        Effect::DeliverPayload {
            participant: p(2),
            payload: Payload::from("hi"),
        },
        Effect::notify(p(1), Notice::PartnerLeft),
        Effect::notify(p(2), Notice::Stopped),
    ];
    for want in expected {
        assert_eq!(next_effect(&mut observed).await, want);
    }

    let snapshot = runtime.matchmaker().snapshot();
    assert!(snapshot.pairs.is_empty());
    assert_eq!(snapshot.stats.messages_relayed, 1);

    runtime.shutdown().await.expect("Failed to shutdown");
}

#[tokio::test]
async fn test_every_transport_sees_every_effect() {
    let (first, mut first_rx) = ScriptedTransport::new(vec![Event::Connect { participant: p(1) }]);
    let (second, mut second_rx) = ScriptedTransport::new(Vec::new());

    let mut runtime = RuntimeBuilder::new()
        .with_config(AnonchatConfig::testing())
        .add_transport(Box::new(first))
        .add_transport(Box::new(second))
        .build_and_start()
        .await
        .expect("Failed to start runtime");

    let seen = futures::future::join_all([next_effect(&mut first_rx), next_effect(&mut second_rx)]).await;
    assert_eq!(seen, vec![Effect::notify(p(1), Notice::Waiting); 2]);

    runtime.shutdown().await.expect("Failed to shutdown");
}

#[tokio::test]
async fn test_report_count_command() {
    let mut runtime = RuntimeBuilder::new()
        .with_config(AnonchatConfig::testing())
        .build_and_start()
        .await
        .expect("Failed to start runtime");
    let mut app_events = runtime
        .take_app_event_receiver()
        .expect("Failed to get app event receiver");
    let mut effects = runtime.subscribe_effects();

    assert_ok!(runtime.send_event(Event::Connect { participant: p(1) }).await);
    assert_ok!(runtime.send_event(Event::Connect { participant: p(2) }).await);
    assert_ok!(runtime.send_event(Event::Report { participant: p(1) }).await);

    // Commands and events are separate queues; wait for the report to land first.
    loop {
        if next_broadcast(&mut effects).await == Effect::notify(p(1), Notice::Reported) {
            break;
        }
    }

    assert_ok!(
        runtime
            .send_command(Command::GetReportCount { participant: p(2) })
            .await
    );
    let event = timeout(STEP_TIMEOUT, app_events.recv())
        .await
        .expect("App event should arrive within timeout")
        .expect("App event channel closed");
    assert_eq!(
        event,
        AppEvent::ReportCount {
            participant: p(2),
            count: 1,
        }
    );

    runtime.shutdown().await.expect("Failed to shutdown");
}

#[tokio::test]
async fn test_flagged_participant_reaches_operator() {
    let config = AnonchatConfig {
        matching: MatchingConfig {
            report_alert_threshold: 1,
            ..MatchingConfig::default()
        },
        ..AnonchatConfig::testing()
    };
    let mut runtime = RuntimeBuilder::new()
        .with_config(config)
        .build_and_start()
        .await
        .expect("Failed to start runtime");
    let mut app_events = runtime
        .take_app_event_receiver()
        .expect("Failed to get app event receiver");

    for event in [
        Event::Connect { participant: p(10) },
        Event::Connect { participant: p(11) },
        Event::Report { participant: p(11) },
    ] {
        assert_ok!(runtime.send_event(event).await);
    }

    let event = timeout(STEP_TIMEOUT, app_events.recv())
        .await
        .expect("Flag should arrive within timeout")
        .expect("App event channel closed");
    assert_eq!(
        event,
        AppEvent::ParticipantFlagged {
            participant: p(10),
            reports: 1,
        }
    );

    runtime.shutdown().await.expect("Failed to shutdown");
}

#[tokio::test]
async fn test_concurrent_senders_keep_engine_consistent() {
    let mut runtime = RuntimeBuilder::new()
        .with_config(AnonchatConfig::testing())
        .verify_invariants(true)
        .build_and_start()
        .await
        .expect("Failed to start runtime");

    let senders = (0..20u64).map(|raw| {
        let events = runtime.event_sender();
        async move {
            events.send(Event::Connect { participant: p(raw) }).await?;
            events.send(Event::Next { participant: p(raw) }).await
        }
    });
    for result in futures::future::join_all(senders).await {
        assert!(result.is_ok());
    }

    let matchmaker = runtime.matchmaker().clone();
    timeout(STEP_TIMEOUT, async {
        // Each Next issues one more connect request
        while matchmaker.stats().connect_requests < 40 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("All events should be processed within timeout");

    matchmaker
        .check_invariants()
        .expect("Engine invariants should hold");
    let snapshot = matchmaker.snapshot();
    assert_eq!(snapshot.participants, 20);
    assert!(snapshot.waiting.len() <= 1);

    runtime.shutdown().await.expect("Failed to shutdown");
}

#[tokio::test]
async fn test_status_report_counts_waiting_participant() {
    let (transport, _observed) = ScriptedTransport::new(vec![Event::Connect { participant: p(5) }]);
    let mut runtime = RuntimeBuilder::new()
        .with_config(AnonchatConfig::testing())
        .add_transport(Box::new(transport))
        .build_and_start()
        .await
        .expect("Failed to start runtime");
    let mut app_events = runtime
        .take_app_event_receiver()
        .expect("Failed to get app event receiver");

    let matchmaker = runtime.matchmaker().clone();
    timeout(STEP_TIMEOUT, async {
        while matchmaker.stats().connect_requests < 1 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("Connect should be processed within timeout");

    assert_ok!(runtime.send_command(Command::GetSystemStatus).await);
    match timeout(STEP_TIMEOUT, app_events.recv()).await {
        Ok(Some(AppEvent::SystemStatusReport {
            participants,
            waiting,
            active_pairs,
            ..
        })) => {
            assert_eq!(participants, 1);
            assert_eq!(waiting, 1);
            assert_eq!(active_pairs, 0);
        }
        other => panic!("Expected status report, got {:?}", other),
    }

    runtime.shutdown().await.expect("Failed to shutdown");
    assert!(!runtime.is_running());
}
