//! Console Transport Adapter
//!
//! Lets several participants share one terminal. Each input line names the
//! participant it comes from:
//!
//! ```text
//! 1 connect
//! 2 interest music
//! 1 hello stranger
//! :status
//! ```
//!
//! Verbs are `start`, `connect` (or `find`), `next`, `stop`, `report`,
//! `interest <tag or free text>`, `clear` and `say <text>`; any other text is
//! relayed as a message. Lines starting with `:` are operator commands
//! (`:status`, `:reports <id>`, `:quit`). Effects are rendered one per line,
//! prefixed with the recipient.

use std::io::BufRead;
use std::sync::Arc;

use anonchat_core::{
    channel::{CommandSender, EffectReceiver, EventSender},
    AnonchatError, AnonchatResult, AppEvent, Command, ContentClassifier, Effect, Event,
    InterestCatalog, Notice, ParticipantId, Payload, SafetyVerdict, TransportTask,
};
use tokio::io::AsyncWriteExt;
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::classifier::KeywordClassifier;
use crate::config::CliAppConfig;

// ----------------------------------------------------------------------------
// Line Parsing
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorCommand {
    Status,
    Reports(ParticipantId),
    Quit,
}

/// What a participant asked for on one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Start,
    Connect,
    Next,
    Stop,
    Report,
    /// Catalog tag or free text to classify
    Interest(String),
    Clear,
    Say(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    /// Empty line or `#` comment
    Blank,
    Operator(OperatorCommand),
    Participant {
        participant: ParticipantId,
        request: Request,
    },
}

/// Parse one console line
pub fn parse_line(line: &str) -> AnonchatResult<ConsoleInput> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(ConsoleInput::Blank);
    }

    if let Some(operator) = line.strip_prefix(':') {
        let mut words = operator.split_whitespace();
        let command = match (words.next(), words.next()) {
            (Some("status"), None) => OperatorCommand::Status,
            (Some("reports"), Some(id)) => OperatorCommand::Reports(id.parse()?),
            (Some("quit" | "exit"), None) => OperatorCommand::Quit,
            _ => {
                return Err(AnonchatError::invalid_input(format!(
                    "unknown operator command: {}",
                    line
                )))
            }
        };
        return Ok(ConsoleInput::Operator(command));
    }

    let (id, rest) = line
        .split_once(char::is_whitespace)
        .ok_or_else(|| AnonchatError::invalid_input("expected `<participant> <verb> [args]`"))?;
    let participant: ParticipantId = id.parse()?;
    let rest = rest.trim();
    let (verb, args) = match rest.split_once(char::is_whitespace) {
        Some((verb, args)) => (verb, args.trim()),
        None => (rest, ""),
    };

    let request = match (verb.to_ascii_lowercase().as_str(), args.is_empty()) {
        ("start", true) => Request::Start,
        ("connect" | "find", true) => Request::Connect,
        ("next", true) => Request::Next,
        ("stop", true) => Request::Stop,
        ("report", true) => Request::Report,
        ("clear", true) => Request::Clear,
        ("interest", false) => Request::Interest(args.to_string()),
        ("say", false) => Request::Say(args.to_string()),
        ("interest" | "say", true) => {
            return Err(AnonchatError::invalid_input(format!("`{}` needs an argument", verb)))
        }
        _ => Request::Say(rest.to_string()),
    };

    Ok(ConsoleInput::Participant {
        participant,
        request,
    })
}

// ----------------------------------------------------------------------------
// Rendering
// ----------------------------------------------------------------------------

pub fn render_notice(notice: &Notice) -> String {
    match notice {
        Notice::Welcome => {
            "👋 Anonymous Chat. Chat privately with strangers worldwide. Try `connect` or `interest <topic>`."
                .to_string()
        }
        Notice::Connected => "✅ Connected!".to_string(),
        Notice::Waiting => "⏳ Waiting for partner...".to_string(),
        Notice::PartnerLeft => "❌ Partner left.".to_string(),
        Notice::Stopped => "❌ Chat stopped.".to_string(),
        Notice::Reported => "🚨 User reported.".to_string(),
        Notice::InterestSet { tag } => format!("✅ Interest set to: {}", tag),
        Notice::InterestCleared => "Interest cleared.".to_string(),
    }
}

pub fn render_effect(effect: &Effect) -> String {
    match effect {
        Effect::Notify {
            participant,
            notice,
        } => format!("[{}] {}", participant, render_notice(notice)),
        Effect::DeliverPayload {
            participant,
            payload,
        } => format!("[{}] 💬 {}", participant, payload.to_text()),
    }
}

pub fn render_app_event(event: &AppEvent) -> String {
    match event {
        AppEvent::SystemStatusReport {
            participants,
            waiting,
            active_pairs,
            stats,
            uptime_seconds,
        } => format!(
            "status: {} participants, {} waiting, {} pairs, {} messages relayed, {} reports, up {}s",
            participants, waiting, active_pairs, stats.messages_relayed, stats.reports_filed, uptime_seconds
        ),
        AppEvent::ReportCount { participant, count } => {
            format!("reports for {}: {}", participant, count)
        }
        AppEvent::ParticipantFlagged {
            participant,
            reports,
        } => format!("⚠️ participant {} has been reported {} times", participant, reports),
        AppEvent::SystemError { error } => format!("error: {}", error),
    }
}

/// Operator line for an app event, as text or as a JSON object
pub fn format_app_event(event: &AppEvent, json: bool) -> crate::error::Result<String> {
    if json {
        Ok(serde_json::to_string(event)?)
    } else {
        Ok(render_app_event(event))
    }
}

// ----------------------------------------------------------------------------
// Console Transport
// ----------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ConsoleOptions {
    pub catalog: InterestCatalog,
    pub classify_free_text: bool,
    pub filter_toxic: bool,
    pub prompt: String,
}

impl Default for ConsoleOptions {
    fn default() -> Self {
        Self::from_config(&CliAppConfig::default())
    }
}

impl ConsoleOptions {
    pub fn from_config(config: &CliAppConfig) -> Self {
        Self {
            catalog: config.core.interests.clone(),
            classify_free_text: config.cli.classify_free_text,
            filter_toxic: config.cli.filter_toxic,
            prompt: config.cli.prompt.clone(),
        }
    }
}

/// What the transport does with one parsed line
#[derive(Debug, Clone, PartialEq, Eq)]
enum Translation {
    Forward(Event),
    Reply {
        participant: ParticipantId,
        text: String,
    },
    Operator(Command),
    Quit,
    Nothing,
}

pub struct ConsoleTransport {
    options: ConsoleOptions,
    classifier: Arc<dyn ContentClassifier>,
    input: mpsc::Receiver<String>,
    output: mpsc::Sender<String>,
    event_sender: Option<EventSender>,
    effect_receiver: Option<EffectReceiver>,
    command_sender: Option<CommandSender>,
}

impl ConsoleTransport {
    /// Transport reading lines from `input` and writing rendered text to `output`
    pub fn new(options: ConsoleOptions, input: mpsc::Receiver<String>, output: mpsc::Sender<String>) -> Self {
        Self {
            options,
            classifier: Arc::new(KeywordClassifier::default()),
            input,
            output,
            event_sender: None,
            effect_receiver: None,
            command_sender: None,
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn ContentClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    async fn translate(&self, input: ConsoleInput) -> Translation {
        let (participant, request) = match input {
            ConsoleInput::Blank => return Translation::Nothing,
            ConsoleInput::Operator(OperatorCommand::Status) => {
                return Translation::Operator(Command::GetSystemStatus)
            }
            ConsoleInput::Operator(OperatorCommand::Reports(participant)) => {
                return Translation::Operator(Command::GetReportCount { participant })
            }
            ConsoleInput::Operator(OperatorCommand::Quit) => return Translation::Quit,
            ConsoleInput::Participant {
                participant,
                request,
            } => (participant, request),
        };

        let event = match request {
            Request::Start => Event::Start { participant },
            Request::Connect => Event::Connect { participant },
            Request::Next => Event::Next { participant },
            Request::Stop => Event::Stop { participant },
            Request::Report => Event::Report { participant },
            Request::Clear => Event::ClearInterest { participant },
            Request::Interest(text) => match self.resolve_interest(&text).await {
                Some(tag) => Event::SetInterest { participant, tag },
                None => {
                    let offered: Vec<&str> = self.options.catalog.iter().collect();
                    return Translation::Reply {
                        participant,
                        text: format!("Unknown interest. Choose one of: {}", offered.join(", ")),
                    };
                }
            },
            Request::Say(text) => {
                if self.options.filter_toxic
                    && self.classifier.check_safety(&text).await == SafetyVerdict::Toxic
                {
                    info!("Blocked toxic message from {}", participant);
                    return Translation::Reply {
                        participant,
                        text: "⚠️ Message blocked.".to_string(),
                    };
                }
                Event::Message {
                    participant,
                    payload: Payload::from(text),
                }
            }
        };
        Translation::Forward(event)
    }

    /// Catalog lookup first, then the classifier when enabled
    async fn resolve_interest(&self, text: &str) -> Option<anonchat_core::InterestTag> {
        if let Some(tag) = self.options.catalog.resolve(text) {
            return Some(tag);
        }
        if !self.options.classify_free_text {
            return None;
        }
        let label = self.classifier.classify_interest(text).await?;
        debug!("Classified {:?} as {}", text, label);
        self.options.catalog.resolve(&label)
    }

    async fn deliver(&self, participant: ParticipantId, line: String) {
        if self.output.send(format!("{}\n", line)).await.is_err() {
            let error = AnonchatError::delivery_failed(participant, "console output closed");
            warn!("{}", error);
        }
    }

    async fn write_line(&self, line: String) {
        if self.output.send(format!("{}\n", line)).await.is_err() {
            debug!("Console output closed, dropping line");
        }
    }

    async fn print_prompt(&self) {
        if !self.options.prompt.is_empty() {
            let _ = self.output.send(self.options.prompt.clone()).await;
        }
    }

    async fn send_operator_command(&self, command: Command) {
        let Some(commands) = &self.command_sender else {
            warn!("No command channel attached, ignoring {:?}", command);
            return;
        };
        if commands.send(command).await.is_err() {
            warn!("Core Logic task is gone, operator command dropped");
        }
    }
}

#[async_trait::async_trait]
impl TransportTask for ConsoleTransport {
    fn attach_channels(
        &mut self,
        event_sender: EventSender,
        effect_receiver: EffectReceiver,
    ) -> AnonchatResult<()> {
        self.event_sender = Some(event_sender);
        self.effect_receiver = Some(effect_receiver);
        Ok(())
    }

    fn attach_command_sender(&mut self, command_sender: CommandSender) {
        self.command_sender = Some(command_sender);
    }

    async fn run(&mut self) -> AnonchatResult<()> {
        let (Some(events), Some(mut effects)) =
            (self.event_sender.clone(), self.effect_receiver.take())
        else {
            return Err(AnonchatError::channel_error(
                "console transport started without channels",
            ));
        };

        self.print_prompt().await;
        loop {
            tokio::select! {
                line = self.input.recv() => {
                    let Some(line) = line else {
                        info!("Console input closed");
                        self.send_operator_command(Command::Shutdown).await;
                        return Ok(());
                    };

                    match parse_line(&line) {
                        Ok(input) => match self.translate(input).await {
                            Translation::Forward(event) => {
                                events.send(event).await.map_err(|_| {
                                    AnonchatError::channel_error("event channel closed")
                                })?;
                            }
                            Translation::Reply { participant, text } => {
                                self.deliver(participant, format!("[{}] {}", participant, text)).await;
                            }
                            Translation::Operator(command) => self.send_operator_command(command).await,
                            Translation::Quit => {
                                self.send_operator_command(Command::Shutdown).await;
                                return Ok(());
                            }
                            Translation::Nothing => {}
                        },
                        Err(e) => {
                            debug!("Ignoring console line {:?}: {}", line, e);
                            self.write_line(format!("? {}", e)).await;
                        }
                    }
                    self.print_prompt().await;
                }

                effect = effects.recv() => match effect {
                    Ok(effect) => self.deliver(effect.recipient(), render_effect(&effect)).await,
                    Err(RecvError::Lagged(missed)) => {
                        warn!("Console transport lagged, {} effect(s) lost", missed);
                    }
                    Err(RecvError::Closed) => return Ok(()),
                },
            }
        }
    }

    fn name(&self) -> &'static str {
        "console"
    }
}

// ----------------------------------------------------------------------------
// Terminal Plumbing
// ----------------------------------------------------------------------------

/// Read stdin lines on a dedicated thread so a pending read never blocks shutdown
pub fn spawn_stdin_reader(buffer: usize) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(buffer);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

/// Write everything sent on the returned channel to stdout
pub fn spawn_stdout_printer(buffer: usize) -> (mpsc::Sender<String>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<String>(buffer);
    let handle = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(chunk) = rx.recv().await {
            if let Err(e) = write_chunk(&mut stdout, &chunk).await {
                warn!("Console output failed: {}", e);
                break;
            }
        }
    });
    (tx, handle)
}

async fn write_chunk(stdout: &mut tokio::io::Stdout, chunk: &str) -> std::io::Result<()> {
    stdout.write_all(chunk.as_bytes()).await?;
    stdout.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use anonchat_core::{
        channel::{create_effect_channel, create_event_channel, create_effect_receiver},
        ChannelConfig, InterestTag, NoopClassifier,
    };
    use tokio::time::{timeout, Duration};

    fn p(raw: u64) -> ParticipantId {
        ParticipantId::new(raw)
    }

    #[test]
    fn test_parse_participant_verbs() {
        assert_eq!(
            parse_line("7 find").unwrap(),
            ConsoleInput::Participant {
                participant: p(7),
                request: Request::Connect,
            }
        );
        assert_eq!(
            parse_line("  3   interest   video games ").unwrap(),
            ConsoleInput::Participant {
                participant: p(3),
                request: Request::Interest("video games".to_string()),
            }
        );
        assert_eq!(
            parse_line("3 NEXT").unwrap(),
            ConsoleInput::Participant {
                participant: p(3),
                request: Request::Next,
            }
        );
    }

    #[test]
    fn test_unknown_verb_is_relayed_as_message() {
        assert_eq!(
            parse_line("2 hello there").unwrap(),
            ConsoleInput::Participant {
                participant: p(2),
                request: Request::Say("hello there".to_string()),
            }
        );
        // A verb with arguments it does not take is just text
        assert_eq!(
            parse_line("2 stop the music").unwrap(),
            ConsoleInput::Participant {
                participant: p(2),
                request: Request::Say("stop the music".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_operator_and_blank_lines() {
        assert_eq!(parse_line("").unwrap(), ConsoleInput::Blank);
        assert_eq!(parse_line("# comment").unwrap(), ConsoleInput::Blank);
        assert_eq!(
            parse_line(":status").unwrap(),
            ConsoleInput::Operator(OperatorCommand::Status)
        );
        assert_eq!(
            parse_line(":reports 12").unwrap(),
            ConsoleInput::Operator(OperatorCommand::Reports(p(12)))
        );
        assert_eq!(
            parse_line(":quit").unwrap(),
            ConsoleInput::Operator(OperatorCommand::Quit)
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_line("connect").is_err());
        assert!(parse_line("abc connect").is_err());
        assert!(parse_line("1 interest").is_err());
        assert!(parse_line(":reports").is_err());
        assert!(parse_line(":dance").is_err());
    }

    #[test]
    fn test_render_uses_bot_texts() {
        assert_eq!(
            render_effect(&Effect::notify(p(1), Notice::Waiting)),
            "[1] ⏳ Waiting for partner..."
        );
        assert_eq!(
            render_effect(&Effect::notify(
                p(2),
                Notice::InterestSet {
                    tag: InterestTag::from("Music")
                }
            )),
            "[2] ✅ Interest set to: Music"
        );
        assert_eq!(
            render_effect(&Effect::DeliverPayload {
                participant: p(2),
                payload: Payload::from("hey"),
            }),
            "[2] 💬 hey"
        );
    }

    #[test]
    fn test_app_event_json_lines() {
        let event = AppEvent::ReportCount {
            participant: p(5),
            count: 2,
        };
        assert_eq!(format_app_event(&event, false).unwrap(), "reports for 5: 2");

        let line = format_app_event(&event, true).unwrap();
        let decoded: AppEvent = serde_json::from_str(&line).unwrap();
        assert_eq!(decoded, event);
    }

    #[tokio::test]
    async fn test_interest_resolution() {
        let (_input_tx, input) = mpsc::channel(4);
        let (output, _output_rx) = mpsc::channel(4);
        let console = ConsoleTransport::new(ConsoleOptions::default(), input, output);

        assert_eq!(
            console.resolve_interest("coding").await,
            Some(InterestTag::from("Coding"))
        );
        assert_eq!(
            console.resolve_interest("I mostly play minecraft").await,
            Some(InterestTag::from("Gaming"))
        );
        // Classifier label outside the catalog
        assert_eq!(console.resolve_interest("gym every day").await, None);

        let console = console.with_classifier(Arc::new(NoopClassifier));
        assert_eq!(console.resolve_interest("I mostly play minecraft").await, None);
    }

    #[tokio::test]
    async fn test_toxic_messages_are_answered_locally() {
        let (_input_tx, input) = mpsc::channel(4);
        let (output, _output_rx) = mpsc::channel(4);
        let options = ConsoleOptions {
            filter_toxic: true,
            ..ConsoleOptions::default()
        };
        let console = ConsoleTransport::new(options, input, output);

        let translation = console
            .translate(ConsoleInput::Participant {
                participant: p(1),
                request: Request::Say("you idiot".to_string()),
            })
            .await;
        assert_eq!(
            translation,
            Translation::Reply {
                participant: p(1),
                text: "⚠️ Message blocked.".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_run_forwards_lines_and_renders_effects() {
        let config = ChannelConfig::testing();
        let (input_tx, input) = mpsc::channel(8);
        let (output, mut output_rx) = mpsc::channel(8);
        let (event_sender, mut event_receiver) = create_event_channel(&config);
        let (effect_sender, _keep) = create_effect_channel(&config);

        let options = ConsoleOptions {
            prompt: String::new(),
            ..ConsoleOptions::default()
        };
        let mut console = ConsoleTransport::new(options, input, output);
        console
            .attach_channels(event_sender, create_effect_receiver(&effect_sender))
            .expect("Failed to attach channels");
        let handle = tokio::spawn(async move { console.run().await });

        input_tx.send("4 connect".to_string()).await.unwrap();
        let event = timeout(Duration::from_secs(1), event_receiver.recv())
            .await
            .expect("Event should arrive within timeout")
            .expect("Event channel closed");
        assert_eq!(event, Event::Connect { participant: p(4) });

        effect_sender
            .send(Effect::notify(p(4), Notice::Waiting))
            .unwrap();
        let line = timeout(Duration::from_secs(1), output_rx.recv())
            .await
            .expect("Output should arrive within timeout")
            .expect("Output channel closed");
        assert_eq!(line, "[4] ⏳ Waiting for partner...\n");

        drop(input_tx);
        let result = timeout(Duration::from_secs(1), handle)
            .await
            .expect("Transport should stop when input closes")
            .expect("Transport task panicked");
        assert!(result.is_ok());
    }
}
