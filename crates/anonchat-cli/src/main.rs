//! Anonchat CLI entry point

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};

use anonchat_cli::{
    cli::{Cli, Commands},
    config::CliAppConfig,
    console::{format_app_event, spawn_stdin_reader, spawn_stdout_printer},
    ConsoleOptions, ConsoleTransport, Result,
};
use anonchat_core::{channel::AppEventReceiver, AnonchatError};
use anonchat_runtime::RuntimeBuilder;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_configuration(&cli).context("Failed to load configuration")?;

    setup_logging(cli.verbose || config.cli.verbose);

    match cli.command {
        Commands::Run { json } => run(config, json).await.context("Chat session failed")?,
        Commands::ExampleConfig => print!("{}", CliAppConfig::example_config()),
        Commands::CheckConfig => print!("{}", config.to_toml()?),
    }
    Ok(())
}

/// Setup logging based on verbosity level
///
/// Logs go to stderr; stdout carries the console transcript.
fn setup_logging(verbose: bool) {
    let log_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

fn load_configuration(cli: &Cli) -> Result<CliAppConfig> {
    Ok(CliAppConfig::load(cli.config.as_deref().map(Path::new))?)
}

async fn run(config: CliAppConfig, json: bool) -> Result<()> {
    let channels = &config.core.channels;
    let (output, printer) = spawn_stdout_printer(channels.effect_buffer_size);
    let console = ConsoleTransport::new(
        ConsoleOptions::from_config(&config),
        spawn_stdin_reader(channels.event_buffer_size),
        output.clone(),
    );

    let mut runtime = RuntimeBuilder::new()
        .with_config(config.core.clone())
        .add_transport(Box::new(console))
        .build_and_start()
        .await?;

    let app_events = runtime
        .take_app_event_receiver()
        .ok_or_else(|| AnonchatError::channel_error("app event receiver already taken"))?;
    let reporter = tokio::spawn(report_app_events(app_events, output, json));

    info!("Anonchat running; type `<id> connect` to start, `:quit` to exit");

    tokio::select! {
        result = runtime.wait() => {
            if let Err(e) = result {
                warn!("Core Logic task stopped with error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
        }
    }

    runtime.shutdown().await?;
    reporter.abort();
    // The printer drains once the last output sender is dropped
    let _ = tokio::time::timeout(Duration::from_secs(1), printer).await;
    info!("Anonchat exited");
    Ok(())
}

/// Print operator events next to the console transcript
async fn report_app_events(mut app_events: AppEventReceiver, output: mpsc::Sender<String>, json: bool) {
    while let Some(event) = app_events.recv().await {
        let line = match format_app_event(&event, json) {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to format app event: {}", e);
                continue;
            }
        };
        if output.send(format!("{}\n", line)).await.is_err() {
            break;
        }
    }
}
