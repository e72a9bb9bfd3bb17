use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use chatops_slack_reader::{
    config::Config,
    sinks::{AlertSink, StdoutSink, WebhookSink},
    slack::SlackClient,
    RunOutcome, Runner,
};

#[derive(Parser)]
#[command(author, version, about = "Pass alert details from an incident Slack channel to automation", long_about = None)]
struct Cli {
    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Channel to inspect (overrides SLACK_CHANNEL_ID)
    #[arg(short, long)]
    channel: Option<String>,

    /// Seconds to wait before reading the history (overrides SETTLE_DELAY_SECS)
    #[arg(long)]
    settle_delay: Option<u64>,

    /// Print the alert instead of triggering automation, and do not reply in the channel
    #[arg(long)]
    dry_run: bool,

    /// Exit non-zero when the run fails
    #[arg(long)]
    fail_on_error: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| format!("chatops_slack_reader={},info", cli.log_level));
    tracing_subscriber::fmt().with_env_filter(log_filter).init();

    match run(&cli).await {
        Ok(outcome) => {
            info!("Finished: {}", describe(&outcome));
            ExitCode::SUCCESS
        }
        // The scheduler re-runs failed jobs, which would spam the channel.
        Err(e) if !cli.fail_on_error => {
            error!("{:#}", e);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<RunOutcome> {
    // CLI flags win over the environment
    if let Some(channel) = &cli.channel {
        std::env::set_var("SLACK_CHANNEL_ID", channel);
    }
    let mut config = Config::load().context("Could not load configuration")?;
    if let Some(delay) = cli.settle_delay {
        config.run.settle_delay_secs = delay;
    }
    config.run.dry_run = cli.dry_run;
    info!("Loaded configuration: {:?}", config);

    let slack = Arc::new(SlackClient::new(&config.slack)?);
    let sink: Arc<dyn AlertSink> = if config.run.dry_run {
        Arc::new(StdoutSink::new(Some("json"), true)?)
    } else {
        Arc::new(WebhookSink::new(&config.webhook)?)
    };

    let runner = Runner::new(slack, sink, config.run.clone());
    let outcome = runner
        .run(&config.slack.channel_id)
        .await
        .with_context(|| format!("Could not process channel {}", config.slack.channel_id))?;
    Ok(outcome)
}

fn describe(outcome: &RunOutcome) -> String {
    match outcome {
        RunOutcome::Ignored { channel_name } => format!("ignored channel {}", channel_name),
        RunOutcome::AlertForwarded(event) => format!(
            "forwarded alert {}",
            event.alert.alert_name.as_deref().unwrap_or("<unnamed>")
        ),
        RunOutcome::ForwardFailed { error, .. } => format!("alert found but not forwarded: {}", error),
        RunOutcome::NoAlert => "no alert found".to_string(),
    }
}
