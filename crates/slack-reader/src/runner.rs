//! One pass over an incident channel: find the alert, hand it on, and tell
//! the channel what happened.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::RunConfig;
use crate::parser::{classify_message, scan_history};
use crate::sinks::{AlertEvent, AlertSink};
use crate::slack::SlackApi;
use crate::template::{render_reply, Reply};
use crate::{Error, Result};

/// Posted into the channel once its alert was handed on. Finding it in the
/// history tells later runs the channel was already handled.
pub fn done_marker(channel_id: &str) -> String {
    format!("[chatops-slack-reader done for channel {}]", channel_id)
}

#[derive(Debug)]
pub enum RunOutcome {
    /// The channel is not an incident channel.
    Ignored { channel_name: String },
    AlertForwarded(AlertEvent),
    ForwardFailed { event: AlertEvent, error: Error },
    /// Nothing alert-shaped in the history yet; the channel was asked for one.
    NoAlert,
}

pub struct Runner {
    slack: Arc<dyn SlackApi>,
    sink: Arc<dyn AlertSink>,
    config: RunConfig,
}

impl Runner {
    pub fn new(slack: Arc<dyn SlackApi>, sink: Arc<dyn AlertSink>, config: RunConfig) -> Self {
        Self {
            slack,
            sink,
            config,
        }
    }

    pub async fn run(&self, channel_id: &str) -> Result<RunOutcome> {
        info!("Channel ID: {}", channel_id);

        let channel = self.slack.conversation_info(channel_id).await?;
        info!("Channel name: {}", channel.name);
        if !channel.name.starts_with(&self.config.channel_prefix) {
            info!(
                "Ignoring channel {}, as the name does not start with '{}'",
                channel.name, self.config.channel_prefix
            );
            return Ok(RunOutcome::Ignored {
                channel_name: channel.name,
            });
        }

        // Give the alert details time to appear in a freshly created channel.
        let delay = self.config.settle_delay();
        if !delay.is_zero() {
            info!("Waiting {:?} before reading the channel history", delay);
            tokio::time::sleep(delay).await;
        }

        self.slack.join_conversation(channel_id).await?;

        let marker = done_marker(channel_id);
        let history = self.slack.conversation_history(channel_id).await?;
        let scan = scan_history(&history, |message| classify_message(message, &marker));
        info!(
            scanned = scan.scanned,
            total = history.len(),
            skipped = scan.diagnostics.len(),
            found = scan.record.is_alert,
            "Scanned channel history"
        );

        let outcome = if scan.record.is_alert {
            let event = AlertEvent::new(scan.record, channel_id, &channel.name);
            match self.sink.send(&event).await {
                Ok(()) => RunOutcome::AlertForwarded(event),
                Err(error) => {
                    error!("Could not trigger alert event via {}: {}", self.sink.name(), error);
                    RunOutcome::ForwardFailed { event, error }
                }
            }
        } else {
            RunOutcome::NoAlert
        };

        if self.config.dry_run {
            info!("Dry run, not posting a reply to the channel");
            return Ok(outcome);
        }

        let reply = match &outcome {
            RunOutcome::AlertForwarded(event) => Reply::AlertForwarded {
                event,
                done_marker: &marker,
            },
            RunOutcome::ForwardFailed { error, .. } => Reply::ForwardFailed { error },
            _ => Reply::NoAlert,
        };
        match render_reply(&reply) {
            Ok(text) => {
                if let Err(e) = self.slack.post_message(channel_id, &text).await {
                    error!("Could not post feedback: {}", e);
                }
            }
            Err(e) => warn!("Could not render feedback: {}", e),
        }

        Ok(outcome)
    }
}
