pub mod stdout;
pub mod webhook;

pub use stdout::StdoutSink;
pub use webhook::WebhookSink;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;

use crate::parser::AlertRecord;
use crate::Result;

/// The alert as handed to downstream automation: the parsed record plus the
/// channel it was found in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertEvent {
    #[serde(flatten)]
    pub alert: AlertRecord,
    pub slack_channel_id: String,
    pub slack_channel_name: String,
}

impl AlertEvent {
    pub fn new(alert: AlertRecord, channel_id: &str, channel_name: &str) -> Self {
        Self {
            alert,
            slack_channel_id: channel_id.to_string(),
            slack_channel_name: channel_name.to_string(),
        }
    }

    /// JSON indented by four spaces, the way it is shown in the channel.
    pub fn to_pretty_json(&self) -> Result<String> {
        let mut buffer = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
        self.serialize(&mut serializer)?;
        String::from_utf8(buffer).map_err(|e| crate::Error::Internal(e.to_string()))
    }
}

/// Destination for a found alert.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AlertSink: Send + Sync {
    fn name(&self) -> &'static str;
    async fn send(&self, event: &AlertEvent) -> Result<()>;
}
