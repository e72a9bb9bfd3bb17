use async_trait::async_trait;

use super::{AlertEvent, AlertSink};
use crate::{Error, Result};

/// Prints events instead of triggering automation. Used for dry runs.
#[derive(Debug)]
pub struct StdoutSink {
    format: String, // "json" or "text"
    pretty: bool,   // For JSON output
}

impl StdoutSink {
    pub fn new(format: Option<&str>, pretty: bool) -> Result<Self> {
        let format = format.unwrap_or("json").to_lowercase();
        if format != "json" && format != "text" {
            return Err(Error::Config(format!(
                "Invalid format for stdout sink: {}. Must be 'json' or 'text'",
                format
            )));
        }
        Ok(Self { format, pretty })
    }

    fn render(&self, event: &AlertEvent) -> Result<String> {
        match self.format.as_str() {
            "json" if self.pretty => event.to_pretty_json(),
            "json" => Ok(serde_json::to_string(event)?),
            _ => {
                let alert = &event.alert;
                Ok(format!(
                    "{} in #{}: installation={} provider={} pipeline={} priority={}",
                    alert.alert_name.as_deref().unwrap_or("<unnamed alert>"),
                    event.slack_channel_name,
                    alert.installation_name.as_deref().unwrap_or("-"),
                    alert.provider.map(|p| p.tag()).unwrap_or("-"),
                    alert.installation_pipeline.map(|p| p.tag()).unwrap_or("-"),
                    alert.priority.as_deref().unwrap_or("-"),
                ))
            }
        }
    }
}

#[async_trait]
impl AlertSink for StdoutSink {
    fn name(&self) -> &'static str {
        "stdout"
    }

    async fn send(&self, event: &AlertEvent) -> Result<()> {
        println!("{}", self.render(event)?);
        Ok(())
    }
}
