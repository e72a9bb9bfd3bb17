use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, info};

use super::{AlertEvent, AlertSink};
use crate::config::WebhookConfig;
use crate::{Error, Result};

/// Posts alert events to the automation's event source.
pub struct WebhookSink {
    client: Client,
    url: String,
}

impl WebhookSink {
    pub fn new(config: &WebhookConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }
}

#[async_trait]
impl AlertSink for WebhookSink {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn send(&self, event: &AlertEvent) -> Result<()> {
        debug!(url = %self.url, "Posting alert event");
        let response = self.client.post(&self.url).json(event).send().await?;

        // The event source answers 200 exactly; anything else means the
        // event was not accepted.
        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::Webhook(format!(
                "could not trigger alert event, webhook status was {}",
                status.as_u16()
            )));
        }

        info!(
            channel = %event.slack_channel_name,
            alert = event.alert.alert_name.as_deref().unwrap_or_default(),
            "Triggered alert event"
        );
        Ok(())
    }
}
