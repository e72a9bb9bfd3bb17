//! Slack Web API client backed by reqwest.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{ChannelInfo, SlackApi};
use crate::config::SlackConfig;
use crate::parser::ChatMessage;
use crate::{Error, Result};

/// Every Web API response carries `ok` and, on failure, an error code.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(flatten)]
    body: Option<T>,
}

#[derive(Debug, Deserialize)]
struct InfoBody {
    channel: ChannelInfo,
}

#[derive(Debug, Deserialize)]
struct HistoryBody {
    #[serde(default)]
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct Empty {}

pub struct SlackClient {
    client: Client,
    api_url: String,
    token: String,
}

impl SlackClient {
    pub fn new(config: &SlackConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.api_url, method)
    }

    async fn get<T: DeserializeOwned>(&self, method: &str, channel_id: &str) -> Result<T> {
        debug!(method, channel_id, "Calling Slack API");
        let response = self
            .client
            .get(self.url(method))
            .bearer_auth(&self.token)
            .query(&[("channel", channel_id)])
            .send()
            .await?
            .error_for_status()?;
        unwrap_envelope(method, response.json().await?)
    }

    async fn post<T: DeserializeOwned>(&self, method: &str, payload: serde_json::Value) -> Result<T> {
        debug!(method, "Calling Slack API");
        let response = self
            .client
            .post(self.url(method))
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;
        unwrap_envelope(method, response.json().await?)
    }
}

fn unwrap_envelope<T>(method: &str, envelope: Envelope<T>) -> Result<T> {
    if !envelope.ok {
        let code = envelope.error.unwrap_or_else(|| "unknown_error".to_string());
        return Err(Error::Slack(format!("{} failed: {}", method, code)));
    }
    envelope
        .body
        .ok_or_else(|| Error::Slack(format!("{} returned an unexpected response", method)))
}

#[async_trait]
impl SlackApi for SlackClient {
    async fn conversation_info(&self, channel_id: &str) -> Result<ChannelInfo> {
        let body: InfoBody = self.get("conversations.info", channel_id).await?;
        Ok(body.channel)
    }

    async fn join_conversation(&self, channel_id: &str) -> Result<()> {
        let _: Empty = self
            .post("conversations.join", json!({ "channel": channel_id }))
            .await?;
        Ok(())
    }

    async fn conversation_history(&self, channel_id: &str) -> Result<Vec<ChatMessage>> {
        let body: HistoryBody = self.get("conversations.history", channel_id).await?;
        debug!(channel_id, count = body.messages.len(), "Fetched channel history");
        Ok(body.messages)
    }

    async fn post_message(&self, channel_id: &str, text: &str) -> Result<()> {
        let _: Empty = self
            .post(
                "chat.postMessage",
                json!({ "channel": channel_id, "text": text, "mrkdwn": true }),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_envelope_becomes_slack_error() {
        let envelope: Envelope<Empty> =
            serde_json::from_str(r#"{"ok": false, "error": "channel_not_found"}"#).unwrap();
        match unwrap_envelope("conversations.info", envelope) {
            Err(Error::Slack(msg)) => assert!(msg.contains("channel_not_found")),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_info_envelope() {
        let envelope: Envelope<InfoBody> = serde_json::from_str(
            r#"{"ok": true, "channel": {"id": "C1", "name": "inc-1234-disk", "is_channel": true}}"#,
        )
        .unwrap();
        let body = unwrap_envelope("conversations.info", envelope).unwrap();
        assert_eq!(body.channel.name, "inc-1234-disk");
    }

    #[test]
    fn test_history_envelope_defaults_missing_messages() {
        let envelope: Envelope<HistoryBody> =
            serde_json::from_str(r#"{"ok": true, "has_more": false}"#).unwrap();
        let body = unwrap_envelope("conversations.history", envelope).unwrap();
        assert!(body.messages.is_empty());
    }

    #[test]
    fn test_url_trims_trailing_slash() {
        let config = SlackConfig {
            token: "xoxb-test".to_string(),
            channel_id: "C1".to_string(),
            api_url: "http://127.0.0.1:9000/api/".to_string(),
            timeout_secs: 5,
        };
        let client = SlackClient::new(&config).unwrap();
        assert_eq!(client.url("chat.postMessage"), "http://127.0.0.1:9000/api/chat.postMessage");
    }
}
