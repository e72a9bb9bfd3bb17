use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

pub const DEFAULT_SLACK_API_URL: &str = "https://slack.com/api";
pub const DEFAULT_WEBHOOK_URL: &str = "http://giant-chatops-alert-eventsource-svc:12000/alert";
pub const DEFAULT_CHANNEL_PREFIX: &str = "inc-";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub slack: SlackConfig,
    pub webhook: WebhookConfig,
    pub run: RunConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    pub token: String,
    pub channel_id: String,
    pub api_url: String,
    pub timeout_secs: u64,
}

// The token must never reach the logs.
impl std::fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackConfig")
            .field("token", &"<redacted>")
            .field("channel_id", &self.channel_id)
            .field("api_url", &self.api_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Only channels whose name starts with this are treated as incidents.
    pub channel_prefix: String,
    /// Time given to Opsgenie to post into a fresh channel.
    pub settle_delay_secs: u64,
    #[serde(default)]
    pub dry_run: bool,
}

impl SlackConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl WebhookConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RunConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }
}

fn required(name: &str) -> crate::Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(crate::Error::Config(format!(
            "Environment variable {} must be set",
            name
        ))),
    }
}

fn parse_secs(name: &str, default: u64) -> u64 {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {}={:?}, using {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

impl Config {
    pub fn load() -> crate::Result<Self> {
        // Load environment variables from .env file if it exists
        let _ = dotenvy::dotenv();

        let timeout_secs = parse_secs("HTTP_TIMEOUT_SECS", 30);

        let config = Config {
            slack: SlackConfig {
                token: required("SLACK_TOKEN")?,
                channel_id: required("SLACK_CHANNEL_ID")?,
                api_url: std::env::var("SLACK_API_URL")
                    .unwrap_or_else(|_| DEFAULT_SLACK_API_URL.to_string()),
                timeout_secs,
            },
            webhook: WebhookConfig {
                url: std::env::var("ALERT_WEBHOOK_URL")
                    .unwrap_or_else(|_| DEFAULT_WEBHOOK_URL.to_string()),
                timeout_secs,
            },
            run: RunConfig {
                channel_prefix: std::env::var("INCIDENT_CHANNEL_PREFIX")
                    .unwrap_or_else(|_| DEFAULT_CHANNEL_PREFIX.to_string()),
                settle_delay_secs: parse_secs("SETTLE_DELAY_SECS", 5),
                dry_run: false,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.slack.token.is_empty() {
            return Err(crate::Error::Config("Slack token must not be empty".to_string()));
        }
        if self.slack.channel_id.is_empty() {
            return Err(crate::Error::Config(
                "Slack channel ID must not be empty".to_string(),
            ));
        }
        for (name, raw) in [
            ("SLACK_API_URL", &self.slack.api_url),
            ("ALERT_WEBHOOK_URL", &self.webhook.url),
        ] {
            let url = Url::parse(raw)
                .map_err(|e| crate::Error::Config(format!("Invalid {} {:?}: {}", name, raw, e)))?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(crate::Error::Config(format!(
                    "{} must be an http(s) URL, got {:?}",
                    name, raw
                )));
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            slack: SlackConfig {
                token: "".to_string(),
                channel_id: "".to_string(),
                api_url: DEFAULT_SLACK_API_URL.to_string(),
                timeout_secs: 30,
            },
            webhook: WebhookConfig {
                url: DEFAULT_WEBHOOK_URL.to_string(),
                timeout_secs: 30,
            },
            run: RunConfig {
                channel_prefix: DEFAULT_CHANNEL_PREFIX.to_string(),
                settle_delay_secs: 5,
                dry_run: false,
            },
        }
    }
}
