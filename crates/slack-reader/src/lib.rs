pub mod config;
pub mod parser;
pub mod runner;
pub mod sinks;
pub mod slack;
pub mod template;

use thiserror::Error;

pub use parser::{find_alert_in_history, AlertRecord, ChatMessage};
pub use runner::{RunOutcome, Runner};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Slack API error: {0}")]
    Slack(String),
    #[error("Webhook error: {0}")]
    Webhook(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("Template error: {0}")]
    Template(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
