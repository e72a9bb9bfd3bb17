mod client;

pub use client::SlackClient;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::parser::ChatMessage;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: String,
    pub name: String,
}

/// The parts of the Slack Web API the reader talks to.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SlackApi: Send + Sync {
    async fn conversation_info(&self, channel_id: &str) -> Result<ChannelInfo>;
    async fn join_conversation(&self, channel_id: &str) -> Result<()>;
    /// First page of the channel history, newest message first.
    async fn conversation_history(&self, channel_id: &str) -> Result<Vec<ChatMessage>>;
    async fn post_message(&self, channel_id: &str, text: &str) -> Result<()>;
}
