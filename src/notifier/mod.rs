mod console;
mod email;
mod webhook;

pub use console::ConsoleNotifier;
pub use email::EmailNotifier;
pub use webhook::{WebhookNotifier, WebhookPayload};

use crate::domain::{AlertEvent, Severity};
use anyhow::Result;
use async_trait::async_trait;

/// An outbound alert channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this channel should receive alerts of `severity`.
    fn accepts(&self, _severity: Severity) -> bool {
        true
    }

    async fn send(&self, alert: &AlertEvent) -> Result<()>;
}

/// Result of one channel attempt.
#[derive(Debug)]
pub struct ChannelOutcome {
    pub channel: String,
    pub result: Result<()>,
}

#[derive(Default)]
pub struct NotifierHub {
    channels: Vec<Box<dyn Notifier>>,
}

impl NotifierHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, channel: impl Notifier + 'static) -> Self {
        self.channels.push(Box::new(channel));
        self
    }

    pub fn with_optional(self, channel: Option<impl Notifier + 'static>) -> Self {
        match channel {
            Some(channel) => self.with(channel),
            None => self,
        }
    }

    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    /// Attempts every channel that accepts the alert's severity, in order.
    /// A failing channel never stops the remaining ones.
    pub async fn send(&self, alert: &AlertEvent) -> Vec<ChannelOutcome> {
        let mut outcomes = Vec::new();
        for channel in self.channels.iter().filter(|c| c.accepts(alert.severity)) {
            let result = channel.send(alert).await;
            outcomes.push(ChannelOutcome {
                channel: channel.name().to_string(),
                result,
            });
        }
        outcomes
    }
}
