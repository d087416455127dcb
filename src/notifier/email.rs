use std::time::Duration;

use crate::config::SmtpConfig;
use crate::domain::{AlertEvent, Severity};
use crate::notifier::Notifier;
use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

/// SMTP channel (STARTTLS + login). Price breaches only.
pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailNotifier {
    pub fn new(config: &SmtpConfig, timeout: Duration) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .with_context(|| format!("configuring SMTP relay {}", config.host))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .timeout(Some(timeout))
            .build();

        Ok(Self {
            transport,
            from: config
                .from
                .parse()
                .with_context(|| format!("invalid EMAIL_FROM address '{}'", config.from))?,
            to: config
                .to
                .parse()
                .with_context(|| format!("invalid EMAIL_TO address '{}'", config.to))?,
        })
    }

    pub fn maybe_from_config(config: Option<&SmtpConfig>, timeout: Duration) -> Result<Option<Self>> {
        config.map(|c| Self::new(c, timeout)).transpose()
    }

    pub fn subject(alert: &AlertEvent) -> String {
        format!("P1 ALERT: {} Price Breach!", alert.ticker)
    }

    pub fn body(alert: &AlertEvent) -> String {
        format!(
            "{}\n\nTime: {}",
            alert.message,
            alert.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn name(&self) -> &str {
        "email"
    }

    fn accepts(&self, severity: Severity) -> bool {
        severity == Severity::Critical
    }

    async fn send(&self, alert: &AlertEvent) -> Result<()> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(Self::subject(alert))
            .header(ContentType::TEXT_PLAIN)
            .body(Self::body(alert))
            .context("building alert email")?;

        self.transport
            .send(email)
            .await
            .with_context(|| format!("sending alert email to {}", self.to))?;

        info!("Email alert sent to {}", self.to);
        Ok(())
    }
}
