use crate::domain::AlertEvent;
use crate::notifier::Notifier;
use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self
    }

    pub fn format_line(alert: &AlertEvent) -> String {
        format!(
            "!!! [{}] {} - {}",
            alert.severity,
            alert.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            alert.message
        )
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    fn name(&self) -> &str {
        "console"
    }

    async fn send(&self, alert: &AlertEvent) -> Result<()> {
        println!("{}", Self::format_line(alert));
        info!("Alert sent to console: {}", alert.title);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn line_includes_severity_time_and_message() {
        let at = Utc.with_ymd_and_hms(2026, 2, 9, 16, 5, 0).unwrap();
        let alert = AlertEvent::price_breach("bot", "GOOGL", 150.0, 160.0, at);

        let line = ConsoleNotifier::format_line(&alert);

        assert!(line.starts_with("!!! [P1 - Critical] 2026-02-09 16:05:00 UTC"));
        assert!(line.contains("GOOGL price ($150.00)"));
    }
}
