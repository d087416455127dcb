use std::time::Duration;

use crate::domain::{AlertEvent, Severity};
use crate::notifier::Notifier;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

/// JSON body posted to the webhook endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookPayload {
    pub alert_source: String,
    pub alert_time: String,
    pub severity: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold_breached: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<&'static str>,
    pub message: String,
}

impl From<&AlertEvent> for WebhookPayload {
    fn from(alert: &AlertEvent) -> Self {
        let price_alert = alert.severity == Severity::Critical;
        Self {
            alert_source: alert.source.clone(),
            alert_time: alert.timestamp.to_rfc3339(),
            severity: alert.severity.label(),
            ticker: price_alert.then(|| alert.ticker.clone()),
            current_price: alert.price.filter(|_| price_alert),
            threshold_breached: alert.threshold.filter(|_| price_alert),
            action: price_alert.then_some("BUY_ALERT"),
            message: alert.message.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    url: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building webhook client")?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn maybe_new(url: Option<&str>, timeout: Duration) -> Result<Option<Self>> {
        match url {
            Some(url) if !url.is_empty() => Ok(Some(Self::new(url, timeout)?)),
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn send(&self, alert: &AlertEvent) -> Result<()> {
        let payload = WebhookPayload::from(alert);
        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .context("posting webhook alert")?;

        let status = response.status();
        if status.is_success() {
            info!("Webhook alert sent successfully. Status: {}", status);
            Ok(())
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(anyhow!("webhook returned {status}: {error_text}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn breach() -> AlertEvent {
        let at = Utc.with_ymd_and_hms(2026, 4, 1, 13, 45, 0).unwrap();
        AlertEvent::price_breach("StockWatchMonitor", "GOOGL", 150.5, 160.0, at)
    }

    #[test]
    fn price_alert_payload_carries_price_fields() {
        let value = serde_json::to_value(WebhookPayload::from(&breach())).unwrap();

        assert_eq!(value["alert_source"], "StockWatchMonitor");
        assert_eq!(value["alert_time"], "2026-04-01T13:45:00+00:00");
        assert_eq!(value["severity"], "P1 - Critical");
        assert_eq!(value["ticker"], "GOOGL");
        assert_eq!(value["current_price"], 150.5);
        assert_eq!(value["threshold_breached"], 160.0);
        assert_eq!(value["action"], "BUY_ALERT");
    }

    #[test]
    fn failure_payload_omits_price_fields() {
        let alert = AlertEvent::operational_failure("StockWatchMonitor", "GOOGL", "timed out", Utc::now());
        let value = serde_json::to_value(WebhookPayload::from(&alert)).unwrap();
        let obj = value.as_object().unwrap();

        assert_eq!(value["severity"], "P2 - Warning");
        assert!(obj.contains_key("message"));
        assert!(!obj.contains_key("ticker"));
        assert!(!obj.contains_key("current_price"));
        assert!(!obj.contains_key("threshold_breached"));
        assert!(!obj.contains_key("action"));
    }

    #[tokio::test]
    async fn posts_json_payload() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/hook")
            .match_header("content-type", "application/json")
            .match_body(Matcher::PartialJson(json!({
                "severity": "P1 - Critical",
                "ticker": "GOOGL",
                "current_price": 150.5
            })))
            .with_status(200)
            .create_async()
            .await;

        let notifier = WebhookNotifier::new(format!("{}/hook", server.url()), Duration::from_secs(5)).unwrap();
        notifier.send(&breach()).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn error_status_is_a_failure() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/hook")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let notifier = WebhookNotifier::new(format!("{}/hook", server.url()), Duration::from_secs(5)).unwrap();
        let err = notifier.send(&breach()).await.unwrap_err();

        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn missing_url_disables_channel() {
        assert!(WebhookNotifier::maybe_new(None, Duration::from_secs(5)).unwrap().is_none());
        assert!(WebhookNotifier::maybe_new(Some(""), Duration::from_secs(5)).unwrap().is_none());
    }
}
