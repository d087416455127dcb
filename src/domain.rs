use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Persisted memory of the monitor between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertState {
    #[serde(default)]
    pub last_alert_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_price: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Price breach.
    Critical,
    /// Operational failure, e.g. the price could not be fetched.
    Warning,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Critical => "P1 - Critical",
            Severity::Warning => "P2 - Warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone)]
pub struct AlertEvent {
    pub source: String,
    pub severity: Severity,
    pub ticker: String,
    pub price: Option<f64>,
    pub threshold: Option<f64>,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl AlertEvent {
    pub fn price_breach(
        source: impl Into<String>,
        ticker: &str,
        price: f64,
        threshold: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            source: source.into(),
            severity: Severity::Critical,
            ticker: ticker.to_string(),
            price: Some(price),
            threshold: Some(threshold),
            title: format!("{ticker} Price Breach"),
            message: format!(
                "🚨 P1 ALERT: {ticker} price (${price:.2}) has dropped BELOW the threshold of ${threshold:.2}."
            ),
            timestamp,
        }
    }

    pub fn operational_failure(
        source: impl Into<String>,
        ticker: &str,
        error: &str,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            source: source.into(),
            severity: Severity::Warning,
            ticker: ticker.to_string(),
            price: None,
            threshold: None,
            title: format!("{ticker} Monitoring Failure"),
            message: format!("Monitoring failure for {ticker}: {error}"),
            timestamp,
        }
    }
}

/// One daily close in a historical series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}
