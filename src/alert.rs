use chrono::{DateTime, Duration, Utc};

use crate::domain::AlertState;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    /// Price is at or above the threshold.
    Healthy,
    /// Breach inside the cooldown window that ends at `until`.
    Suppressed { until: DateTime<Utc> },
    /// Breach that should be dispatched now.
    Alert,
}

#[derive(Debug, Clone)]
pub struct AlertEngine {
    threshold: f64,
    cooldown: Duration,
}

impl AlertEngine {
    pub fn new(threshold: f64, cooldown: Duration) -> Self {
        Self {
            threshold,
            cooldown,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn is_breach(&self, price: f64) -> bool {
        price < self.threshold
    }

    pub fn evaluate(&self, price: f64, state: &AlertState, now: DateTime<Utc>) -> Decision {
        if !self.is_breach(price) {
            return Decision::Healthy;
        }

        match state.last_alert_time {
            Some(last) if now < last + self.cooldown => Decision::Suppressed {
                until: last + self.cooldown,
            },
            _ => Decision::Alert,
        }
    }
}
