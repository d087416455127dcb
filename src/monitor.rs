use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::alert::{AlertEngine, Decision};
use crate::domain::AlertEvent;
use crate::notifier::{ChannelOutcome, NotifierHub};
use crate::price::PriceSource;
use crate::state::AlertStateStore;

/// What a single cycle ended up doing.
#[derive(Debug)]
pub enum CycleOutcome {
    FetchFailed { outcomes: Vec<ChannelOutcome> },
    Healthy { price: f64 },
    Suppressed { price: f64, until: DateTime<Utc> },
    Alerted { price: f64, outcomes: Vec<ChannelOutcome> },
}

impl CycleOutcome {
    pub fn summary(&self) -> String {
        match self {
            CycleOutcome::FetchFailed { .. } => "price fetch failed".to_string(),
            CycleOutcome::Healthy { price } => format!("healthy at ${price:.2}"),
            CycleOutcome::Suppressed { price, .. } => {
                format!("breach at ${price:.2} suppressed by cooldown")
            }
            CycleOutcome::Alerted { price, outcomes } => {
                let delivered = outcomes.iter().filter(|o| o.result.is_ok()).count();
                format!(
                    "alert at ${price:.2} delivered on {delivered}/{} channels",
                    outcomes.len()
                )
            }
        }
    }
}

pub struct Monitor {
    ticker: String,
    alert_source: String,
    engine: AlertEngine,
    price_source: Box<dyn PriceSource>,
    notifier: NotifierHub,
    store: AlertStateStore,
}

impl Monitor {
    pub fn new(
        ticker: impl Into<String>,
        alert_source: impl Into<String>,
        engine: AlertEngine,
        price_source: Box<dyn PriceSource>,
        notifier: NotifierHub,
        store: AlertStateStore,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            alert_source: alert_source.into(),
            engine,
            price_source,
            notifier,
            store,
        }
    }

    pub async fn run(&self) -> CycleOutcome {
        self.run_at(Utc::now()).await
    }

    /// One check at `now`. Never fails; every error is logged and absorbed.
    pub async fn run_at(&self, now: DateTime<Utc>) -> CycleOutcome {
        let mut state = self.store.load_at(now);

        let price = match self.price_source.latest_close(&self.ticker).await {
            Ok(price) => price,
            Err(e) => {
                error!("Error checking stock price for {}: {:#}", self.ticker, e);
                let alert = AlertEvent::operational_failure(
                    format!("{}_Operational_Failure", self.alert_source),
                    &self.ticker,
                    &format!("{e:#}"),
                    now,
                );
                let outcomes = self.dispatch(&alert).await;
                return CycleOutcome::FetchFailed { outcomes };
            }
        };

        info!(
            "[{}] Checked {}: Current Price = ${:.2}",
            now.format("%Y-%m-%d %H:%M:%S"),
            self.ticker,
            price
        );

        let decision = self.engine.evaluate(price, &state, now);
        state.last_price = Some(price);

        let outcome = match decision {
            Decision::Healthy => {
                info!("✅ Status OK: Price is above ${:.2}", self.engine.threshold());
                CycleOutcome::Healthy { price }
            }
            Decision::Suppressed { until } => {
                info!(
                    "🔕 Breach suppressed: cooldown active until {}",
                    until.format("%Y-%m-%d %H:%M:%S UTC")
                );
                CycleOutcome::Suppressed { price, until }
            }
            Decision::Alert => {
                let alert = AlertEvent::price_breach(
                    self.alert_source.as_str(),
                    &self.ticker,
                    price,
                    self.engine.threshold(),
                    now,
                );
                warn!("🚨 {}", alert.message);
                let outcomes = self.dispatch(&alert).await;
                state.last_alert_time = Some(now);
                CycleOutcome::Alerted { price, outcomes }
            }
        };

        self.store.save(&state);
        outcome
    }

    async fn dispatch(&self, alert: &AlertEvent) -> Vec<ChannelOutcome> {
        let outcomes = self.notifier.send(alert).await;
        for outcome in &outcomes {
            match &outcome.result {
                Ok(()) => info!("📨 {} alert delivered via {}", alert.severity, outcome.channel),
                Err(e) => warn!("{} notification failed: {:#}", outcome.channel, e),
            }
        }
        outcomes
    }
}
