use anyhow::{Context, Result};
use tracing::info;

use crate::alert::AlertEngine;
use crate::domain::PricePoint;
use crate::price::PriceSource;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestReport {
    pub alert_days: usize,
    pub total_days: usize,
    pub breaches: Vec<PricePoint>,
}

/// Threshold-only replay: no cooldown, no dispatch, no state.
pub fn replay(series: &[PricePoint], engine: &AlertEngine) -> BacktestReport {
    let mut ordered = series.to_vec();
    ordered.sort_by_key(|p| p.date);

    let breaches: Vec<PricePoint> = ordered
        .iter()
        .filter(|p| engine.is_breach(p.close))
        .copied()
        .collect();

    BacktestReport {
        alert_days: breaches.len(),
        total_days: ordered.len(),
        breaches,
    }
}

pub async fn run_backtest(
    source: &dyn PriceSource,
    ticker: &str,
    range: &str,
    engine: &AlertEngine,
) -> Result<BacktestReport> {
    info!("📈 Backtesting {} over {} against ${:.2}", ticker, range, engine.threshold());

    let series = source
        .daily_closes(ticker, range)
        .await
        .with_context(|| format!("fetching {range} history for {ticker}"))?;
    let report = replay(&series, engine);

    for point in &report.breaches {
        info!("   - {} closed at ${:.2}", point.date, point.close);
    }
    info!(
        "Backtest complete: {} alert days out of {} total days",
        report.alert_days, report.total_days
    );

    Ok(report)
}
