use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use tracing::debug;

use crate::domain::PricePoint;

#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Most recent daily close for `ticker`.
    async fn latest_close(&self, ticker: &str) -> Result<f64>;

    /// Daily closes over `range` (e.g. "1mo", "1y"), oldest first.
    async fn daily_closes(&self, ticker: &str, range: &str) -> Result<Vec<PricePoint>>;
}

pub struct YahooPriceProvider {
    client: reqwest::Client,
    base_url: String,
}

impl YahooPriceProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("stockwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building price API client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn fetch_chart(&self, ticker: &str, range: &str) -> Result<ChartResult> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);
        debug!("Fetching {} closes for {} from {}", range, ticker, url);

        let response = self
            .client
            .get(&url)
            .query(&[("range", range), ("interval", "1d")])
            .send()
            .await
            .with_context(|| format!("requesting price data for {ticker}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("price API returned {status} for {ticker}"));
        }

        let body: ChartResponse = response
            .json()
            .await
            .with_context(|| format!("decoding price data for {ticker}"))?;
        body.into_result(ticker)
    }
}

#[async_trait]
impl PriceSource for YahooPriceProvider {
    async fn latest_close(&self, ticker: &str) -> Result<f64> {
        let chart = self.fetch_chart(ticker, "1d").await?;
        chart
            .closes()
            .into_iter()
            .rev()
            .flatten()
            .next()
            .ok_or_else(|| anyhow!("no closing price available for {ticker}"))
    }

    async fn daily_closes(&self, ticker: &str, range: &str) -> Result<Vec<PricePoint>> {
        let chart = self.fetch_chart(ticker, range).await?;
        chart.price_points()
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

impl ChartResponse {
    fn into_result(self, ticker: &str) -> Result<ChartResult> {
        if let Some(err) = self.chart.error {
            return Err(anyhow!("price API error for {ticker}: {} ({})", err.description, err.code));
        }
        self.chart
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| anyhow!("price API returned no data for {ticker}"))
    }
}

impl ChartResult {
    fn closes(&self) -> Vec<Option<f64>> {
        self.indicators
            .quote
            .first()
            .map(|q| q.close.clone())
            .unwrap_or_default()
    }

    /// Pairs timestamps with closes, skipping days with no close.
    fn price_points(&self) -> Result<Vec<PricePoint>> {
        let mut points = Vec::with_capacity(self.timestamp.len());
        for (ts, close) in self.timestamp.iter().zip(self.closes()) {
            let Some(close) = close else { continue };
            let date = DateTime::from_timestamp(*ts, 0)
                .ok_or_else(|| anyhow!("invalid timestamp {ts} in price data"))?
                .date_naive();
            points.push(PricePoint { date, close });
        }
        Ok(points)
    }
}
