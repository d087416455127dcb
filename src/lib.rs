pub mod alert;
pub mod backtest;
pub mod config;
pub mod domain;
pub mod monitor;
pub mod notifier;
pub mod price;
pub mod state;
pub mod utils;

use alert::AlertEngine;
use config::{AppConfig, RunMode};
use monitor::Monitor;
use notifier::{ConsoleNotifier, EmailNotifier, NotifierHub, WebhookNotifier};
use price::YahooPriceProvider;
use state::AlertStateStore;
use utils::mask_url;

use anyhow::Result;
use tracing::{error, info};

pub async fn run() -> Result<()> {
    let config = AppConfig::from_env()?;
    let engine = AlertEngine::new(config.threshold, config.cooldown);
    let price_source = YahooPriceProvider::new(&config.price_api_base, config.http_timeout)?;

    info!(
        "🏗️  StockWatch: {} against ${:.2} ({:?} mode)",
        config.ticker, config.threshold, config.mode
    );

    if config.mode == RunMode::Backtest {
        if let Err(e) =
            backtest::run_backtest(&price_source, &config.ticker, &config.backtest_range, &engine).await
        {
            error!("Backtest failed: {:#}", e);
        }
        return Ok(());
    }

    let webhook = WebhookNotifier::maybe_new(config.webhook_url.as_deref(), config.http_timeout)?;
    match &config.webhook_url {
        Some(url) => info!("🔗 Webhook notifications enabled: {}", mask_url(url)),
        None => info!("🔗 Webhook notifications disabled (no WEBHOOK_URL)"),
    }

    let email = EmailNotifier::maybe_from_config(config.smtp.as_ref(), config.http_timeout)?;
    if email.is_some() {
        info!("📧 Email notifications enabled");
    } else {
        info!("📧 Email notifications disabled (no credentials)");
    }

    let notifier = NotifierHub::new()
        .with(ConsoleNotifier::new())
        .with_optional(webhook)
        .with_optional(email);

    let monitor = Monitor::new(
        config.ticker.clone(),
        config.alert_source.clone(),
        engine,
        Box::new(price_source),
        notifier,
        AlertStateStore::new(&config.state_path),
    );

    let outcome = monitor.run().await;
    info!("Cycle finished: {}", outcome.summary());
    Ok(())
}
