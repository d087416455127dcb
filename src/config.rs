use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Check,
    Backtest,
}

impl FromStr for RunMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "check" => Ok(RunMode::Check),
            "backtest" => Ok(RunMode::Backtest),
            other => Err(anyhow!("unknown MONITOR_MODE '{other}' (expected check or backtest)")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mode: RunMode,
    pub ticker: String,
    pub threshold: f64,
    pub cooldown: chrono::Duration,
    pub state_path: PathBuf,
    pub webhook_url: Option<String>,
    pub smtp: Option<SmtpConfig>,
    pub alert_source: String,
    pub price_api_base: String,
    pub http_timeout: Duration,
    pub backtest_range: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let mode: RunMode = var_or("MONITOR_MODE", "check").parse()?;
        let ticker = var_or("TICKER_SYMBOL", "GOOGL").trim().to_uppercase();
        if ticker.is_empty() {
            return Err(anyhow!("TICKER_SYMBOL cannot be empty"));
        }

        let threshold = parse_threshold(&var_or("ALERT_PRICE", "160.0"))?;
        let cooldown_hours = parse_cooldown_hours(&var_or("COOLDOWN_HOURS", "24"))?;
        let timeout_secs = parse_timeout_secs(&var_or("HTTP_TIMEOUT_SECS", "5"))?;

        Ok(Self {
            mode,
            ticker,
            threshold,
            cooldown: chrono::Duration::hours(i64::from(cooldown_hours)),
            state_path: PathBuf::from(var_or("STATE_FILE", "alert_state.json")),
            webhook_url: non_empty_var("WEBHOOK_URL"),
            smtp: smtp_from_env()?,
            alert_source: var_or("ALERT_SOURCE", "StockWatchMonitor"),
            price_api_base: var_or("PRICE_API_BASE", "https://query1.finance.yahoo.com")
                .trim_end_matches('/')
                .to_string(),
            http_timeout: Duration::from_secs(timeout_secs),
            backtest_range: var_or("BACKTEST_RANGE", "1y"),
        })
    }
}

fn smtp_from_env() -> Result<Option<SmtpConfig>> {
    smtp_from_parts(
        non_empty_var("SMTP_USERNAME"),
        non_empty_var("SMTP_PASSWORD"),
        non_empty_var("EMAIL_TO"),
        non_empty_var("EMAIL_FROM"),
        var_or("SMTP_HOST", "smtp.gmail.com"),
        &var_or("SMTP_PORT", "587"),
    )
}

/// Email stays disabled unless username, password and recipient are all present.
pub fn smtp_from_parts(
    username: Option<String>,
    password: Option<String>,
    to: Option<String>,
    from: Option<String>,
    host: String,
    port: &str,
) -> Result<Option<SmtpConfig>> {
    let (username, password, to) = match (username, password, to) {
        (Some(u), Some(p), Some(t)) => (u, p, t),
        _ => return Ok(None),
    };

    let port = port
        .trim()
        .parse()
        .with_context(|| format!("SMTP_PORT '{port}' must be a valid port number"))?;
    let from = from.unwrap_or_else(|| username.clone());

    Ok(Some(SmtpConfig {
        host,
        port,
        username,
        password,
        from,
        to,
    }))
}

pub fn parse_cooldown_hours(raw: &str) -> Result<u32> {
    raw.trim()
        .parse()
        .with_context(|| format!("COOLDOWN_HOURS '{raw}' must be a non-negative integer"))
}

pub fn parse_timeout_secs(raw: &str) -> Result<u64> {
    let secs: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("HTTP_TIMEOUT_SECS '{raw}' must be a positive integer"))?;
    if secs == 0 {
        return Err(anyhow!("HTTP_TIMEOUT_SECS must be greater than zero"));
    }
    Ok(secs)
}

pub fn parse_threshold(raw: &str) -> Result<f64> {
    let value: f64 = raw
        .trim()
        .parse()
        .with_context(|| format!("ALERT_PRICE '{raw}' is not a number"))?;
    if !value.is_finite() || value < 0.0 {
        return Err(anyhow!("ALERT_PRICE must be a finite, non-negative price"));
    }
    Ok(value)
}

fn var_or(key: &str, default: &str) -> String {
    non_empty_var(key).unwrap_or_else(|| default.to_string())
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_threshold_with_whitespace() {
        assert_eq!(parse_threshold(" 160.5 ").unwrap(), 160.5);
    }

    #[test]
    fn rejects_non_numeric_threshold() {
        let err = parse_threshold("cheap").unwrap_err();
        assert!(err.to_string().contains("ALERT_PRICE"));
    }

    #[test]
    fn rejects_non_finite_or_negative_threshold() {
        assert!(parse_threshold("NaN").is_err());
        assert!(parse_threshold("inf").is_err());
        assert!(parse_threshold("-1").is_err());
    }

    fn creds(
        username: Option<&str>,
        password: Option<&str>,
        to: Option<&str>,
    ) -> (Option<String>, Option<String>, Option<String>) {
        (
            username.map(str::to_string),
            password.map(str::to_string),
            to.map(str::to_string),
        )
    }

    #[test]
    fn email_disabled_when_any_credential_missing() {
        for (u, p, t) in [
            creds(None, Some("secret"), Some("me@example.com")),
            creds(Some("bot@example.com"), None, Some("me@example.com")),
            creds(Some("bot@example.com"), Some("secret"), None),
        ] {
            let smtp = smtp_from_parts(u, p, t, None, "smtp.example.com".into(), "587").unwrap();
            assert!(smtp.is_none());
        }
    }

    #[test]
    fn email_sender_defaults_to_username() {
        let (u, p, t) = creds(Some("bot@example.com"), Some("secret"), Some("me@example.com"));
        let smtp = smtp_from_parts(u, p, t, None, "smtp.example.com".into(), " 2525 ")
            .unwrap()
            .unwrap();

        assert_eq!(smtp.from, "bot@example.com");
        assert_eq!(smtp.to, "me@example.com");
        assert_eq!(smtp.host, "smtp.example.com");
        assert_eq!(smtp.port, 2525);
    }

    #[test]
    fn explicit_sender_overrides_username() {
        let (u, p, t) = creds(Some("bot@example.com"), Some("secret"), Some("me@example.com"));
        let smtp = smtp_from_parts(u, p, t, Some("alerts@example.com".into()), "smtp.example.com".into(), "587")
            .unwrap()
            .unwrap();

        assert_eq!(smtp.from, "alerts@example.com");
    }

    #[test]
    fn bad_smtp_port_is_a_startup_error() {
        let (u, p, t) = creds(Some("bot@example.com"), Some("secret"), Some("me@example.com"));
        let err = smtp_from_parts(u, p, t, None, "smtp.example.com".into(), "seventy").unwrap_err();
        assert!(err.to_string().contains("SMTP_PORT"));

        let (u, p, t) = creds(Some("bot@example.com"), Some("secret"), Some("me@example.com"));
        assert!(smtp_from_parts(u, p, t, None, "smtp.example.com".into(), "70000").is_err());
    }

    #[test]
    fn bad_port_is_ignored_when_email_disabled() {
        let smtp = smtp_from_parts(None, None, None, None, "smtp.example.com".into(), "seventy").unwrap();
        assert!(smtp.is_none());
    }

    #[test]
    fn parses_cooldown_hours() {
        assert_eq!(parse_cooldown_hours(" 12 ").unwrap(), 12);
        assert_eq!(parse_cooldown_hours("0").unwrap(), 0);
        let err = parse_cooldown_hours("-3").unwrap_err();
        assert!(err.to_string().contains("COOLDOWN_HOURS"));
        assert!(parse_cooldown_hours("a day").is_err());
    }

    #[test]
    fn parses_timeout_secs() {
        assert_eq!(parse_timeout_secs("5").unwrap(), 5);
        let err = parse_timeout_secs("soon").unwrap_err();
        assert!(err.to_string().contains("HTTP_TIMEOUT_SECS"));
        let err = parse_timeout_secs("0").unwrap_err();
        assert!(err.to_string().contains("HTTP_TIMEOUT_SECS"));
    }

    #[test]
    fn parses_run_modes() {
        assert_eq!("check".parse::<RunMode>().unwrap(), RunMode::Check);
        assert_eq!("BACKTEST".parse::<RunMode>().unwrap(), RunMode::Backtest);
        assert_eq!("".parse::<RunMode>().unwrap(), RunMode::Check);
        assert!("daemon".parse::<RunMode>().is_err());
    }
}
