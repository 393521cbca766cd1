use std::{fmt::Display, str::FromStr};

use anyhow::{Context, Result, bail};
use url::Url;

use super::config_model::{Database, DotEnvyConfig, HealthServer, PaymentApi, Telegram, Ticket};

const DEFAULT_TELEGRAM_API_BASE_URL: &str = "https://api.telegram.org";

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    load_from(|key| std::env::var(key).ok())
}

/// Builds the configuration from an arbitrary variable source. Blank values count as unset.
pub fn load_from<F>(lookup: F) -> Result<DotEnvyConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| {
        lookup(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };
    let required = |key: &str| var(key).with_context(|| format!("{key} is required"));

    let telegram = Telegram {
        bot_token: required("TELEGRAM_BOT_TOKEN")?,
        api_base_url: parse_url(
            "TELEGRAM_API_BASE_URL",
            &var("TELEGRAM_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API_BASE_URL.to_string()),
        )?,
        poll_timeout: parse_or("TELEGRAM_POLL_TIMEOUT", var("TELEGRAM_POLL_TIMEOUT"), 30)?,
    };

    let payment_api = PaymentApi {
        base_url: parse_url("PAYMENT_API_BASE_URL", &required("PAYMENT_API_BASE_URL")?)?,
        api_key: required("PAYMENT_API_KEY")?,
        timeout: parse_or("PAYMENT_API_TIMEOUT", var("PAYMENT_API_TIMEOUT"), 15)?,
    };

    let price: i64 = parse_or("TICKET_PRICE", var("TICKET_PRICE"), 500)?;
    if price <= 0 {
        bail!("TICKET_PRICE must be a positive amount in minor units, got {price}");
    }

    let currency = var("TICKET_CURRENCY").unwrap_or_else(|| "RUB".to_string());
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        bail!("TICKET_CURRENCY must be a three-letter currency code, got {currency:?}");
    }

    let ticket = Ticket {
        price,
        currency: currency.to_ascii_uppercase(),
    };

    let database = Database {
        sqlite_path: var("SQLITE_PATH").unwrap_or_else(|| "lottery.db".to_string()),
    };

    let health_server = HealthServer {
        port: parse_or("SERVER_PORT", var("SERVER_PORT"), 8080)?,
        timeout: parse_or("SERVER_TIMEOUT", var("SERVER_TIMEOUT"), 30)?,
    };

    Ok(DotEnvyConfig {
        telegram,
        payment_api,
        ticket,
        database,
        health_server,
    })
}

fn parse_or<T>(key: &str, value: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match value {
        Some(raw) => raw
            .parse()
            .map_err(|err| anyhow::anyhow!("{key} is invalid ({raw:?}): {err}")),
        None => Ok(default),
    }
}

fn parse_url(key: &str, raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim_end_matches('/'))
        .with_context(|| format!("{key} is not a valid URL"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("{key} must be an http(s) URL");
    }
    Ok(url)
}
