use crate::core::config::AppConfig;
use crate::core::rates::{FetchError, RateFetcher, RateSnapshot};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, instrument};

/// Fetches the latest rates for one base currency from exchangerate-api.com (v6).
pub struct ExchangeRateApiProvider {
    client: reqwest::Client,
    url: String,
    base_currency: String,
    timeout: Duration,
}

impl ExchangeRateApiProvider {
    pub fn new(
        base_url: &str,
        api_key: &str,
        base_currency: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("ratehub/1.0")
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(ExchangeRateApiProvider {
            client,
            url: format!(
                "{}/v6/{}/latest/{}",
                base_url.trim_end_matches('/'),
                api_key,
                base_currency
            ),
            base_currency: base_currency.to_string(),
            timeout,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            &config.api_base_url,
            &config.api_key,
            &config.base_currency,
            config.fetch_timeout(),
        )
    }

    fn request_error(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Network(format!("timed out after {:?}", self.timeout))
        } else {
            // The URL carries the API key; keep it out of error messages and logs.
            FetchError::Network(e.without_url().to_string())
        }
    }
}

#[async_trait]
impl RateFetcher for ExchangeRateApiProvider {
    #[instrument(
        name = "ExchangeRateFetch",
        skip(self),
        fields(base = %self.base_currency)
    )]
    async fn fetch(&self) -> Result<RateSnapshot, FetchError> {
        debug!("Requesting latest rates");

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::UpstreamStatus(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| self.request_error(e))?;
        debug!(bytes = body.len(), "Received rates response");

        parse_snapshot(body, &self.base_currency, Utc::now())
    }
}

/// Builds a snapshot from an upstream body, keeping the body itself for serving.
///
/// Accepts the v6 shape (`base_code`, `conversion_rates`) as well as the common
/// `base`/`rates` shape used by other providers.
pub fn parse_snapshot(
    body: String,
    fallback_base: &str,
    fetched_at: DateTime<Utc>,
) -> Result<RateSnapshot, FetchError> {
    let value: Value =
        serde_json::from_str(&body).map_err(|e| FetchError::Parse(format!("invalid JSON: {e}")))?;
    let object = value
        .as_object()
        .ok_or_else(|| FetchError::Parse("expected a JSON object".to_string()))?;

    let Some(mapping) = object.get("conversion_rates").or_else(|| object.get("rates")) else {
        let detail = match object.get("error-type").and_then(Value::as_str) {
            Some(error_type) => format!("no rate mapping in response (error-type: {error_type})"),
            None => "no rate mapping in response".to_string(),
        };
        return Err(FetchError::Parse(detail));
    };

    let rates: BTreeMap<String, f64> = serde_json::from_value(mapping.clone())
        .map_err(|e| FetchError::Parse(format!("invalid rate mapping: {e}")))?;

    let base = object
        .get("base_code")
        .or_else(|| object.get("base"))
        .and_then(Value::as_str)
        .unwrap_or(fallback_base)
        .to_string();

    Ok(RateSnapshot::new(base, rates, fetched_at, body))
}
