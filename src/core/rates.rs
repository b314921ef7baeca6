//! Exchange rate snapshot and fetcher abstractions

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use thiserror::Error;

/// A complete rate dataset as returned by one successful upstream call.
///
/// Snapshots are never mutated after construction; a refresh builds a new one and
/// swaps it into the cache whole.
#[derive(Debug, Clone, PartialEq)]
pub struct RateSnapshot {
    base: String,
    rates: BTreeMap<String, f64>,
    fetched_at: DateTime<Utc>,
    body: String,
}

impl RateSnapshot {
    pub fn new(
        base: impl Into<String>,
        rates: BTreeMap<String, f64>,
        fetched_at: DateTime<Utc>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            base: base.into(),
            rates,
            fetched_at,
            body: body.into(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn rates(&self) -> &BTreeMap<String, f64> {
        &self.rates
    }

    pub fn rate(&self, currency: &str) -> Option<f64> {
        self.rates.get(currency).copied()
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// The upstream body exactly as received, served back to clients verbatim.
    pub fn body(&self) -> &str {
        &self.body
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request error: {0}")]
    Network(String),

    #[error("HTTP error: {0}")]
    UpstreamStatus(u16),

    #[error("Failed to parse rates response: {0}")]
    Parse(String),
}

#[async_trait]
pub trait RateFetcher: Send + Sync {
    async fn fetch(&self) -> Result<RateSnapshot, FetchError>;
}
