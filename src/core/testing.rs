//! Scripted fetcher shared by the unit tests of the refresh and startup components.

use crate::core::rates::{FetchError, RateFetcher, RateSnapshot};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;

pub(crate) fn snapshot(base: &str, eur: f64) -> RateSnapshot {
    let mut rates = BTreeMap::new();
    rates.insert("EUR".to_string(), eur);
    RateSnapshot::new(
        base,
        rates,
        Utc::now(),
        format!(r#"{{"base":"{base}","rates":{{"EUR":{eur}}}}}"#),
    )
}

pub(crate) fn timeout() -> FetchError {
    FetchError::Network("operation timed out".to_string())
}

/// Replays queued results in order; once the queue is drained every call fails.
pub(crate) struct ScriptedFetcher {
    script: Mutex<VecDeque<Result<RateSnapshot, FetchError>>>,
    calls: AtomicUsize,
    started_at: Mutex<Vec<Instant>>,
    delay: Duration,
}

impl ScriptedFetcher {
    pub(crate) fn new(script: Vec<Result<RateSnapshot, FetchError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
            started_at: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn call_times(&self) -> Vec<Instant> {
        self.started_at.lock().unwrap().clone()
    }
}

#[async_trait]
impl RateFetcher for ScriptedFetcher {
    async fn fetch(&self) -> Result<RateSnapshot, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started_at.lock().unwrap().push(Instant::now());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::Network("script exhausted".to_string())))
    }
}
