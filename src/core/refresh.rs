//! Periodic background refresh of the rate cache

use crate::core::cache::RateCache;
use crate::core::rates::RateFetcher;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

pub struct Refresher {
    fetcher: Arc<dyn RateFetcher>,
    cache: RateCache,
    interval: Duration,
}

impl Refresher {
    pub fn new(fetcher: Arc<dyn RateFetcher>, cache: RateCache, interval: Duration) -> Self {
        Self {
            fetcher,
            cache,
            interval,
        }
    }

    pub fn cache(&self) -> &RateCache {
        &self.cache
    }

    /// Fetches once and installs the result on success. A failure leaves whatever is
    /// cached untouched, so readers keep getting the last good snapshot.
    #[instrument(name = "RateRefresh", skip(self))]
    pub async fn refresh_once(&self) -> bool {
        match self.fetcher.fetch().await {
            Ok(snapshot) => {
                info!(
                    base = %snapshot.base(),
                    currencies = snapshot.rates().len(),
                    "Exchange rates updated"
                );
                self.cache.replace(snapshot);
                true
            }
            Err(e) => {
                warn!(error = %e, "Error fetching rates, keeping cached value");
                false
            }
        }
    }

    /// Waits one interval, refreshes, and repeats until `shutdown` fires or its sender
    /// is dropped. The wait comes first: the caller has just done a fetch of its own.
    pub async fn run_forever(&self, mut shutdown: watch::Receiver<bool>) {
        info!(interval = ?self.interval, "Rate refresher running");
        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {
                    self.refresh_once().await;
                }
                _ = shutdown.changed() => break,
            }
        }
        info!("Rate refresher stopped");
    }

    pub fn spawn(self: Arc<Self>) -> SchedulerHandle {
        let (shutdown, signal) = watch::channel(false);
        let task = tokio::spawn(async move { self.run_forever(signal).await });
        SchedulerHandle { shutdown, task }
    }
}

/// The single running refresh loop.
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn shutdown(self) {
        // The receiver is gone only if the loop already exited.
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "Rate refresher task ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{ScriptedFetcher, snapshot, timeout};

    const INTERVAL: Duration = Duration::from_secs(7200);

    fn refresher(fetcher: &Arc<ScriptedFetcher>) -> Arc<Refresher> {
        Arc::new(Refresher::new(fetcher.clone(), RateCache::new(), INTERVAL))
    }

    #[tokio::test]
    async fn test_refresh_once_populates_cache() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![Ok(snapshot("USD", 0.9))]));
        let refresher = refresher(&fetcher);

        assert!(refresher.cache().read().is_none());
        assert!(refresher.refresh_once().await);

        let cached = refresher.cache().read().unwrap();
        assert_eq!(cached.base(), "USD");
        assert_eq!(cached.rate("EUR"), Some(0.9));
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_last_good_snapshot() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![
            Ok(snapshot("USD", 0.9)),
            Err(timeout()),
            Err(crate::core::rates::FetchError::UpstreamStatus(500)),
        ]));
        let refresher = refresher(&fetcher);

        assert!(refresher.refresh_once().await);
        assert!(!refresher.refresh_once().await);
        assert!(!refresher.refresh_once().await);

        let cached = refresher.cache().read().unwrap();
        assert_eq!(cached.rate("EUR"), Some(0.9));
    }

    #[tokio::test]
    async fn test_failed_refresh_on_empty_cache_stays_empty() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![Err(timeout())]));
        let refresher = refresher(&fetcher);

        assert!(!refresher.refresh_once().await);
        assert!(refresher.cache().read().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_recovers_from_timeout_on_next_tick() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![
            Ok(snapshot("USD", 0.9)),
            Err(timeout()),
            Ok(snapshot("USD", 0.8)),
        ]));
        let refresher = refresher(&fetcher);
        let handle = Arc::clone(&refresher).spawn();
        let second = Duration::from_secs(1);

        // Nothing is fetched before the first interval elapses
        tokio::time::sleep(INTERVAL - second).await;
        assert_eq!(fetcher.calls(), 0);

        tokio::time::sleep(second * 2).await;
        assert_eq!(refresher.cache().read().unwrap().rate("EUR"), Some(0.9));

        // Tick N times out, the first snapshot is still served
        tokio::time::sleep(INTERVAL).await;
        assert_eq!(fetcher.calls(), 2);
        assert_eq!(refresher.cache().read().unwrap().rate("EUR"), Some(0.9));

        // Tick N+1 succeeds and replaces it directly
        tokio::time::sleep(INTERVAL).await;
        assert_eq!(fetcher.calls(), 3);
        assert_eq!(refresher.cache().read().unwrap().rate("EUR"), Some(0.8));

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetches_are_at_least_one_interval_apart() {
        let fetch_duration = Duration::from_secs(3);
        let fetcher = Arc::new(
            ScriptedFetcher::new(vec![
                Ok(snapshot("USD", 0.9)),
                Ok(snapshot("USD", 0.91)),
                Ok(snapshot("USD", 0.92)),
                Ok(snapshot("USD", 0.93)),
            ])
            .with_delay(fetch_duration),
        );
        let refresher = refresher(&fetcher);
        let handle = Arc::clone(&refresher).spawn();

        tokio::time::sleep(INTERVAL * 4 + fetch_duration * 5).await;
        handle.shutdown().await;

        let times = fetcher.call_times();
        assert_eq!(times.len(), 4);
        for pair in times.windows(2) {
            assert!(pair[1] - pair[0] >= INTERVAL + fetch_duration);
        }
        assert_eq!(refresher.cache().read().unwrap().rate("EUR"), Some(0.93));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_the_loop() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![]));
        let refresher = refresher(&fetcher);
        let handle = Arc::clone(&refresher).spawn();

        assert!(!handle.is_finished());
        handle.shutdown().await;

        tokio::time::sleep(INTERVAL * 3).await;
        assert_eq!(fetcher.calls(), 0);
    }
}
