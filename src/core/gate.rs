//! One-time startup of the rate refresher

use crate::core::cache::RateCache;
use crate::core::refresh::{Refresher, SchedulerHandle};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

/// Starts the background refresher exactly once, after a synchronous first fetch.
///
/// Request handlers call [`StartupGate::ensure_started`] on every request. Once the
/// refresher is running that is a single atomic load; only the requests that race in
/// before it exists wait for the first fetch to complete.
///
/// The first fetch and the launch of the loop run on their own task, so a caller that
/// is dropped while waiting (a client hanging up, say) does not abandon the startup.
pub struct StartupGate {
    refresher: Arc<Refresher>,
    started: Arc<AtomicBool>,
    startup: Mutex<Option<watch::Receiver<bool>>>,
    scheduler: Arc<Mutex<Option<SchedulerHandle>>>,
}

impl StartupGate {
    pub fn new(refresher: Refresher) -> Self {
        Self {
            refresher: Arc::new(refresher),
            started: Arc::new(AtomicBool::new(false)),
            startup: Mutex::new(None),
            scheduler: Arc::new(Mutex::new(None)),
        }
    }

    pub fn cache(&self) -> &RateCache {
        self.refresher.cache()
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    pub async fn ensure_started(&self) {
        if self.is_started() {
            return;
        }

        let mut ready = {
            let mut startup = self.startup.lock().await;
            match startup.as_ref() {
                Some(ready) => {
                    debug!("Refresher startup already in progress");
                    ready.clone()
                }
                None => {
                    let ready = self.launch();
                    *startup = Some(ready.clone());
                    ready
                }
            }
        };

        if ready.wait_for(|done| *done).await.is_err() {
            warn!("Refresher startup task ended before the refresher was running");
        }
    }

    // Called with the startup lock held; spawning never awaits, so the launch is
    // recorded before any caller can be cancelled.
    fn launch(&self) -> watch::Receiver<bool> {
        let (done, ready) = watch::channel(false);
        let refresher = Arc::clone(&self.refresher);
        let started = Arc::clone(&self.started);
        let scheduler = Arc::clone(&self.scheduler);

        tokio::spawn(async move {
            info!("Loading initial exchange rates before serving requests");
            refresher.refresh_once().await;
            let handle = Arc::clone(&refresher).spawn();
            *scheduler.lock().await = Some(handle);
            started.store(true, Ordering::Release);
            // Nobody may be waiting any more; the flag above is what counts.
            let _ = done.send(true);
        });

        ready
    }

    /// Stops the background refresher if it was ever started. A startup still in
    /// flight is allowed to finish first so its loop does not outlive the gate.
    pub async fn shutdown(&self) {
        let pending = self.startup.lock().await.clone();
        if let Some(mut ready) = pending {
            let _ = ready.wait_for(|done| *done).await;
        }

        let handle = self.scheduler.lock().await.take();
        if let Some(handle) = handle {
            handle.shutdown().await;
        }
    }
}
