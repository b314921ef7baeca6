//! Core rate caching abstractions

pub mod cache;
pub mod config;
pub mod gate;
pub mod log;
pub mod rates;
pub mod refresh;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types for cleaner imports
pub use cache::RateCache;
pub use gate::StartupGate;
pub use rates::{FetchError, RateFetcher, RateSnapshot};
pub use refresh::{Refresher, SchedulerHandle};
