//! Registry metadata retrieval with a per-name cache and bounded retry.

use crate::registry::{PackageMetadata, Registry, RegistryError};
use crate::{Result, VtreeError};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Which registry failures trigger another attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOn {
    AnyError,
    TransientOnly,
}

/// How many times a registry fetch is attempted and how long to wait
/// between attempts.
///
/// The default makes three attempts with no delay, so tests stay
/// deterministic. [`RetryPolicy::backoff`] waits 3s and then 10s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delays: Vec<Duration>,
    retry_on: RetryOn,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            delays: Vec::new(),
            retry_on: RetryOn::AnyError,
        }
    }
}

impl RetryPolicy {
    pub fn backoff() -> Self {
        RetryPolicy::default().with_delays(vec![Duration::from_secs(3), Duration::from_secs(10)])
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Delay before the n-th retry; the last entry repeats if the list is
    /// shorter than the number of retries.
    pub fn with_delays(mut self, delays: Vec<Duration>) -> Self {
        self.delays = delays;
        self
    }

    pub fn with_retry_on(mut self, retry_on: RetryOn) -> Self {
        self.retry_on = retry_on;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn should_retry(&self, attempt: u32, err: &RegistryError) -> bool {
        if attempt >= self.max_attempts {
            return false;
        }

        match self.retry_on {
            RetryOn::AnyError => true,
            RetryOn::TransientOnly => err.is_transient(),
        }
    }

    /// Wait after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        let index = attempt.saturating_sub(1) as usize;
        self.delays
            .get(index)
            .or_else(|| self.delays.last())
            .copied()
            .filter(|delay| !delay.is_zero())
    }
}

pub struct MetadataFetcher<R> {
    registry: R,
    policy: RetryPolicy,
    cache: Mutex<BTreeMap<String, Arc<PackageMetadata>>>,
}

impl<R: Registry> MetadataFetcher<R> {
    pub fn new(registry: R, policy: RetryPolicy) -> Self {
        MetadataFetcher {
            registry,
            policy,
            cache: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn cached(&self, name: &str) -> Option<Arc<PackageMetadata>> {
        let hit = self.storage().get(name).cloned();
        tracing::debug!(
            "Retrieve {} from fetch cache: {}",
            name,
            if hit.is_some() { "hit" } else { "miss" }
        );
        hit
    }

    /// Metadata for `name`, from the cache when present.
    ///
    /// Two concurrent misses for the same name both go to the registry;
    /// the later one overwrites the cache entry with equivalent data.
    pub async fn fetch(&self, name: &str) -> Result<Arc<PackageMetadata>> {
        if let Some(cached) = self.cached(name) {
            return Ok(cached);
        }

        tracing::debug!("Fetching {}...", name);
        let mut attempt = 0;

        loop {
            attempt += 1;

            match self.registry.fetch(name).await {
                Ok(package) => {
                    let metadata = Arc::new(PackageMetadata::from_registry(name, package));
                    self.storage()
                        .insert(name.to_string(), Arc::clone(&metadata));
                    tracing::debug!(
                        "Store {} to fetch cache: {} versions.",
                        name,
                        metadata.available.len()
                    );
                    return Ok(metadata);
                }
                Err(err) if self.policy.should_retry(attempt, &err) => {
                    tracing::warn!(
                        "fetch attempt {}/{} for {} failed: {}",
                        attempt,
                        self.policy.max_attempts,
                        name,
                        err
                    );
                    if let Some(delay) = self.policy.delay_after(attempt) {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(source) => {
                    return Err(VtreeError::Fetch {
                        name: name.to_string(),
                        attempts: attempt,
                        source,
                    });
                }
            }
        }
    }

    fn storage(&self) -> MutexGuard<'_, BTreeMap<String, Arc<PackageMetadata>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
