//! Per-provider concurrency limits for extraction calls.
//!
//! The gate is built once from [`ConcurrencyConfig`] and shared (it is cheap
//! to clone). Each provider has its own semaphore, so a limit always reflects
//! the provider being called, whatever was called first.

use crate::config::ConcurrencyConfig;
use crate::error::ExtractError;
use crate::model::Provider;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Counting limiter bounding in-flight calls per provider.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    pools: Arc<HashMap<Provider, Pool>>,
}

#[derive(Debug)]
struct Pool {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl ConcurrencyGate {
    pub fn new(config: &ConcurrencyConfig) -> Self {
        let pools = Provider::ALL
            .into_iter()
            .map(|p| {
                let capacity = config.permits(p);
                (
                    p,
                    Pool {
                        semaphore: Arc::new(Semaphore::new(capacity)),
                        capacity,
                    },
                )
            })
            .collect();
        Self {
            pools: Arc::new(pools),
        }
    }

    /// Wait for a free slot. The slot is released when the permit is dropped.
    pub async fn acquire(&self, provider: Provider) -> Result<OwnedSemaphorePermit, ExtractError> {
        let pool = self.pool(provider)?;
        tracing::debug!(
            "Waiting for {provider} permit ({} of {} free)",
            pool.semaphore.available_permits(),
            pool.capacity
        );
        pool.semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ExtractError::Task(format!("{provider} concurrency gate closed")))
    }

    /// Configured pool size for a provider.
    pub fn capacity(&self, provider: Provider) -> usize {
        self.pools.get(&provider).map(|p| p.capacity).unwrap_or(0)
    }

    /// Currently free slots for a provider.
    pub fn available(&self, provider: Provider) -> usize {
        self.pools
            .get(&provider)
            .map(|p| p.semaphore.available_permits())
            .unwrap_or(0)
    }

    fn pool(&self, provider: Provider) -> Result<&Pool, ExtractError> {
        self.pools
            .get(&provider)
            .ok_or_else(|| ExtractError::UnknownProvider(provider.to_string()))
    }
}

impl Default for ConcurrencyGate {
    fn default() -> Self {
        Self::new(&ConcurrencyConfig::default())
    }
}
