//! Provider-level registry of initialized tenant caches.
//!
//! # Responsibilities
//! - Hold the configured providers
//! - Initialize a tenant cache on first use and share it afterwards
//! - Never keep a cache whose initialization failed
//! - Drain pools on eviction and shutdown

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;

use crate::resilience::retries::{Sleeper, ThreadSleeper};
use crate::tenant::cache::TenantCache;
use crate::tenant::connector::Connector;
use crate::tenant::provider::Provider;
use crate::tenant::types::{TenantError, TenantResult};

/// (provider name, tenant name)
type TenantKey = (String, String);

/// Initialized tenant caches keyed by provider and tenant.
pub struct TenantRegistry<C: Connector> {
    providers: HashMap<String, Arc<Provider<C>>>,
    caches: DashMap<TenantKey, Arc<TenantCache<C>>>,
    sleeper: Arc<dyn Sleeper>,
}

impl<C: Connector> TenantRegistry<C> {
    pub fn new(providers: impl IntoIterator<Item = Provider<C>>) -> Self {
        let providers = providers
            .into_iter()
            .map(|p| (p.name().to_string(), Arc::new(p)))
            .collect();
        Self {
            providers,
            caches: DashMap::new(),
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    /// Sleeper handed to every tenant cache this registry creates.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn provider(&self, name: &str) -> Option<&Arc<Provider<C>>> {
        self.providers.get(name)
    }

    /// Cached tenant, if it has already been initialized.
    pub fn get(&self, provider: &str, tenant: &str) -> Option<Arc<TenantCache<C>>> {
        self.caches
            .get(&(provider.to_string(), tenant.to_string()))
            .map(|entry| entry.value().clone())
    }

    /// Return the tenant's cache, initializing it first if needed.
    ///
    /// Initialization runs without holding any registry lock. If two callers
    /// race, the first cache stored wins and the other is dropped.
    pub fn get_or_initialize(&self, provider: &str, tenant: &str) -> TenantResult<Arc<TenantCache<C>>> {
        if let Some(cache) = self.get(provider, tenant) {
            return Ok(cache);
        }

        let provider_ref = self
            .providers
            .get(provider)
            .ok_or_else(|| TenantError::UnknownProvider(provider.to_string()))?;
        let tenant_config = provider_ref.config().tenant(tenant).ok_or_else(|| {
            TenantError::UnknownTenant {
                provider: provider.to_string(),
                tenant: tenant.to_string(),
            }
        })?;

        let mut cache = TenantCache::from_config(provider_ref.clone(), tenant_config)
            .with_sleeper(self.sleeper.clone());
        cache.try_initialize()?;

        let key = (provider.to_string(), tenant.to_string());
        let stored = self
            .caches
            .entry(key)
            .or_insert_with(|| Arc::new(cache))
            .value()
            .clone();
        Ok(stored)
    }

    /// Drop a tenant's cache and drain its pools. Returns whether it existed.
    pub fn evict(&self, provider: &str, tenant: &str) -> bool {
        match self.caches.remove(&(provider.to_string(), tenant.to_string())) {
            Some((_, cache)) => {
                let closed = cache.shutdown();
                tracing::info!(provider, tenant, closed, "Tenant cache evicted");
                true
            }
            None => false,
        }
    }

    /// Drain and forget every cached tenant. Returns connections closed.
    pub fn shutdown(&self) -> usize {
        let keys: Vec<TenantKey> = self.caches.iter().map(|entry| entry.key().clone()).collect();
        let mut closed = 0;
        for key in keys {
            if let Some((_, cache)) = self.caches.remove(&key) {
                closed += cache.shutdown();
            }
        }
        tracing::info!(closed, "Tenant registry shut down");
        closed
    }

    pub fn len(&self) -> usize {
        self.caches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.caches.is_empty()
    }
}
