//! Per-tenant catalog and region pools.
//!
//! # Responsibilities
//! - Authenticate the tenant's service catalog, retrying connection failures
//! - Create one resource pool per region the catalog reports
//! - Resolve resource URLs to regions and hand out region connections
//! - Drain every pool on shutdown

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::catalog::{create_catalog, CatalogError, CatalogTarget, Credentials, ServiceCatalog};
use crate::config::TenantConfig;
use crate::observability::metrics;
use crate::pool::settings::keys;
use crate::pool::{Lease, PoolBehavior, PoolSettings, ResourcePool};
use crate::resilience::retries::{Sleeper, ThreadSleeper};
use crate::tenant::connector::{Connector, TenantConnections};
use crate::tenant::provider::Provider;
use crate::tenant::types::{TenantError, TenantResult};

type RegionPool<C> = ResourcePool<<C as Connector>::Connection>;

/// Catalog plus region pools for one (provider, tenant) pair.
pub struct TenantCache<C: Connector> {
    provider: Arc<Provider<C>>,
    tenant_name: String,
    tenant_id: Option<String>,
    domain: Option<String>,
    credentials: Credentials,
    catalog: Option<Arc<ServiceCatalog>>,
    pools: HashMap<String, Arc<RegionPool<C>>>,
    initialized: bool,
    sleeper: Arc<dyn Sleeper>,
}

impl<C: Connector> TenantCache<C> {
    pub fn new(
        provider: Arc<Provider<C>>,
        tenant_name: impl Into<String>,
        domain: Option<String>,
        credentials: Credentials,
    ) -> Self {
        Self {
            provider,
            tenant_name: tenant_name.into(),
            tenant_id: None,
            domain,
            credentials,
            catalog: None,
            pools: HashMap::new(),
            initialized: false,
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    pub fn from_config(provider: Arc<Provider<C>>, tenant: &TenantConfig) -> Self {
        Self::new(
            provider,
            tenant.name.clone(),
            tenant.domain.clone(),
            Credentials::new(tenant.userid.clone(), tenant.password.clone()),
        )
    }

    /// Replace the sleeper used between authentication attempts.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    fn label(&self) -> String {
        format!("{}/{}", self.provider.name(), self.tenant_name)
    }

    /// Authenticate and build region pools; reports success as a boolean.
    ///
    /// Failure is logged. A cache that failed to initialize stays
    /// uninitialized and should be discarded.
    pub fn initialize(&mut self) -> bool {
        match self.try_initialize() {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    tenant = %self.label(),
                    error = %e,
                    kind = %e.kind(),
                    "Tenant cache initialization failed"
                );
                false
            }
        }
    }

    /// Like [`initialize`](Self::initialize), returning the failure reason.
    pub fn try_initialize(&mut self) -> TenantResult<()> {
        if self.initialized {
            return Ok(());
        }

        let config = self.provider.config();
        let bounds = config.pool.bounds()?;

        let target = CatalogTarget {
            identity_url: config.identity_url.clone(),
            tenant_name: self.tenant_name.clone(),
            domain: self.domain.clone(),
            credentials: self.credentials.clone(),
            options: self.provider.auth_options(),
        };
        let catalog = create_catalog(target, self.provider.identity())
            .ok_or_else(|| TenantError::UnsupportedIdentity(config.identity_url.clone()))?;

        let policy = config.retry.policy();
        policy
            .run(self.sleeper.as_ref(), CatalogError::is_connection, |attempt| {
                metrics::record_init_attempt(self.provider.name());
                tracing::debug!(tenant = %self.label(), attempt, "Initializing service catalog");
                catalog.init()
            })
            .map_err(|failure| TenantError::InitFailed {
                attempts: failure.attempts,
                source: failure.error,
            })?;

        // Pools carry the name the catalog reports, same as the cache.
        let tenant_name = catalog
            .project_name()
            .unwrap_or_else(|| self.tenant_name.clone());
        let label = format!("{}/{}", self.provider.name(), tenant_name);
        let behavior: Arc<dyn PoolBehavior<C::Connection>> = Arc::new(TenantConnections::new(
            label.clone(),
            self.provider.connector(),
            self.credentials.clone(),
        ));

        let mut pools = HashMap::new();
        for region in catalog.regions() {
            let pool = ResourcePool::new(
                format!("{}/{}", label, region),
                bounds,
                self.pool_settings(&tenant_name, &region),
                behavior.clone(),
            )?;
            pools.insert(region, Arc::new(pool));
        }

        self.tenant_name = tenant_name;
        self.tenant_id = catalog.project_id();
        self.catalog = Some(Arc::new(catalog));
        self.pools = pools;
        self.initialized = true;

        tracing::info!(
            tenant = %self.label(),
            tenant_id = self.tenant_id.as_deref().unwrap_or_default(),
            regions = ?self.regions(),
            "Tenant cache initialized"
        );
        Ok(())
    }

    /// Settings handed to the connector when a region pool needs a connection.
    fn pool_settings(&self, tenant_name: &str, region: &str) -> PoolSettings {
        let config = self.provider.config();
        let settings = PoolSettings::new()
            .with(keys::IDENTITY_URL, &config.identity_url)
            .with(keys::TENANT_NAME, tenant_name)
            .with(keys::CONNECTOR, &config.connector)
            .with(keys::RETRY_DELAY_SECS, config.retry.delay_secs)
            .with(keys::RETRY_LIMIT, config.retry.max_attempts)
            .with(keys::REGION, region);

        if config.trusted_hosts.is_empty() {
            settings
        } else {
            settings.with(keys::TRUSTED_HOSTS, config.trusted_hosts.join(","))
        }
    }

    fn require_initialized(&self) -> TenantResult<&Arc<ServiceCatalog>> {
        match &self.catalog {
            Some(catalog) if self.initialized => Ok(catalog),
            _ => Err(TenantError::NotInitialized(self.label())),
        }
    }

    /// Region whose compute endpoint serves `resource_url`.
    pub fn determine_region(&self, resource_url: &str) -> TenantResult<String> {
        self.require_initialized()?
            .get_vm_region(resource_url)
            .ok_or_else(|| TenantError::NoRoute(resource_url.to_string()))
    }

    pub fn pool(&self, region: &str) -> TenantResult<&Arc<RegionPool<C>>> {
        self.require_initialized()?;
        self.pools
            .get(region)
            .ok_or_else(|| TenantError::UnknownRegion(region.to_string()))
    }

    /// Reserve a connection in `region`.
    pub fn reserve(&self, region: &str) -> TenantResult<Lease<C::Connection>> {
        Ok(self.pool(region)?.reserve()?)
    }

    /// Return a connection reserved from `region`.
    ///
    /// A lease always goes back to the pool that issued it; a mismatched
    /// `region` is logged.
    pub fn release(&self, region: &str, lease: Lease<C::Connection>) -> TenantResult<()> {
        let named = self.pool(region)?;
        if named.owns(&lease) {
            named.release(lease);
            return Ok(());
        }

        match self.pools.iter().find(|(_, pool)| pool.owns(&lease)) {
            Some((owner, pool)) => {
                tracing::warn!(
                    tenant = %self.label(),
                    region,
                    owner = %owner,
                    "Connection released under the wrong region"
                );
                pool.release(lease);
            }
            None => {
                tracing::warn!(
                    tenant = %self.label(),
                    region,
                    pool_id = lease.pool_id(),
                    "Released a connection this tenant did not issue"
                );
            }
        }
        Ok(())
    }

    /// Resolve the region for `resource_url`, run `work` on one of its
    /// connections and release the connection afterwards.
    pub fn with_connection<R>(
        &self,
        resource_url: &str,
        work: impl FnOnce(&C::Connection) -> R,
    ) -> TenantResult<R> {
        let region = self.determine_region(resource_url)?;
        let connection = self.pool(&region)?.checkout()?;
        Ok(work(&connection))
    }

    /// Drain every region pool. Returns the number of connections closed.
    pub fn shutdown(&self) -> usize {
        self.pools.values().map(|pool| pool.drain()).sum()
    }

    /// Regions with a pool, sorted.
    pub fn regions(&self) -> Vec<String> {
        let mut regions: Vec<String> = self.pools.keys().cloned().collect();
        regions.sort();
        regions
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn tenant_name(&self) -> &str {
        &self.tenant_name
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn provider(&self) -> &Arc<Provider<C>> {
        &self.provider
    }

    pub fn catalog(&self) -> Option<&Arc<ServiceCatalog>> {
        self.catalog.as_ref()
    }
}

impl<C: Connector> Drop for TenantCache<C> {
    fn drop(&mut self) {
        let closed = self.shutdown();
        if closed > 0 {
            tracing::debug!(tenant = %self.label(), closed, "Tenant cache dropped");
        }
    }
}

impl<C: Connector> fmt::Debug for TenantCache<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TenantCache")
            .field("provider", &self.provider.name())
            .field("tenant", &self.tenant_name)
            .field("tenant_id", &self.tenant_id)
            .field("initialized", &self.initialized)
            .field("regions", &self.regions())
            .finish()
    }
}
