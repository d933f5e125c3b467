//! Authenticated view of a provider's regions and service endpoints.
//!
//! # Responsibilities
//! - Authenticate once per `init()` call through an `IdentityClient`
//! - Cache service types, endpoints and regions as one immutable snapshot
//! - Track local token expiry from the server's issue/expiry times
//! - Resolve a resource URL to the region of the compute endpoint serving it

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use url::Url;

use crate::catalog::identity::IdentityClient;
use crate::catalog::types::{
    host_port, AuthRequest, AuthResponse, CatalogError, CatalogResult, CatalogTarget, Endpoint,
    IdentityVersion, RawEndpoint,
};
use crate::catalog::COMPUTE_SERVICE;
use crate::observability::metrics;

#[derive(Debug, Clone)]
struct TokenState {
    id: String,
    /// Local instant derived from the server-reported lifetime.
    expires_at: Instant,
}

/// Everything learned from one successful authentication.
///
/// Published as a unit: readers never pair endpoints from one
/// authentication with regions from another.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    token: Option<TokenState>,
    project_id: Option<String>,
    project_name: Option<String>,
    /// Service type → service name.
    service_types: BTreeMap<String, String>,
    /// Service type → endpoints in catalog order.
    endpoints: HashMap<String, Vec<Endpoint>>,
    regions: BTreeSet<String>,
}

impl CatalogSnapshot {
    fn from_response(version: IdentityVersion, response: AuthResponse) -> CatalogResult<Self> {
        let lifetime = (response.token.expires_at - response.token.issued_at)
            .to_std()
            .map_err(|_| {
                CatalogError::Protocol(format!(
                    "token expires ({}) before it was issued ({})",
                    response.token.expires_at, response.token.issued_at
                ))
            })?;
        let expires_at = Instant::now()
            .checked_add(lifetime)
            .ok_or_else(|| CatalogError::Protocol("token lifetime out of range".into()))?;

        let mut service_types = BTreeMap::new();
        let mut endpoints: HashMap<String, Vec<Endpoint>> = HashMap::new();
        let mut regions = BTreeSet::new();

        for service in response.catalog {
            if service.service_type.is_empty() {
                return Err(CatalogError::Protocol("service entry without a type".into()));
            }
            let list = endpoints.entry(service.service_type.clone()).or_default();
            for raw in service.endpoints.iter().filter(|raw| accepts(version, raw)) {
                let endpoint = parse_endpoint(&service.service_type, raw)?;
                regions.insert(endpoint.region.clone());
                list.push(endpoint);
            }
            service_types.insert(service.service_type, service.name);
        }

        Ok(Self {
            token: Some(TokenState {
                id: response.token.id,
                expires_at,
            }),
            project_id: Some(response.project.id),
            project_name: Some(response.project.name),
            service_types,
            endpoints,
            regions,
        })
    }

    pub fn endpoints(&self, service_type: &str) -> &[Endpoint] {
        self.endpoints
            .get(service_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn regions(&self) -> &BTreeSet<String> {
        &self.regions
    }

    pub fn service_types(&self) -> &BTreeMap<String, String> {
        &self.service_types
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    pub fn project_name(&self) -> Option<&str> {
        self.project_name.as_deref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_ref().map(|t| t.id.as_str())
    }

    pub fn token_expires_at(&self) -> Option<Instant> {
        self.token.as_ref().map(|t| t.expires_at)
    }

    /// First compute endpoint whose host and port match `resource_url`.
    pub fn vm_region(&self, resource_url: &Url) -> Option<&str> {
        let target = host_port(resource_url)?;
        self.endpoints(COMPUTE_SERVICE)
            .iter()
            .find(|endpoint| endpoint.host_port().as_ref() == Some(&target))
            .map(|endpoint| endpoint.region.as_str())
    }
}

/// v2 entries are already the public URLs; v3 lists every interface.
fn accepts(version: IdentityVersion, raw: &RawEndpoint) -> bool {
    match version {
        IdentityVersion::V2 => true,
        IdentityVersion::V3 => raw
            .interface
            .as_deref()
            .is_some_and(|i| i.eq_ignore_ascii_case("public")),
    }
}

fn parse_endpoint(service_type: &str, raw: &RawEndpoint) -> CatalogResult<Endpoint> {
    if raw.region.is_empty() {
        return Err(CatalogError::Protocol(format!(
            "{} endpoint {} has no region",
            service_type, raw.url
        )));
    }
    let url = Url::parse(&raw.url).map_err(|e| {
        CatalogError::Protocol(format!(
            "{} endpoint '{}' is not a URL: {}",
            service_type, raw.url, e
        ))
    })?;
    Ok(Endpoint {
        region: raw.region.clone(),
        url,
    })
}

/// Service catalog for one tenant of one identity service.
pub struct ServiceCatalog {
    version: IdentityVersion,
    target: CatalogTarget,
    identity: Arc<dyn IdentityClient>,
    snapshot: ArcSwap<CatalogSnapshot>,
}

impl ServiceCatalog {
    /// Create an unauthenticated catalog. See also `catalog::create_catalog`.
    pub fn new(
        version: IdentityVersion,
        target: CatalogTarget,
        identity: Arc<dyn IdentityClient>,
    ) -> Self {
        Self {
            version,
            target,
            identity,
            snapshot: ArcSwap::from_pointee(CatalogSnapshot::default()),
        }
    }

    fn auth_request(&self) -> CatalogResult<AuthRequest> {
        let domain = match self.version {
            IdentityVersion::V2 => None,
            IdentityVersion::V3 => match self.target.domain.as_deref() {
                Some(domain) if !domain.is_empty() => Some(domain.to_string()),
                _ => {
                    return Err(CatalogError::Protocol(format!(
                        "v3 authentication for tenant '{}' requires a domain",
                        self.target.tenant_name
                    )))
                }
            },
        };

        Ok(AuthRequest {
            version: self.version,
            identity_url: self.target.identity_url.clone(),
            tenant_name: self.target.tenant_name.clone(),
            domain,
            credentials: self.target.credentials.clone(),
            options: self.target.options.clone(),
        })
    }

    /// Authenticate and replace the cached catalog.
    ///
    /// A `Connection` failure is worth retrying; a `Protocol` failure is not.
    /// On failure the previous snapshot stays in place.
    pub fn init(&self) -> CatalogResult<()> {
        let result = self
            .auth_request()
            .and_then(|request| self.identity.authenticate(&request).map_err(CatalogError::from))
            .and_then(|response| CatalogSnapshot::from_response(self.version, response));

        match result {
            Ok(snapshot) => {
                tracing::info!(
                    version = %self.version,
                    tenant = %self.target.tenant_name,
                    project_id = snapshot.project_id().unwrap_or_default(),
                    regions = snapshot.regions.len(),
                    services = snapshot.service_types.len(),
                    "Service catalog authenticated"
                );
                self.snapshot.store(Arc::new(snapshot));
                metrics::record_catalog_auth(self.version.as_str(), "success");
                Ok(())
            }
            Err(e) => {
                let outcome = if e.is_connection() { "connection" } else { "protocol" };
                tracing::warn!(
                    version = %self.version,
                    tenant = %self.target.tenant_name,
                    identity_url = %self.target.identity_url,
                    error = %e,
                    "Service catalog authentication failed"
                );
                metrics::record_catalog_auth(self.version.as_str(), outcome);
                Err(e)
            }
        }
    }

    /// Current snapshot; stays consistent however long it is held.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.snapshot.load_full()
    }

    /// Region of the compute endpoint serving `resource_url`, if any.
    pub fn get_vm_region(&self, resource_url: &str) -> Option<String> {
        let url = match Url::parse(resource_url) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!(url = %resource_url, error = %e, "Unparseable resource URL");
                return None;
            }
        };
        self.snapshot.load().vm_region(&url).map(String::from)
    }

    pub fn endpoints(&self, service_type: &str) -> Vec<Endpoint> {
        self.snapshot.load().endpoints(service_type).to_vec()
    }

    pub fn regions(&self) -> Vec<String> {
        self.snapshot.load().regions.iter().cloned().collect()
    }

    pub fn project_id(&self) -> Option<String> {
        self.snapshot.load().project_id.clone()
    }

    pub fn project_name(&self) -> Option<String> {
        self.snapshot.load().project_name.clone()
    }

    /// Whether the catalog publishes a service of this type.
    pub fn has_service(&self, service_type: &str) -> bool {
        self.snapshot.load().service_types.contains_key(service_type)
    }

    pub fn is_authenticated(&self) -> bool {
        self.snapshot.load().token.is_some()
    }

    pub fn token_expires_at(&self) -> Option<Instant> {
        self.snapshot.load().token_expires_at()
    }

    /// True when no token was obtained or its lifetime has passed.
    pub fn is_token_expired(&self) -> bool {
        self.token_expires_at()
            .map_or(true, |expires_at| Instant::now() >= expires_at)
    }

    pub fn version(&self) -> IdentityVersion {
        self.version
    }

    pub fn identity_url(&self) -> &str {
        &self.target.identity_url
    }

    pub fn tenant_name(&self) -> &str {
        &self.target.tenant_name
    }
}

impl fmt::Debug for ServiceCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceCatalog")
            .field("version", &self.version)
            .field("identity_url", &self.target.identity_url)
            .field("tenant", &self.target.tenant_name)
            .field("regions", &self.regions())
            .finish()
    }
}

impl fmt::Display for ServiceCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.snapshot.load();
        write!(
            f,
            "{} catalog for tenant '{}'",
            self.version, self.target.tenant_name
        )?;
        if let Some(id) = snapshot.project_id() {
            write!(f, " ({})", id)?;
        }
        if snapshot.token.is_none() {
            return write!(f, ": not authenticated");
        }

        let regions: Vec<&str> = snapshot.regions.iter().map(String::as_str).collect();
        write!(f, ": regions [{}]; services", regions.join(", "))?;
        for (i, service_type) in snapshot.service_types.keys().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(
                f,
                "{}{}({})",
                sep,
                service_type,
                snapshot.endpoints(service_type).len()
            )?;
        }
        let remaining = snapshot
            .token_expires_at()
            .map(|at| at.saturating_duration_since(Instant::now()))
            .unwrap_or(Duration::ZERO);
        write!(f, "; token valid for {}s", remaining.as_secs())
    }
}
