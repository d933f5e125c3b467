//! Shared mocks for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use tenant_pool::catalog::{
    AuthRequest, AuthResponse, Credentials, IdentityClient, IdentityError, ProjectRef, RawEndpoint,
    ServiceEntry, TokenInfo,
};
use tenant_pool::config::{ProviderConfig, TenantConfig};
use tenant_pool::pool::PoolSettings;
use tenant_pool::tenant::{ConnectionError, Connector, Provider, ProviderConnection};

/// Catalog response with one compute endpoint per `(region, url)`.
pub fn catalog_response(project: &str, compute: &[(&str, &str)]) -> AuthResponse {
    let issued = Utc::now();
    AuthResponse {
        token: TokenInfo {
            id: "token-1".into(),
            issued_at: issued,
            expires_at: issued + Duration::hours(1),
        },
        project: ProjectRef {
            id: format!("{}-id", project),
            name: project.into(),
        },
        catalog: vec![ServiceEntry {
            service_type: "compute".into(),
            name: "nova".into(),
            endpoints: compute
                .iter()
                .map(|(region, url)| RawEndpoint {
                    region: region.to_string(),
                    url: url.to_string(),
                    interface: Some("public".into()),
                })
                .collect(),
        }],
    }
}

/// Identity client that fails with queued errors before succeeding.
pub struct ScriptedIdentity {
    failures: Mutex<VecDeque<IdentityError>>,
    always: Option<IdentityError>,
    response: AuthResponse,
    calls: AtomicUsize,
    requests: Mutex<Vec<AuthRequest>>,
}

impl ScriptedIdentity {
    pub fn new(response: AuthResponse) -> Self {
        Self::failing_first(Vec::new(), response)
    }

    pub fn failing_first(failures: Vec<IdentityError>, response: AuthResponse) -> Self {
        Self {
            failures: Mutex::new(failures.into()),
            always: None,
            response,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn always_failing(error: IdentityError) -> Self {
        Self {
            always: Some(error),
            ..Self::new(catalog_response("demo", &[]))
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<AuthRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

impl IdentityClient for ScriptedIdentity {
    fn authenticate(&self, request: &AuthRequest) -> Result<AuthResponse, IdentityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if let Some(err) = &self.always {
            return Err(err.clone());
        }
        match self.failures.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(self.response.clone()),
        }
    }
}

/// Counters shared by a `FakeConnector` and its connections.
#[derive(Debug, Default)]
pub struct ConnectorLog {
    pub created: AtomicUsize,
    pub closed: AtomicUsize,
    pub fail_login: AtomicBool,
    pub fail_close: AtomicBool,
}

impl ConnectorLog {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct FakeConnection {
    pub id: usize,
    pub region: String,
    pub tenant: String,
    pub userid: Option<String>,
    log: Arc<ConnectorLog>,
}

impl ProviderConnection for FakeConnection {
    fn login(&mut self, credentials: &Credentials) -> Result<(), ConnectionError> {
        if self.log.fail_login.load(Ordering::SeqCst) {
            return Err(ConnectionError::Login("401 Unauthorized".into()));
        }
        self.userid = Some(credentials.userid.clone());
        Ok(())
    }

    fn close(&self) -> Result<(), ConnectionError> {
        self.log.closed.fetch_add(1, Ordering::SeqCst);
        if self.log.fail_close.load(Ordering::SeqCst) {
            return Err(ConnectionError::Close("broken pipe".into()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeConnector {
    pub log: Arc<ConnectorLog>,
}

impl Connector for FakeConnector {
    type Connection = FakeConnection;

    fn connect(&self, settings: &PoolSettings) -> Result<FakeConnection, ConnectionError> {
        let id = self.log.created.fetch_add(1, Ordering::SeqCst);
        Ok(FakeConnection {
            id,
            region: settings.region().unwrap_or_default().to_string(),
            tenant: settings.tenant_name().unwrap_or_default().to_string(),
            userid: None,
            log: self.log.clone(),
        })
    }
}

pub fn tenant_config(name: &str) -> TenantConfig {
    TenantConfig {
        name: name.into(),
        domain: Some("Default".into()),
        userid: "ops".into(),
        password: "secret".into(),
    }
}

/// Provider config with a 3-attempt, 2-second retry policy and one tenant.
pub fn provider_config(identity_url: &str) -> ProviderConfig {
    let mut config = ProviderConfig::new("cloud", identity_url);
    config.retry.max_attempts = 3;
    config.retry.delay_secs = 2;
    config.pool.min_size = 0;
    config.pool.max_size = 2;
    config.trusted_hosts = vec!["keystone.local".into()];
    config.tenants.push(tenant_config("demo"));
    config
}

pub fn provider(
    config: ProviderConfig,
    identity: Arc<ScriptedIdentity>,
) -> (Provider<FakeConnector>, Arc<ConnectorLog>) {
    let connector = Arc::new(FakeConnector::default());
    let log = connector.log.clone();
    (Provider::new(config, identity, connector), log)
}
