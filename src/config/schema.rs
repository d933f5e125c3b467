//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pool::{PoolBounds, PoolResult};
use crate::resilience::retries::RetryPolicy;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,

    /// Cloud providers and their tenants.
    pub providers: Vec<ProviderConfig>,
}

impl LifecycleConfig {
    pub fn provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.name == name)
    }
}

/// One cloud provider (identity endpoint + pooling policy).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Unique provider name, used in pool labels.
    pub name: String,

    /// Identity service URL; its path carries the version tag (`/v2.0`, `/v3`).
    pub identity_url: String,

    /// Connector identifier handed to each pool's settings.
    #[serde(default = "default_connector")]
    pub connector: String,

    #[serde(default)]
    pub pool: PoolConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    /// Optional HTTP proxy for identity and compute calls.
    #[serde(default)]
    pub proxy: Option<ProxyConfig>,

    /// Hosts whose TLS certificates are trusted without verification.
    #[serde(default)]
    pub trusted_hosts: Vec<String>,

    #[serde(default)]
    pub tenants: Vec<TenantConfig>,
}

fn default_connector() -> String {
    "compute".to_string()
}

impl ProviderConfig {
    pub fn new(name: impl Into<String>, identity_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identity_url: identity_url.into(),
            connector: default_connector(),
            pool: PoolConfig::default(),
            retry: RetryConfig::default(),
            proxy: None,
            trusted_hosts: Vec::new(),
            tenants: Vec::new(),
        }
    }

    pub fn tenant(&self, name: &str) -> Option<&TenantConfig> {
        self.tenants.iter().find(|t| t.name == name)
    }
}

/// Pool bounds as written in the file. `max_size = 0` means unbounded.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolConfig {
    pub min_size: i64,
    pub max_size: i64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_size: 0,
            max_size: 10,
        }
    }
}

impl PoolConfig {
    pub fn bounds(&self) -> PoolResult<PoolBounds> {
        PoolBounds::new(self.min_size, self.max_size)
    }
}

/// Identity authentication retry settings.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Base delay between attempts in seconds (multiplied by attempts so far).
    pub delay_secs: u64,

    /// Maximum number of authentication attempts.
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            delay_secs: 5,
            max_attempts: 3,
        }
    }
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }

    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, self.delay())
    }
}

/// HTTP proxy endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Tenant credentials.
#[derive(Clone, Deserialize, Serialize)]
pub struct TenantConfig {
    /// Tenant (project) name.
    pub name: String,

    /// Domain, required by v3 identity services.
    #[serde(default)]
    pub domain: Option<String>,

    pub userid: String,

    #[serde(skip_serializing, default)]
    pub password: String,
}

impl fmt::Debug for TenantConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TenantConfig")
            .field("name", &self.name)
            .field("domain", &self.domain)
            .field("userid", &self.userid)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
