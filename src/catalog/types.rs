//! Identity request/response types and error definitions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::config::ProxyConfig;
use crate::error::ErrorKind;

/// Identity protocol version, taken from the identity URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IdentityVersion {
    /// Tenant-scoped password authentication.
    V2,
    /// Domain + project scoped authentication.
    V3,
}

impl IdentityVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            IdentityVersion::V2 => "v2",
            IdentityVersion::V3 => "v3",
        }
    }

    /// Whether authentication must be scoped to a domain.
    pub fn requires_domain(self) -> bool {
        matches!(self, IdentityVersion::V3)
    }
}

impl fmt::Display for IdentityVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User id and password for a tenant.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub userid: String,
    pub password: String,
}

impl Credentials {
    pub fn new(userid: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            userid: userid.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("userid", &self.userid)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Transport options for reaching the identity service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthOptions {
    pub proxy: Option<ProxyConfig>,
    pub trusted_hosts: Vec<String>,
}

/// Everything a catalog needs to authenticate for one tenant.
#[derive(Debug, Clone)]
pub struct CatalogTarget {
    pub identity_url: String,
    pub tenant_name: String,
    pub domain: Option<String>,
    pub credentials: Credentials,
    pub options: AuthOptions,
}

/// Authentication request handed to the identity client.
#[derive(Debug, Clone)]
pub struct AuthRequest {
    pub version: IdentityVersion,
    pub identity_url: String,
    pub tenant_name: String,
    /// Always `Some` for V3, always `None` for V2.
    pub domain: Option<String>,
    pub credentials: Credentials,
    pub options: AuthOptions,
}

/// Parsed identity service response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: TokenInfo,
    pub project: ProjectRef,
    #[serde(default)]
    pub catalog: Vec<ServiceEntry>,
}

/// Token as reported by the identity service (server clock).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenInfo {
    pub id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Tenant (project) the token is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub id: String,
    pub name: String,
}

/// One published service and its endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEntry {
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub endpoints: Vec<RawEndpoint>,
}

/// Endpoint as published in the catalog payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEndpoint {
    pub region: String,
    pub url: String,
    /// `public`, `internal` or `admin`; absent in v2 payloads.
    #[serde(default)]
    pub interface: Option<String>,
}

/// A validated endpoint kept in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub region: String,
    pub url: Url,
}

impl Endpoint {
    /// Host (lowercase) and port, with the scheme's default port filled in.
    pub fn host_port(&self) -> Option<(String, Option<u16>)> {
        host_port(&self.url)
    }
}

pub(crate) fn host_port(url: &Url) -> Option<(String, Option<u16>)> {
    url.host_str()
        .map(|h| (h.to_ascii_lowercase(), url.port_or_known_default()))
}

/// Errors reported by an identity client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// The identity service could not be reached.
    #[error("identity service unreachable: {0}")]
    Unreachable(String),

    /// Credentials or scope were refused.
    #[error("authentication rejected: {0}")]
    Rejected(String),

    /// The response could not be interpreted.
    #[error("malformed identity response: {0}")]
    Malformed(String),
}

/// Errors surfaced by `ServiceCatalog::init`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Network or identity service unavailable. Worth retrying.
    #[error("Connection failure: {0}")]
    Connection(String),

    /// Bad credentials, malformed catalog, unsupported version. Not retried.
    #[error("Protocol failure: {0}")]
    Protocol(String),
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::Connection(_) => ErrorKind::Connection,
            CatalogError::Protocol(_) => ErrorKind::Protocol,
        }
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, CatalogError::Connection(_))
    }
}

impl From<IdentityError> for CatalogError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Unreachable(_) => CatalogError::Connection(err.to_string()),
            IdentityError::Rejected(_) | IdentityError::Malformed(_) => {
                CatalogError::Protocol(err.to_string())
            }
        }
    }
}

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;
