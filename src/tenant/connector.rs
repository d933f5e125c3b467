//! Provider connection boundary and the tenant's pool callbacks.
//!
//! # Responsibilities
//! - Define what a pooled provider connection must support (login, close)
//! - Create and log in a connection when a tenant pool needs one
//! - Close connections on trim/drain without ever failing the pool

use std::sync::Arc;

use thiserror::Error;

use crate::catalog::Credentials;
use crate::pool::{PoolBehavior, PoolSettings};

/// Errors reported by provider connections.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    #[error("connect failed: {0}")]
    Connect(String),

    #[error("login failed: {0}")]
    Login(String),

    #[error("close failed: {0}")]
    Close(String),
}

/// An authenticated session against one region of a provider.
pub trait ProviderConnection: Send + Sync + 'static {
    fn login(&mut self, credentials: &Credentials) -> Result<(), ConnectionError>;

    /// Close the session. May be called while the connection is on loan
    /// when its pool is drained.
    fn close(&self) -> Result<(), ConnectionError>;
}

/// Builds provider connections from a pool's settings (region, tenant, ...).
pub trait Connector: Send + Sync + 'static {
    type Connection: ProviderConnection;

    fn connect(&self, settings: &PoolSettings) -> Result<Self::Connection, ConnectionError>;
}

/// Allocator and destructor shared by every region pool of one tenant.
pub struct TenantConnections<C: Connector> {
    /// `provider/tenant`, for logs.
    label: String,
    connector: Arc<C>,
    credentials: Credentials,
}

impl<C: Connector> TenantConnections<C> {
    pub fn new(label: impl Into<String>, connector: Arc<C>, credentials: Credentials) -> Self {
        Self {
            label: label.into(),
            connector,
            credentials,
        }
    }
}

impl<C: Connector> PoolBehavior<C::Connection> for TenantConnections<C> {
    fn allocate(&self, settings: &PoolSettings) -> Option<C::Connection> {
        let region = settings.region().unwrap_or_default();

        let mut connection = match self.connector.connect(settings) {
            Ok(connection) => connection,
            Err(e) => {
                tracing::warn!(tenant = %self.label, region, error = %e, "Failed to create provider connection");
                return None;
            }
        };

        if let Err(e) = connection.login(&self.credentials) {
            tracing::warn!(
                tenant = %self.label,
                region,
                userid = %self.credentials.userid,
                error = %e,
                "Provider login failed"
            );
            if let Err(close) = connection.close() {
                tracing::debug!(tenant = %self.label, region, error = %close, "Close after failed login also failed");
            }
            return None;
        }

        tracing::debug!(tenant = %self.label, region, "Provider connection established");
        Some(connection)
    }

    fn destroy(&self, connection: &C::Connection, settings: &PoolSettings) {
        if let Err(e) = connection.close() {
            tracing::warn!(
                tenant = %self.label,
                region = settings.region().unwrap_or_default(),
                error = %e,
                "Failed to close provider connection"
            );
        }
    }
}
