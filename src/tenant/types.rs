//! Tenant cache error definitions.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::error::ErrorKind;
use crate::pool::PoolError;

/// Errors surfaced by tenant caches and the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TenantError {
    /// `initialize()` has not succeeded on this cache.
    #[error("Tenant '{0}' is not initialized")]
    NotInitialized(String),

    /// No compute endpoint serves the resource URL.
    #[error("No region serves '{0}'")]
    NoRoute(String),

    /// The tenant has no pool for this region.
    #[error("Tenant has no pool for region '{0}'")]
    UnknownRegion(String),

    /// The registry knows no provider by this name.
    #[error("Unknown provider '{0}'")]
    UnknownProvider(String),

    /// The provider has no tenant by this name.
    #[error("Provider '{provider}' has no tenant '{tenant}'")]
    UnknownTenant { provider: String, tenant: String },

    /// The identity URL names no supported version.
    #[error("Unsupported identity service version in '{0}'")]
    UnsupportedIdentity(String),

    /// Catalog authentication did not succeed within the attempt limit.
    #[error("Catalog initialization failed after {attempts} attempt(s): {source}")]
    InitFailed {
        attempts: u32,
        #[source]
        source: CatalogError,
    },

    #[error(transparent)]
    Pool(#[from] PoolError),
}

impl TenantError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TenantError::NotInitialized(_)
            | TenantError::NoRoute(_)
            | TenantError::UnknownRegion(_)
            | TenantError::UnknownProvider(_)
            | TenantError::UnknownTenant { .. } => ErrorKind::NoRoute,
            TenantError::UnsupportedIdentity(_) => ErrorKind::Protocol,
            TenantError::InitFailed { source, .. } => source.kind(),
            TenantError::Pool(e) => e.kind(),
        }
    }
}

/// Result type for tenant operations.
pub type TenantResult<T> = Result<T, TenantError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(TenantError::NotInitialized("t".into()).kind(), ErrorKind::NoRoute);
        assert_eq!(
            TenantError::InitFailed {
                attempts: 3,
                source: CatalogError::Connection("refused".into())
            }
            .kind(),
            ErrorKind::Connection
        );
        assert_eq!(
            TenantError::from(PoolError::Drained("p".into())).kind(),
            ErrorKind::Drained
        );
    }

    #[test]
    fn test_error_display() {
        let err = TenantError::InitFailed {
            attempts: 1,
            source: CatalogError::Protocol("bad credentials".into()),
        };
        assert_eq!(
            err.to_string(),
            "Catalog initialization failed after 1 attempt(s): Protocol failure: bad credentials"
        );
    }
}
