//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Pool bounds, retry limits, proxy endpoints
//! - Identity URL versions and the domain v3 requires
//! - Unique provider and tenant names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: LifecycleConfig → Result<(), Vec<ValidationError>>

use std::collections::HashSet;

use thiserror::Error;

use crate::catalog::{identity_version, IdentityVersion};
use crate::config::schema::{LifecycleConfig, ProviderConfig};
use crate::pool::PoolError;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("provider name must not be empty")]
    EmptyProviderName,

    #[error("duplicate provider '{0}'")]
    DuplicateProvider(String),

    #[error("provider '{provider}': unsupported identity URL '{url}'")]
    UnsupportedIdentity { provider: String, url: String },

    #[error("provider '{provider}': {source}")]
    PoolBounds { provider: String, source: PoolError },

    #[error("provider '{0}': retry.max_attempts must be at least 1")]
    NoAttempts(String),

    #[error("provider '{0}': proxy needs a host and a non-zero port")]
    InvalidProxy(String),

    #[error("provider '{provider}': duplicate tenant '{tenant}'")]
    DuplicateTenant { provider: String, tenant: String },

    #[error("provider '{provider}': tenant '{tenant}' needs a name and a userid")]
    IncompleteTenant { provider: String, tenant: String },

    #[error("provider '{provider}': tenant '{tenant}' needs a domain for v3 identity")]
    MissingDomain { provider: String, tenant: String },
}

/// Check the whole configuration, collecting every problem found.
pub fn validate_config(config: &LifecycleConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut names = HashSet::new();

    for provider in &config.providers {
        if provider.name.is_empty() {
            errors.push(ValidationError::EmptyProviderName);
        } else if !names.insert(provider.name.as_str()) {
            errors.push(ValidationError::DuplicateProvider(provider.name.clone()));
        }
        validate_provider(provider, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_provider(provider: &ProviderConfig, errors: &mut Vec<ValidationError>) {
    let name = &provider.name;

    let version = identity_version(&provider.identity_url);
    if version.is_none() {
        errors.push(ValidationError::UnsupportedIdentity {
            provider: name.clone(),
            url: provider.identity_url.clone(),
        });
    }

    if let Err(source) = provider.pool.bounds() {
        errors.push(ValidationError::PoolBounds {
            provider: name.clone(),
            source,
        });
    }

    if provider.retry.max_attempts == 0 {
        errors.push(ValidationError::NoAttempts(name.clone()));
    }

    if let Some(proxy) = &provider.proxy {
        if proxy.host.is_empty() || proxy.port == 0 {
            errors.push(ValidationError::InvalidProxy(name.clone()));
        }
    }

    let mut tenants = HashSet::new();
    for tenant in &provider.tenants {
        if tenant.name.is_empty() || tenant.userid.is_empty() {
            errors.push(ValidationError::IncompleteTenant {
                provider: name.clone(),
                tenant: tenant.name.clone(),
            });
        }
        if !tenants.insert(tenant.name.as_str()) {
            errors.push(ValidationError::DuplicateTenant {
                provider: name.clone(),
                tenant: tenant.name.clone(),
            });
        }
        let has_domain = tenant.domain.as_deref().is_some_and(|d| !d.is_empty());
        if version == Some(IdentityVersion::V3) && !has_domain {
            errors.push(ValidationError::MissingDomain {
                provider: name.clone(),
                tenant: tenant.name.clone(),
            });
        }
    }
}
