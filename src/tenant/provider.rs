//! A configured cloud provider and its external collaborators.

use std::fmt;
use std::sync::Arc;

use crate::catalog::{AuthOptions, IdentityClient};
use crate::config::ProviderConfig;
use crate::tenant::connector::Connector;

/// Provider settings plus the identity client and connector that reach it.
pub struct Provider<C: Connector> {
    config: ProviderConfig,
    identity: Arc<dyn IdentityClient>,
    connector: Arc<C>,
}

impl<C: Connector> Provider<C> {
    pub fn new(config: ProviderConfig, identity: Arc<dyn IdentityClient>, connector: Arc<C>) -> Self {
        Self {
            config,
            identity,
            connector,
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn identity(&self) -> Arc<dyn IdentityClient> {
        self.identity.clone()
    }

    pub fn connector(&self) -> Arc<C> {
        self.connector.clone()
    }

    /// Proxy and trusted hosts for identity calls.
    pub fn auth_options(&self) -> AuthOptions {
        AuthOptions {
            proxy: self.config.proxy.clone(),
            trusted_hosts: self.config.trusted_hosts.clone(),
        }
    }
}

impl<C: Connector> fmt::Debug for Provider<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("name", &self.config.name)
            .field("identity_url", &self.config.identity_url)
            .finish()
    }
}
