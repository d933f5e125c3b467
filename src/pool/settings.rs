//! Key/value settings attached to a pool.
//!
//! The pool owner writes them once at construction; allocator and destructor
//! callbacks read them to know what to connect to.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Well-known setting keys written by the tenant cache.
pub mod keys {
    pub const IDENTITY_URL: &str = "identity_url";
    pub const TENANT_NAME: &str = "tenant_name";
    pub const CONNECTOR: &str = "connector";
    pub const RETRY_DELAY_SECS: &str = "retry_delay_secs";
    pub const RETRY_LIMIT: &str = "retry_limit";
    pub const REGION: &str = "region";
    pub const TRUSTED_HOSTS: &str = "trusted_hosts";
}

/// Immutable string-keyed pool configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolSettings {
    values: BTreeMap<String, String>,
}

impl PoolSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.values.insert(key.into(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn region(&self) -> Option<&str> {
        self.get(keys::REGION)
    }

    pub fn tenant_name(&self) -> Option<&str> {
        self.get(keys::TENANT_NAME)
    }

    pub fn identity_url(&self) -> Option<&str> {
        self.get(keys::IDENTITY_URL)
    }

    pub fn connector(&self) -> Option<&str> {
        self.get(keys::CONNECTOR)
    }

    pub fn retry_delay(&self) -> Option<Duration> {
        self.get(keys::RETRY_DELAY_SECS)
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
    }

    pub fn retry_limit(&self) -> Option<u32> {
        self.get(keys::RETRY_LIMIT).and_then(|v| v.parse().ok())
    }

    /// Trusted hosts, stored comma-separated.
    pub fn trusted_hosts(&self) -> Vec<String> {
        self.get(keys::TRUSTED_HOSTS)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|h| !h.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl fmt::Display for PoolSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (k, v)) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", k, v)?;
        }
        Ok(())
    }
}
