//! Tenant connection pools for multi-region cloud lifecycle operations.
//!
//! ```text
//!   executor ──determine_region(url)──▶ TenantCache ──▶ ServiceCatalog ──▶ IdentityClient
//!      │                                    │
//!      └──reserve()/release()──▶ ResourcePool (one per region) ──▶ Connector / ProviderConnection
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod observability;
pub mod pool;
pub mod resilience;
pub mod tenant;

pub use catalog::ServiceCatalog;
pub use config::LifecycleConfig;
pub use error::ErrorKind;
pub use pool::ResourcePool;
pub use tenant::{TenantCache, TenantRegistry};
