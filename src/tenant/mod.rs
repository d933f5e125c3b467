//! Tenant lifecycle subsystem.
//!
//! # Data Flow
//! ```text
//! TenantRegistry::get_or_initialize(provider, tenant)
//!     → cache.rs TenantCache::initialize()
//!         → catalog::create_catalog (identity version from provider URL)
//!         → ServiceCatalog::init with retries on Connection failure
//!         → one ResourcePool per discovered region
//!             → connector.rs TenantConnections (connect + login / close)
//!
//! Operation executor:
//!     determine_region(url) → reserve(region) → work → release(region, lease)
//! ```
//!
//! # Design Decisions
//! - A tenant cache is initialized once; its region → pool map never changes
//! - A failed initialization is terminal; the owner builds a fresh cache
//! - Every lookup on an uninitialized cache is an explicit "no route" error

pub mod cache;
pub mod connector;
pub mod provider;
pub mod registry;
pub mod types;

pub use cache::TenantCache;
pub use connector::{ConnectionError, Connector, ProviderConnection, TenantConnections};
pub use provider::Provider;
pub use registry::TenantRegistry;
pub use types::{TenantError, TenantResult};
