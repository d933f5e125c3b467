//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → LifecycleConfig (validated, immutable)
//!     → ProviderConfig handed to each Provider / TenantCache / ResourcePool
//! ```
//!
//! # Design Decisions
//! - No global settings: pool sizes and retry parameters travel as values
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::LifecycleConfig;
pub use schema::ObservabilityConfig;
pub use schema::PoolConfig;
pub use schema::ProviderConfig;
pub use schema::ProxyConfig;
pub use schema::RetryConfig;
pub use schema::TenantConfig;
