//! Service catalog subsystem.
//!
//! # Data Flow
//! ```text
//! identity URL
//!     → factory.rs (major version tag → V2 | V3, or None)
//!     → service_catalog.rs init()
//!         → identity.rs IdentityClient::authenticate (external)
//!         → Connection failure (retry-worthy) | Protocol failure (abort)
//!         → new CatalogSnapshot published atomically
//!     → readers: endpoints, regions, project, get_vm_region(url)
//! ```
//!
//! # Design Decisions
//! - Exactly two identity versions; dispatch is a closed enum
//! - Token, service types, endpoints and regions live in one immutable snapshot
//! - The identity wire protocol stays behind `IdentityClient`

pub mod factory;
pub mod identity;
pub mod service_catalog;
pub mod types;

pub use factory::{create_catalog, identity_version};
pub use identity::{IdentityClient, StaticIdentity};
pub use service_catalog::{CatalogSnapshot, ServiceCatalog};
pub use types::{
    AuthOptions, AuthRequest, AuthResponse, CatalogError, CatalogResult, CatalogTarget,
    Credentials, Endpoint, IdentityError, IdentityVersion, ProjectRef, RawEndpoint, ServiceEntry,
    TokenInfo,
};

/// Service type whose endpoints host virtual machines.
pub const COMPUTE_SERVICE: &str = "compute";
