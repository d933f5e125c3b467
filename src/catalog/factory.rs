//! Catalog variant selection from the identity URL.

use std::sync::Arc;

use url::Url;

use crate::catalog::identity::IdentityClient;
use crate::catalog::service_catalog::ServiceCatalog;
use crate::catalog::types::{CatalogTarget, IdentityVersion};

/// Major identity version tagged in the URL path (`/v2.0`, `/v3`, ...).
///
/// Returns `None` when the URL does not parse, carries no version segment,
/// or names a version other than 2 or 3.
pub fn identity_version(identity_url: &str) -> Option<IdentityVersion> {
    let url = Url::parse(identity_url).ok()?;
    let major = url.path_segments()?.find_map(major_version)?;
    match major {
        2 => Some(IdentityVersion::V2),
        3 => Some(IdentityVersion::V3),
        _ => None,
    }
}

/// `v2.0` → 2, `v3` → 3, anything else → None.
fn major_version(segment: &str) -> Option<u32> {
    let tag = segment.strip_prefix(['v', 'V'])?;
    if !tag.split('.').all(is_number) {
        return None;
    }
    tag.split('.').next()?.parse().ok()
}

fn is_number(part: &str) -> bool {
    !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit())
}

/// Build the catalog variant matching the target's identity URL.
///
/// `None` means the identity version is unsupported; treat it as a fatal
/// misconfiguration.
pub fn create_catalog(
    target: CatalogTarget,
    identity: Arc<dyn IdentityClient>,
) -> Option<ServiceCatalog> {
    let Some(version) = identity_version(&target.identity_url) else {
        tracing::error!(identity_url = %target.identity_url, "Unsupported identity service version");
        return None;
    };
    Some(ServiceCatalog::new(version, target, identity))
}
