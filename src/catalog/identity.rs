//! Identity service boundary.
//!
//! The wire protocol belongs to the cloud-provider client; this crate only
//! sees a version-specific request and an already-parsed response.

use std::fs;
use std::path::Path;

use crate::catalog::types::{AuthRequest, AuthResponse, IdentityError};

/// Authenticates against a cloud identity service.
pub trait IdentityClient: Send + Sync {
    fn authenticate(&self, request: &AuthRequest) -> Result<AuthResponse, IdentityError>;
}

/// Identity client that answers from a fixed catalog document.
///
/// Used for dry runs from the CLI and in tests. Requests for any tenant other
/// than the document's project are rejected.
#[derive(Debug, Clone)]
pub struct StaticIdentity {
    response: AuthResponse,
}

impl StaticIdentity {
    pub fn new(response: AuthResponse) -> Self {
        Self { response }
    }

    pub fn from_json(json: &str) -> Result<Self, IdentityError> {
        serde_json::from_str(json)
            .map(Self::new)
            .map_err(|e| IdentityError::Malformed(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, IdentityError> {
        let content = fs::read_to_string(path)
            .map_err(|e| IdentityError::Unreachable(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&content)
    }
}

impl IdentityClient for StaticIdentity {
    fn authenticate(&self, request: &AuthRequest) -> Result<AuthResponse, IdentityError> {
        if request.tenant_name != self.response.project.name {
            return Err(IdentityError::Rejected(format!(
                "unknown tenant '{}'",
                request.tenant_name
            )));
        }
        Ok(self.response.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types::{AuthOptions, Credentials, IdentityVersion};

    const FIXTURE: &str = r#"{
        "token": {"id": "t", "issued_at": "2024-01-01T00:00:00Z", "expires_at": "2024-01-01T01:00:00Z"},
        "project": {"id": "p1", "name": "demo"}
    }"#;

    fn request(tenant: &str) -> AuthRequest {
        AuthRequest {
            version: IdentityVersion::V2,
            identity_url: "http://keystone:5000/v2.0".into(),
            tenant_name: tenant.into(),
            domain: None,
            credentials: Credentials::new("u", "p"),
            options: AuthOptions::default(),
        }
    }

    #[test]
    fn test_static_identity_answers_known_tenant() {
        let identity = StaticIdentity::from_json(FIXTURE).unwrap();
        let response = identity.authenticate(&request("demo")).unwrap();
        assert_eq!(response.project.id, "p1");
        assert!(response.catalog.is_empty());
    }

    #[test]
    fn test_static_identity_rejects_other_tenant() {
        let identity = StaticIdentity::from_json(FIXTURE).unwrap();
        assert!(matches!(
            identity.authenticate(&request("other")),
            Err(IdentityError::Rejected(_))
        ));
    }

    #[test]
    fn test_bad_fixture_is_malformed() {
        assert!(matches!(
            StaticIdentity::from_json("{"),
            Err(IdentityError::Malformed(_))
        ));
    }
}
