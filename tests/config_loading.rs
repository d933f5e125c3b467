//! Loading configuration files from disk and wiring them into a registry.

mod common;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use common::{catalog_response, FakeConnector, ScriptedIdentity};
use tenant_pool::catalog::{self, IdentityVersion, StaticIdentity};
use tenant_pool::config::loader::{load_config, ConfigError};
use tenant_pool::resilience::retries::RecordingSleeper;
use tenant_pool::tenant::{Provider, TenantRegistry};

fn demos() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("demos")
}

fn write_temp(name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("tenant-pool-{}-{}", std::process::id(), name));
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_demo_config_loads() {
    let config = load_config(&demos().join("tenant-pool.toml")).unwrap();
    assert_eq!(config.providers.len(), 2);

    let east = config.provider("openstack-east").unwrap();
    assert_eq!(
        catalog::identity_version(&east.identity_url),
        Some(IdentityVersion::V3)
    );
    assert_eq!(east.pool.bounds().unwrap().max_size, 8);
    assert_eq!(east.proxy.as_ref().unwrap().to_string(), "proxy.example.com:3128");
    assert_eq!(east.tenant("demo").unwrap().domain.as_deref(), Some("Default"));

    let legacy = config.provider("legacy").unwrap();
    assert_eq!(
        catalog::identity_version(&legacy.identity_url),
        Some(IdentityVersion::V2)
    );
    // Defaults apply to omitted sections.
    assert_eq!(legacy.pool.max_size, 10);
    assert_eq!(legacy.retry.max_attempts, 3);
    assert_eq!(legacy.connector, "compute");
}

#[test]
fn test_missing_file_is_io_error() {
    let err = load_config(Path::new("/nonexistent/tenant-pool.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_invalid_file_reports_every_problem() {
    let path = write_temp(
        "invalid.toml",
        r#"
[[providers]]
name = "cloud"
identity_url = "http://keystone:5000/v9"

[providers.pool]
min_size = -1
max_size = 4

[[providers]]
name = "cloud"
identity_url = "http://keystone:5000/v3"

[[providers.tenants]]
name = "demo"
userid = "admin"
password = "secret"
"#,
    );

    let err = load_config(&path).unwrap_err();
    std::fs::remove_file(&path).ok();
    match err {
        ConfigError::Validation(errors) => assert!(errors.len() >= 4, "{errors:?}"),
        other => panic!("expected validation errors, got {other}"),
    }
}

#[test]
fn test_static_identity_routes_demo_catalog() {
    let identity = StaticIdentity::from_file(&demos().join("catalog.json")).unwrap();
    let config = load_config(&demos().join("tenant-pool.toml")).unwrap();
    let east = config.provider("openstack-east").unwrap().clone();

    let provider = Provider::new(east, Arc::new(identity), Arc::new(FakeConnector::default()));
    let registry =
        TenantRegistry::new([provider]).with_sleeper(Arc::new(RecordingSleeper::new()));

    let cache = registry.get_or_initialize("openstack-east", "demo").unwrap();
    assert_eq!(cache.regions(), vec!["east".to_string(), "west".to_string()]);
    assert_eq!(
        cache
            .determine_region("http://10.2.2.2:8774/v2.1/servers/1")
            .unwrap(),
        "west"
    );
    // Internal endpoints are not routable through a v3 catalog.
    assert!(cache
        .determine_region("http://192.168.0.2:8774/v2.1/servers/1")
        .is_err());
}

#[test]
fn test_config_driven_registry_with_scripted_identity() {
    let config = load_config(&demos().join("tenant-pool.toml")).unwrap();
    let legacy = config.provider("legacy").unwrap().clone();
    let identity = Arc::new(ScriptedIdentity::new(catalog_response(
        "ops",
        &[("central", "http://10.0.0.9:8774/v2/ops-id")],
    )));

    let provider = Provider::new(legacy, identity.clone(), Arc::new(FakeConnector::default()));
    let registry = TenantRegistry::new([provider]);

    let cache = registry.get_or_initialize("legacy", "ops").unwrap();
    assert_eq!(cache.tenant_id(), Some("ops-id"));
    let request = identity.last_request().unwrap();
    assert_eq!(request.version, IdentityVersion::V2);
    assert!(request.domain.is_none());
}
