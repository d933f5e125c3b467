//! tenant-pool: inspect provider configuration and catalog routing.
//!
//! # Commands
//! - `check`: validate the configuration and print the effective pool and
//!   retry settings per provider
//! - `catalog`: authenticate a tenant against a JSON catalog document and
//!   print the catalog summary
//! - `resolve`: same, then print the region serving a resource URL

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde_json::json;

use tenant_pool::catalog::{self, CatalogTarget, Credentials, ServiceCatalog, StaticIdentity};
use tenant_pool::config::loader::load_config;
use tenant_pool::config::{LifecycleConfig, ProviderConfig};
use tenant_pool::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "tenant-pool")]
#[command(about = "Tenant connection pool configuration and catalog routing tool", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "tenant-pool.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CatalogArgs {
    /// Provider name from the configuration.
    #[arg(long)]
    provider: String,

    /// Tenant name under that provider.
    #[arg(long)]
    tenant: String,

    /// JSON document standing in for the identity service response.
    #[arg(long = "catalog")]
    catalog_file: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate configuration and print effective settings
    Check,
    /// Authenticate against a catalog document and print its summary
    Catalog(CatalogArgs),
    /// Print the region whose compute endpoint serves a resource URL
    Resolve {
        #[command(flatten)]
        args: CatalogArgs,

        /// Resource URL, e.g. http://10.1.1.2:8774/v2.1/servers/42
        url: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    logging::init_logging(&config.observability);
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    match cli.command {
        Commands::Check => {
            let summary = check_summary(&config);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Catalog(args) => {
            let catalog = authenticate(&config, &args)?;
            println!("{}", catalog);
        }
        Commands::Resolve { args, url } => {
            let catalog = authenticate(&config, &args)?;
            match catalog.get_vm_region(&url) {
                Some(region) => println!("{}", region),
                None => return Err(format!("no region serves '{}'", url).into()),
            }
        }
    }

    Ok(())
}

fn check_summary(config: &LifecycleConfig) -> serde_json::Value {
    let providers: Vec<_> = config
        .providers
        .iter()
        .map(|p| {
            json!({
                "name": p.name,
                "identity_url": p.identity_url,
                "identity_version": catalog::identity_version(&p.identity_url),
                "connector": p.connector,
                "pool": p.pool.bounds().ok(),
                "retry": p.retry,
                "proxy": p.proxy.as_ref().map(ToString::to_string),
                "trusted_hosts": p.trusted_hosts,
                "tenants": p.tenants,
            })
        })
        .collect();
    json!({ "providers": providers })
}

fn authenticate(
    config: &LifecycleConfig,
    args: &CatalogArgs,
) -> Result<ServiceCatalog, Box<dyn std::error::Error>> {
    let provider: &ProviderConfig = config
        .provider(&args.provider)
        .ok_or_else(|| format!("unknown provider '{}'", args.provider))?;
    let tenant = provider
        .tenant(&args.tenant)
        .ok_or_else(|| format!("provider '{}' has no tenant '{}'", args.provider, args.tenant))?;

    let identity = Arc::new(StaticIdentity::from_file(&args.catalog_file)?);
    let target = CatalogTarget {
        identity_url: provider.identity_url.clone(),
        tenant_name: tenant.name.clone(),
        domain: tenant.domain.clone(),
        credentials: Credentials::new(tenant.userid.clone(), tenant.password.clone()),
        options: catalog::AuthOptions {
            proxy: provider.proxy.clone(),
            trusted_hosts: provider.trusted_hosts.clone(),
        },
    };

    let catalog = catalog::create_catalog(target, identity)
        .ok_or_else(|| format!("unsupported identity URL '{}'", provider.identity_url))?;
    catalog.init()?;
    Ok(catalog)
}
