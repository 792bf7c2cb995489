//! Provisioner CLI - create Compute Engine instances from YAML properties.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gce_provisioner::gcp::{self, GceClient};
use gce_provisioner::local_disk::local_ssd_topology;
use gce_provisioner::{InstanceService, Networks, ProvisionerConfig, VmProperties};

/// Provisioner CLI - Compute Engine instance provisioning.
#[derive(Parser)]
#[command(name = "provisioner")]
#[command(about = "Provision Compute Engine instances with rollback on failure")]
struct Cli {
    /// GCP project ID (or set `GCP_PROJECT_ID` env var).
    #[arg(long, env = "GCP_PROJECT_ID")]
    project_id: String,

    /// `OAuth2` access token (or set `GCP_ACCESS_TOKEN` env var).
    #[arg(long, env = "GCP_ACCESS_TOKEN", hide_env_values = true)]
    access_token: String,

    /// Provisioner config file (YAML). Defaults apply when omitted.
    #[arg(long, env = "PROVISIONER_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging.
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an instance.
    Create {
        /// VM properties file (YAML).
        #[arg(long)]
        properties: PathBuf,

        /// Networks file (YAML).
        #[arg(long)]
        networks: PathBuf,

        /// Registry endpoint written into the instance user data.
        #[arg(long, env = "REGISTRY_ENDPOINT")]
        registry_endpoint: String,
    },

    /// Show how many local SSDs a machine type gets.
    LocalSsds {
        /// Machine type (e.g., n2-standard-32).
        #[arg(long)]
        machine_type: String,
    },

    /// Remove an instance from its target pool.
    DetachTargetPool {
        /// Instance self link.
        #[arg(long)]
        instance_link: String,
    },

    /// Remove an instance from its backend service.
    DetachBackendService {
        /// Instance self link.
        #[arg(long)]
        instance_link: String,
    },
}

fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_yaml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn instance_service(
    project_id: &str,
    access_token: &str,
    config: ProvisionerConfig,
) -> Result<InstanceService> {
    let client = GceClient::new(project_id, access_token, config.operation_poll.clone())
        .context("Failed to create Compute Engine client")?;
    Ok(InstanceService::new(project_id, config, gcp::collaborators(client)))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match &cli.config {
        Some(path) => ProvisionerConfig::load(path)?,
        None => ProvisionerConfig::default(),
    };

    match cli.command {
        Commands::LocalSsds { machine_type } => {
            let topology = local_ssd_topology(
                &machine_type,
                Some(config.local_ssd_disk_type.as_str()),
                &config,
            )?;
            println!("{machine_type}: {} local SSD(s)", topology.count);
        }

        Commands::Create {
            properties,
            networks,
            registry_endpoint,
        } => {
            let service = instance_service(&cli.project_id, &cli.access_token, config)?;
            let props: VmProperties = read_yaml(&properties)?;
            let networks: Networks = read_yaml(&networks)?;

            info!(zone = %props.zone, machine_type = %props.machine_type, "Creating instance");
            match service.create(&props, &networks, &registry_endpoint).await {
                Ok(name) => {
                    println!("\n✅ Instance created: {name}");
                }
                Err(e) => {
                    let hint = if e.is_retryable() {
                        "retryable"
                    } else {
                        "not retryable"
                    };
                    return Err(e).context(format!("Instance creation failed ({hint})"));
                }
            }
        }

        Commands::DetachTargetPool { instance_link } => {
            let service = instance_service(&cli.project_id, &cli.access_token, config)?;
            service.detach_target_pool(&instance_link).await?;
            println!("\n✅ Instance detached from target pool: {instance_link}");
        }

        Commands::DetachBackendService { instance_link } => {
            let service = instance_service(&cli.project_id, &cli.access_token, config)?;
            service.detach_backend_service(&instance_link).await?;
            println!("\n✅ Instance detached from backend service: {instance_link}");
        }
    }

    Ok(())
}
