use tracing::debug;

use crate::compute::models::{AccessConfig, NetworkInterface};
use crate::compute::{region_from_zone, NetworkCatalog, SubnetworkCatalog};
use crate::error::{ComputeError, ProvisionError};
use crate::networks::Networks;

const EXTERNAL_ACCESS_CONFIG_NAME: &str = "External NAT";
const ONE_TO_ONE_NAT: &str = "ONE_TO_ONE_NAT";

/// Resolve the network and subnetwork and build the single interface.
///
/// # Errors
/// Returns [`ProvisionError::InvalidNetworks`] if the networks cannot be
/// merged, [`ProvisionError::NetworkNotFound`] or
/// [`ProvisionError::SubnetworkNotFound`] when a referenced resource is
/// missing, and [`ProvisionError::Lookup`] when a lookup fails otherwise.
pub async fn network_interfaces(
    networks: &Networks,
    project: &str,
    zone: &str,
    network_catalog: &dyn NetworkCatalog,
    subnetwork_catalog: &dyn SubnetworkCatalog,
) -> Result<Vec<NetworkInterface>, ProvisionError> {
    networks.validate()?;

    let network_project = networks.network_project(project);
    let network_name = networks.network_name();

    let network = network_catalog
        .find(network_project, network_name)
        .await
        .map_err(ProvisionError::Lookup)?
        .ok_or_else(|| ProvisionError::NetworkNotFound {
            network: network_name.to_string(),
            project: network_project.to_string(),
        })?;

    let subnetwork = match networks.subnetwork_name() {
        Some(name) => {
            let region = region_from_zone(zone);
            match subnetwork_catalog.find(network_project, name, &region).await {
                Ok(subnetwork) => Some(subnetwork.self_link),
                Err(ComputeError::NotFound(_)) => {
                    return Err(ProvisionError::SubnetworkNotFound {
                        subnetwork: name.to_string(),
                        project: network_project.to_string(),
                    })
                }
                Err(e) => return Err(ProvisionError::Lookup(e)),
            }
        }
        None => None,
    };

    let external_ip = networks.external_ip();
    let access_configs = if networks.ephemeral_external_ip() || external_ip.is_some() {
        vec![AccessConfig {
            name: EXTERNAL_ACCESS_CONFIG_NAME.to_string(),
            access_type: ONE_TO_ONE_NAT.to_string(),
            nat_ip: external_ip.map(str::to_string),
        }]
    } else {
        Vec::new()
    };

    debug!(
        network = %network.self_link,
        subnetwork = ?subnetwork,
        access_configs = access_configs.len(),
        "Resolved network interface"
    );

    Ok(vec![NetworkInterface {
        network: network.self_link,
        subnetwork,
        network_ip: networks.static_private_ip().map(str::to_string),
        access_configs,
    }])
}
