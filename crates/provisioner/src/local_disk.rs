//! Local SSD topology.
//!
//! Some machine series only accept specific local SSD counts, depending on
//! their vCPUs. See
//! <https://cloud.google.com/compute/docs/disks/local-ssd#lssd_disk_options>.

use tracing::debug;

use crate::compute::models::{AttachedDisk, DiskInterface};
use crate::compute::{resource_name, DiskTypeCatalog};
use crate::config::ProvisionerConfig;
use crate::error::ProvisionError;
use crate::machine_type::MachineType;
use crate::params::local_ssd_disk;
use crate::properties::VmProperties;

/// `(minimum vCPUs, local SSDs)` for n2, highest breakpoint first.
const N2_LOCAL_SSDS: &[(u32, u32)] = &[(82, 16), (42, 8), (22, 4), (12, 2)];

/// `(minimum vCPUs, local SSDs)` for n2d, highest breakpoint first.
const N2D_LOCAL_SSDS: &[(u32, u32)] = &[(96, 8), (64, 4), (32, 2)];

/// How many scratch disks to attach and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalSsdTopology {
    /// Number of scratch disks.
    pub count: u32,
    /// Attachment interface.
    pub interface: DiskInterface,
}

impl LocalSsdTopology {
    const NONE: Self = Self {
        count: 0,
        interface: DiskInterface::Nvme,
    };
}

/// Minimum local SSD count for a machine family at a vCPU count.
#[must_use]
pub fn required_local_ssds(family: &str, cpus: u32) -> u32 {
    let table: &[(u32, u32)] = match family {
        "n2" => N2_LOCAL_SSDS,
        "n2d" => N2D_LOCAL_SSDS,
        _ => &[],
    };

    table
        .iter()
        .find(|(min_cpus, _)| cpus >= *min_cpus)
        .map_or(1, |(_, count)| *count)
}

/// Derive the scratch disk topology from the machine type.
///
/// # Errors
/// Returns [`ProvisionError::InvalidMachineType`] when local SSDs are
/// requested and the machine type cannot be parsed.
pub fn local_ssd_topology(
    machine_type: &str,
    ephemeral_disk_type: Option<&str>,
    config: &ProvisionerConfig,
) -> Result<LocalSsdTopology, ProvisionError> {
    if ephemeral_disk_type != Some(config.local_ssd_disk_type.as_str()) {
        return Ok(LocalSsdTopology::NONE);
    }

    let machine_type = MachineType::parse(machine_type)?;
    let cpus = machine_type.cpu_count(config)?;
    let count = required_local_ssds(&machine_type.family, cpus);

    debug!(
        machine_type = %machine_type,
        cpus,
        local_ssds = count,
        "Derived local SSD topology"
    );

    Ok(LocalSsdTopology {
        count,
        interface: DiskInterface::Nvme,
    })
}

/// Scratch disks for the instance, indexed from 1.
///
/// # Errors
/// Returns [`ProvisionError::InvalidMachineType`] for unparseable machine
/// types, [`ProvisionError::DiskTypeNotFound`] when the zone has no local SSD
/// disk type and [`ProvisionError::Lookup`] when the lookup fails.
pub async fn local_ssd_disks(
    props: &VmProperties,
    config: &ProvisionerConfig,
    disk_types: &dyn DiskTypeCatalog,
) -> Result<Vec<AttachedDisk>, ProvisionError> {
    let topology = local_ssd_topology(
        &props.machine_type,
        props.ephemeral_disk_type.as_deref(),
        config,
    )?;
    if topology.count == 0 {
        return Ok(Vec::new());
    }

    let zone = resource_name(&props.zone);
    let disk_type = disk_types
        .find(&config.local_ssd_disk_type, zone)
        .await
        .map_err(ProvisionError::Lookup)?
        .ok_or_else(|| ProvisionError::DiskTypeNotFound {
            disk_type: config.local_ssd_disk_type.clone(),
            zone: zone.to_string(),
        })?;

    Ok((1..=topology.count)
        .map(|index| local_ssd_disk(&disk_type, index, topology.interface))
        .collect())
}
