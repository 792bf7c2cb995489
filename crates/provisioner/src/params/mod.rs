//! Builders that turn VM properties and networks into instance request
//! fragments. Everything here is pure apart from the catalog lookups in
//! [`network`]; none of it mutates the caller's input.

mod disks;
mod metadata;
mod network;
mod scheduling;
mod service_accounts;

use std::collections::BTreeSet;

pub use disks::{boot_disk, local_ssd_disk};
pub use metadata::{metadata, UserData};
pub use network::network_interfaces;
pub use scheduling::scheduling;
pub use service_accounts::service_accounts;

use crate::compute::models::{AcceleratorConfig, Tags};
use crate::networks::Networks;
use crate::properties::{Accelerator, VmProperties};

/// One accelerator config per request. No requests, no configs.
#[must_use]
pub fn accelerators(requests: &[Accelerator]) -> Vec<AcceleratorConfig> {
    requests
        .iter()
        .map(|acc| AcceleratorConfig {
            accelerator_type: acc.accelerator_type.clone(),
            accelerator_count: acc.count,
        })
        .collect()
}

/// Union of network tags and property tags, deduplicated.
#[must_use]
pub fn tags(networks: &Networks, props: &VmProperties) -> Tags {
    let mut items: BTreeSet<String> = networks.tags();
    items.extend(props.tags.iter().cloned());
    Tags {
        items: items.into_iter().collect(),
    }
}
