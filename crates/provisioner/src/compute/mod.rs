//! Compute Engine models and collaborator traits.

pub mod models;
mod traits;

pub use traits::{
    BackendServices, DiskTypeCatalog, IdGenerator, InstanceApi, NetworkCatalog, OperationWaiter,
    SubnetworkCatalog, TargetPools,
};

/// Last path segment of a resource link (`.../zones/us-central1-a` -> `us-central1-a`).
#[must_use]
pub fn resource_name(link: &str) -> &str {
    link.rsplit('/').next().unwrap_or(link)
}

/// Region of a zone name or link (`us-central1-a` -> `us-central1`).
#[must_use]
pub fn region_from_zone(zone: &str) -> String {
    let zone = resource_name(zone);
    zone.rsplit_once('-')
        .map_or_else(|| zone.to_string(), |(region, _)| region.to_string())
}
