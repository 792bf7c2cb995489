//! Compute Engine REST implementations of the collaborator traits.

mod client;
mod models;

use std::sync::Arc;

pub use client::{GceClient, COMPUTE_BASE_URL};

use crate::compute::IdGenerator;
use crate::error::ComputeError;
use crate::instance::Collaborators;

/// Random UUID v4 identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> Result<String, ComputeError> {
        Ok(uuid::Uuid::new_v4().to_string())
    }
}

/// Wire every collaborator to one REST client.
#[must_use]
pub fn collaborators(client: GceClient) -> Collaborators {
    let client = Arc::new(client);
    Collaborators {
        ids: Arc::new(UuidGenerator),
        disk_types: client.clone(),
        networks: client.clone(),
        subnetworks: client.clone(),
        instances: client.clone(),
        operations: client.clone(),
        target_pools: client.clone(),
        backend_services: client,
    }
}
