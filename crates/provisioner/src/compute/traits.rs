//! Collaborators the provisioner depends on.
//!
//! The REST implementations live in [`crate::gcp`]; tests supply in-memory
//! fakes.

use async_trait::async_trait;

use super::models::{DiskType, InstanceRequest, Operation, Subnetwork, VpcNetwork};
use crate::error::ComputeError;

/// Source of random identifiers for generated instance names.
pub trait IdGenerator: Send + Sync {
    /// Generate a fresh identifier.
    ///
    /// # Errors
    /// Returns an error if no identifier could be produced.
    fn generate(&self) -> Result<String, ComputeError>;
}

/// Disk type lookups.
#[async_trait]
pub trait DiskTypeCatalog: Send + Sync {
    /// Find a disk type in a zone. `Ok(None)` when it does not exist.
    async fn find(&self, disk_type: &str, zone: &str) -> Result<Option<DiskType>, ComputeError>;
}

/// VPC network lookups.
#[async_trait]
pub trait NetworkCatalog: Send + Sync {
    /// Find a network in a project. `Ok(None)` when it does not exist.
    async fn find(&self, project: &str, network: &str)
        -> Result<Option<VpcNetwork>, ComputeError>;
}

/// Subnetwork lookups.
#[async_trait]
pub trait SubnetworkCatalog: Send + Sync {
    /// Find a subnetwork in a region. Fails with [`ComputeError::NotFound`]
    /// when it does not exist.
    async fn find(
        &self,
        project: &str,
        subnetwork: &str,
        region: &str,
    ) -> Result<Subnetwork, ComputeError>;
}

/// Instance submission and deletion.
#[async_trait]
pub trait InstanceApi: Send + Sync {
    /// Submit an instance insert; returns the pending operation.
    async fn insert(
        &self,
        project: &str,
        zone: &str,
        instance: &InstanceRequest,
    ) -> Result<Operation, ComputeError>;

    /// Submit an instance delete; returns the pending operation.
    async fn delete(&self, project: &str, zone: &str, name: &str)
        -> Result<Operation, ComputeError>;
}

/// Waits for long-running operations, polling with backoff.
#[async_trait]
pub trait OperationWaiter: Send + Sync {
    /// Block until `operation` is done. Fails when it finished with errors or
    /// polling gave up.
    async fn wait(
        &self,
        operation: &Operation,
        zone: Option<&str>,
        region: Option<&str>,
    ) -> Result<Operation, ComputeError>;
}

/// Target pool membership.
#[async_trait]
pub trait TargetPools: Send + Sync {
    /// Add an instance to a pool.
    async fn add_instance(&self, pool: &str, instance_link: &str) -> Result<(), ComputeError>;

    /// Remove an instance from a pool.
    async fn remove_instance(&self, pool: &str, instance_link: &str) -> Result<(), ComputeError>;

    /// Name of the pool containing the instance, if any.
    async fn find_by_instance(
        &self,
        instance_link: &str,
        region: Option<&str>,
    ) -> Result<Option<String>, ComputeError>;
}

/// Backend service membership.
#[async_trait]
pub trait BackendServices: Send + Sync {
    /// Add an instance to a backend service.
    async fn add_instance(&self, backend_service: &str, instance_link: &str)
        -> Result<(), ComputeError>;

    /// Remove an instance from whichever backend service holds it.
    async fn remove_instance(&self, instance_link: &str) -> Result<(), ComputeError>;
}
