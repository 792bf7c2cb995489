//! Instance provisioning.
//!
//! [`InstanceService::create`] walks one provisioning attempt through
//! [`ProvisionStep`]s. Once the insert has been accepted every later failure
//! unwinds a [`CompensationStack`] so no half-created instance is left behind.

mod create;
mod membership;
mod rollback;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use membership::{
    add_to_backend_service, add_to_target_pool, remove_from_backend_service,
    remove_from_target_pool,
};
pub use rollback::{Compensation, CompensationStack};

use crate::compute::{
    BackendServices, DiskTypeCatalog, IdGenerator, InstanceApi, NetworkCatalog, OperationWaiter,
    SubnetworkCatalog, TargetPools,
};
use crate::config::ProvisionerConfig;
use crate::error::ComputeError;

/// Steps of one provisioning attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionStep {
    /// Choosing the instance name.
    Naming,
    /// Building the instance request.
    Building,
    /// Submitting the insert.
    Submitting,
    /// Waiting for the insert operation.
    Waiting,
    /// Joining the target pool.
    AttachingTargetPool,
    /// Joining the backend service.
    AttachingBackendService,
    /// Instance is ready.
    Done,
    /// Unwinding after a failure.
    RollingBack,
    /// Provisioning failed.
    Failed,
}

impl fmt::Display for ProvisionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Naming => write!(f, "naming"),
            Self::Building => write!(f, "building"),
            Self::Submitting => write!(f, "submitting"),
            Self::Waiting => write!(f, "waiting"),
            Self::AttachingTargetPool => write!(f, "attaching_target_pool"),
            Self::AttachingBackendService => write!(f, "attaching_backend_service"),
            Self::Done => write!(f, "done"),
            Self::RollingBack => write!(f, "rolling_back"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Handles to everything the provisioner talks to.
#[derive(Clone)]
pub struct Collaborators {
    /// Identifier source for generated names.
    pub ids: Arc<dyn IdGenerator>,
    /// Disk type catalog.
    pub disk_types: Arc<dyn DiskTypeCatalog>,
    /// Network catalog.
    pub networks: Arc<dyn NetworkCatalog>,
    /// Subnetwork catalog.
    pub subnetworks: Arc<dyn SubnetworkCatalog>,
    /// Instance insert and delete.
    pub instances: Arc<dyn InstanceApi>,
    /// Operation waiter.
    pub operations: Arc<dyn OperationWaiter>,
    /// Target pool membership.
    pub target_pools: Arc<dyn TargetPools>,
    /// Backend service membership.
    pub backend_services: Arc<dyn BackendServices>,
}

/// Provisions instances in one project.
///
/// Holds only read-only handles, so one service can run many provisioning
/// attempts concurrently.
#[derive(Clone)]
pub struct InstanceService {
    project: String,
    config: Arc<ProvisionerConfig>,
    services: Collaborators,
}

impl InstanceService {
    /// Create a service for `project`.
    #[must_use]
    pub fn new(
        project: impl Into<String>,
        config: ProvisionerConfig,
        services: Collaborators,
    ) -> Self {
        Self {
            project: project.into(),
            config: Arc::new(config),
            services,
        }
    }

    /// Project instances are created in.
    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ProvisionerConfig {
        &self.config
    }

    /// Remove an instance from whichever target pool holds it.
    ///
    /// # Errors
    /// Returns the collaborator error if the lookup or removal fails.
    pub async fn detach_target_pool(&self, instance_link: &str) -> Result<(), ComputeError> {
        remove_from_target_pool(self.services.target_pools.as_ref(), instance_link).await
    }

    /// Remove an instance from its backend service.
    ///
    /// # Errors
    /// Returns the collaborator error if the removal fails.
    pub async fn detach_backend_service(&self, instance_link: &str) -> Result<(), ComputeError> {
        remove_from_backend_service(self.services.backend_services.as_ref(), instance_link).await
    }
}
