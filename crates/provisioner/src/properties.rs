//! Declarative description of the machine to provision.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Properties of the VM to create. Never mutated by the provisioner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VmProperties {
    /// Instance name. A name is generated when absent or empty.
    pub name: Option<String>,
    /// Zone to create the instance in (name or self-link).
    pub zone: String,
    /// Machine type, e.g. `n2-standard-4` or `zones/us-central1-a/machineTypes/custom-4-5120`.
    pub machine_type: String,
    /// Boot image the root disk is created from.
    pub stemcell: String,
    /// Root disk size in GB.
    pub root_disk_size_gb: Option<u64>,
    /// Root disk type (self-link).
    pub root_disk_type: Option<String>,
    /// Ephemeral disk type. `local-ssd` attaches local scratch disks.
    pub ephemeral_disk_type: Option<String>,
    /// Guest accelerators.
    pub accelerators: Vec<Accelerator>,
    /// Instance labels.
    pub labels: HashMap<String, String>,
    /// Network tags.
    pub tags: Vec<String>,
    /// Service account email.
    pub service_account: Option<String>,
    /// Service account scopes, short or fully qualified.
    pub service_scopes: Vec<String>,
    /// Target pool to join after creation.
    pub target_pool: Option<String>,
    /// Backend service to join after creation.
    pub backend_service: BackendService,
    /// Sole-tenant node group.
    pub node_group: Option<String>,
    /// Create a preemptible instance.
    pub preemptible: bool,
    /// Restart automatically after a host failure.
    pub automatic_restart: bool,
    /// Host maintenance policy (`MIGRATE` or `TERMINATE`).
    pub on_host_maintenance: Option<String>,
}

impl VmProperties {
    /// The caller-supplied name, if one was given.
    #[must_use]
    pub fn requested_name(&self) -> Option<&str> {
        non_empty(self.name.as_deref())
    }

    /// The target pool to join, if one was requested.
    #[must_use]
    pub fn requested_target_pool(&self) -> Option<&str> {
        non_empty(self.target_pool.as_deref())
    }

    /// The backend service to join, if one was requested.
    #[must_use]
    pub fn requested_backend_service(&self) -> Option<&BackendService> {
        (!self.backend_service.name.is_empty()).then_some(&self.backend_service)
    }
}

/// A guest accelerator request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accelerator {
    /// Accelerator type (self-link or name, e.g. `nvidia-tesla-t4`).
    #[serde(rename = "type")]
    pub accelerator_type: String,
    /// Number of accelerators.
    pub count: u32,
}

/// Backend service membership request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendService {
    /// Backend service name. Empty means no membership.
    pub name: String,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
