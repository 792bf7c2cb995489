//! Compute Engine request and resource models.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ============================================================================
// Instance request
// ============================================================================

/// Instance insert request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceRequest {
    /// Instance name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Allow IP forwarding.
    pub can_ip_forward: bool,
    /// Boot disk first, then scratch disks.
    pub disks: Vec<AttachedDisk>,
    /// Machine type (name or URL).
    pub machine_type: String,
    /// Metadata.
    pub metadata: Metadata,
    /// Network interfaces.
    pub network_interfaces: Vec<NetworkInterface>,
    /// Scheduling policy.
    pub scheduling: Scheduling,
    /// Service accounts.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub service_accounts: Vec<ServiceAccount>,
    /// Network tags.
    pub tags: Tags,
    /// Labels.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub labels: HashMap<String, String>,
    /// Guest accelerators.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub guest_accelerators: Vec<AcceleratorConfig>,
}

/// Kind of attached disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiskKind {
    /// Network persistent disk.
    Persistent,
    /// Local scratch disk.
    Scratch,
}

/// Disk attachment interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiskInterface {
    /// SCSI.
    Scsi,
    /// NVMe.
    Nvme,
}

/// Disk access mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiskMode {
    /// Read-write.
    ReadWrite,
    /// Read-only.
    ReadOnly,
}

/// Disk attached at creation time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedDisk {
    /// Delete the disk with the instance.
    pub auto_delete: bool,
    /// Boot disk.
    pub boot: bool,
    /// Initialize params.
    pub initialize_params: InitializeParams,
    /// Attachment interface.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<DiskInterface>,
    /// 1-based index for scratch disks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    /// Access mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<DiskMode>,
    /// Disk kind.
    #[serde(rename = "type")]
    pub kind: DiskKind,
}

/// Disk initialization parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Disk size in GB.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_size_gb: Option<String>,
    /// Disk type (URL).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_type: Option<String>,
    /// Source image (URL).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_image: Option<String>,
}

/// Metadata for instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
    /// Metadata items.
    pub items: Vec<MetadataItem>,
}

/// Metadata item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataItem {
    /// Key.
    pub key: String,
    /// Value.
    pub value: String,
}

/// Network interface definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterface {
    /// Network (URL).
    pub network: String,
    /// Subnetwork (URL).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnetwork: Option<String>,
    /// Static internal IP.
    #[serde(rename = "networkIP", skip_serializing_if = "Option::is_none")]
    pub network_ip: Option<String>,
    /// Access configs.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub access_configs: Vec<AccessConfig>,
}

/// External access configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessConfig {
    /// Name.
    pub name: String,
    /// Access type.
    #[serde(rename = "type")]
    pub access_type: String,
    /// Reserved external IP.
    #[serde(rename = "natIP", skip_serializing_if = "Option::is_none")]
    pub nat_ip: Option<String>,
}

/// Scheduling policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scheduling {
    /// Preemptible.
    pub preemptible: bool,
    /// Restart after host failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub automatic_restart: Option<bool>,
    /// Host maintenance policy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_host_maintenance: Option<String>,
    /// Node affinities.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub node_affinities: Vec<NodeAffinity>,
}

/// Sole-tenant node affinity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeAffinity {
    /// Label key.
    pub key: String,
    /// Operator.
    pub operator: String,
    /// Label values.
    pub values: Vec<String>,
}

/// Service account attached to the instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceAccount {
    /// Account email.
    pub email: String,
    /// Fully qualified scopes.
    pub scopes: Vec<String>,
}

/// Guest accelerator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceleratorConfig {
    /// Accelerator type.
    pub accelerator_type: String,
    /// Accelerator count.
    pub accelerator_count: u32,
}

/// Network tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Tags {
    /// Tag items.
    pub items: Vec<String>,
}

// ============================================================================
// Resources returned by collaborators
// ============================================================================

/// Disk type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskType {
    /// Name.
    pub name: String,
    /// Self link.
    pub self_link: String,
}

/// VPC network.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VpcNetwork {
    /// Name.
    pub name: String,
    /// Self link.
    pub self_link: String,
}

/// Subnetwork.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subnetwork {
    /// Name.
    pub name: String,
    /// Self link.
    pub self_link: String,
}

// ============================================================================
// Operation types
// ============================================================================

/// Long-running operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Operation name.
    pub name: String,
    /// Status (`PENDING`, `RUNNING`, `DONE`).
    pub status: String,
    /// Self link.
    pub self_link: Option<String>,
    /// Link to the resource being operated on.
    pub target_link: Option<String>,
    /// Zone URL for zonal operations.
    pub zone: Option<String>,
    /// Region URL for regional operations.
    pub region: Option<String>,
    /// Operation type.
    pub operation_type: Option<String>,
    /// Error.
    pub error: Option<OperationError>,
}

impl Operation {
    /// Whether the operation has finished.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.status == "DONE"
    }

    /// Joined error messages when the operation finished with errors.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        let error = self.error.as_ref()?;
        if error.errors.is_empty() {
            return None;
        }
        Some(
            error
                .errors
                .iter()
                .map(|e| {
                    format!(
                        "{}: {}",
                        e.code.as_deref().unwrap_or("UNKNOWN"),
                        e.message.as_deref().unwrap_or_default()
                    )
                })
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Operation error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OperationError {
    /// Errors.
    #[serde(default)]
    pub errors: Vec<OperationErrorDetail>,
}

/// Operation error detail.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OperationErrorDetail {
    /// Error code.
    pub code: Option<String>,
    /// Error message.
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scratch_disk_wire_format() {
        let disk = AttachedDisk {
            auto_delete: true,
            boot: false,
            initialize_params: InitializeParams {
                disk_type: Some("zones/z/diskTypes/local-ssd".to_string()),
                ..Default::default()
            },
            interface: Some(DiskInterface::Nvme),
            index: Some(1),
            mode: None,
            kind: DiskKind::Scratch,
        };

        let json = serde_json::to_value(&disk).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "autoDelete": true,
                "boot": false,
                "initializeParams": { "diskType": "zones/z/diskTypes/local-ssd" },
                "interface": "NVME",
                "index": 1,
                "type": "SCRATCH"
            })
        );
    }

    #[test]
    fn test_operation_error_message() {
        let op: Operation = serde_json::from_value(serde_json::json!({
            "name": "op-1",
            "status": "DONE",
            "error": { "errors": [
                { "code": "QUOTA_EXCEEDED", "message": "CPUS" },
                { "message": "second" }
            ]}
        }))
        .unwrap();

        assert!(op.is_done());
        assert_eq!(
            op.error_message().as_deref(),
            Some("QUOTA_EXCEEDED: CPUS; UNKNOWN: second")
        );
    }
}
