//! Error types for provisioning and for the Compute Engine collaborators.

use thiserror::Error;

/// Errors returned by Compute Engine collaborators (catalogs, submission,
/// operation polling, load-balancer membership).
#[derive(Error, Debug)]
pub enum ComputeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Authentication error.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Operation polling gave up.
    #[error("Operation timed out after {0} attempts")]
    Timeout(u32),

    /// A long-running operation resolved with errors.
    #[error("Operation '{operation}' failed: {message}")]
    OperationFailed { operation: String, message: String },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Errors surfaced by [`crate::instance::InstanceService::create`].
///
/// Input and lookup errors happen before anything exists at the provider and
/// are never retryable. [`ProvisionError::VmCreationFailed`] covers every step
/// from submission onwards; by the time it is returned any partially created
/// instance has already been unwound.
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// Generating a random instance name failed.
    #[error("Generating random instance name: {0}")]
    NameGeneration(#[source] ComputeError),

    /// The machine type identifier could not be parsed.
    #[error("Invalid machine type '{machine_type}': {reason}")]
    InvalidMachineType {
        machine_type: String,
        reason: String,
    },

    /// The network configuration cannot be merged into one interface.
    #[error("Invalid networks: {0}")]
    InvalidNetworks(String),

    /// The user data document could not be serialized.
    #[error("Marshalling user data: {0}")]
    UserData(#[source] serde_json::Error),

    /// The requested network does not exist.
    #[error("Network '{network}' does not exist in project '{project}'")]
    NetworkNotFound { network: String, project: String },

    /// The requested subnetwork does not exist.
    #[error("Subnetwork '{subnetwork}' does not exist in project '{project}'")]
    SubnetworkNotFound { subnetwork: String, project: String },

    /// The requested disk type does not exist in the zone.
    #[error("Disk type '{disk_type}' not found in zone '{zone}'")]
    DiskTypeNotFound { disk_type: String, zone: String },

    /// A catalog lookup failed for a reason other than absence.
    #[error("Lookup failed: {0}")]
    Lookup(#[source] ComputeError),

    /// Submitting, waiting for or attaching the instance failed.
    #[error("VM failed to create: {source}")]
    VmCreationFailed {
        #[source]
        source: ComputeError,
        can_retry: bool,
    },
}

impl ProvisionError {
    /// Wrap a collaborator failure from the creation phase.
    #[must_use]
    pub fn creation_failed(source: ComputeError) -> Self {
        Self::VmCreationFailed {
            source,
            can_retry: true,
        }
    }

    /// Whether the caller may re-attempt the whole provisioning call.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::VmCreationFailed {
                can_retry: true,
                ..
            }
        )
    }
}
