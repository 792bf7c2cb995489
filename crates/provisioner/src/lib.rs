//! Compute Engine instance provisioning.
//!
//! Turns a declarative [`VmProperties`] plus [`Networks`] into a running
//! instance, joined to any requested target pool or backend service:
//!
//! 1. **Name** - use the requested name or generate `<prefix>-<uuid>`
//! 2. **Build** - boot disk, local SSDs, user data, network interface,
//!    scheduling, service accounts, accelerators and tags
//! 3. **Submit** - insert the instance
//! 4. **Wait** - poll the insert operation to completion
//! 5. **Attach** - join the target pool and backend service
//!
//! Anything that fails after the insert was accepted is compensated: the
//! instance is deleted and memberships are undone before the error is
//! returned.

pub mod compute;
pub mod config;
pub mod error;
pub mod gcp;
pub mod instance;
pub mod local_disk;
pub mod machine_type;
pub mod networks;
pub mod params;
pub mod properties;

pub use config::{PollConfig, ProvisionerConfig};
pub use error::{ComputeError, ProvisionError};
pub use instance::{Collaborators, InstanceService, ProvisionStep};
pub use machine_type::MachineType;
pub use networks::{Network, NetworkKind, Networks};
pub use properties::{Accelerator, BackendService, VmProperties};
