//! Compensating actions for partially provisioned instances.

use tracing::{info, warn};

use super::Collaborators;
use crate::error::ComputeError;

/// Undoes one step that created state at the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
    /// Delete the instance and wait for the deletion.
    DeleteInstance { name: String, zone: String },
    /// Take the instance out of a target pool.
    LeaveTargetPool { pool: String, instance_link: String },
    /// Take the instance out of its backend service.
    LeaveBackendService { instance_link: String },
}

impl Compensation {
    async fn run(&self, project: &str, services: &Collaborators) -> Result<(), ComputeError> {
        match self {
            Self::DeleteInstance { name, zone } => {
                let operation = match services.instances.delete(project, zone, name).await {
                    Ok(operation) => operation,
                    // Never made it into the inventory.
                    Err(ComputeError::NotFound(_)) => return Ok(()),
                    Err(e) => return Err(e),
                };
                services
                    .operations
                    .wait(&operation, Some(zone), None)
                    .await?;
                Ok(())
            }
            Self::LeaveTargetPool {
                pool,
                instance_link,
            } => services.target_pools.remove_instance(pool, instance_link).await,
            Self::LeaveBackendService { instance_link } => {
                services.backend_services.remove_instance(instance_link).await
            }
        }
    }
}

/// Compensations pushed as provisioning progresses, run newest first.
#[derive(Debug, Default)]
pub struct CompensationStack {
    actions: Vec<Compensation>,
}

impl CompensationStack {
    /// Record the compensation for a step that just succeeded.
    pub fn push(&mut self, action: Compensation) {
        self.actions.push(action);
    }

    /// Pending compensations, oldest first.
    #[must_use]
    pub fn actions(&self) -> &[Compensation] {
        &self.actions
    }

    /// Run every compensation in reverse order. Failures are logged and
    /// returned, never raised, so the error that triggered the unwind is the
    /// one the caller sees.
    pub async fn unwind(self, project: &str, services: &Collaborators) -> Vec<ComputeError> {
        let mut failures = Vec::new();

        for action in self.actions.into_iter().rev() {
            match action.run(project, services).await {
                Ok(()) => info!(action = ?action, "Rolled back"),
                Err(e) => {
                    warn!(action = ?action, error = %e, "Rollback step failed");
                    failures.push(e);
                }
            }
        }

        failures
    }
}
