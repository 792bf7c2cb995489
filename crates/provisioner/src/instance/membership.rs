//! Target pool and backend service membership.

use tracing::{debug, info};

use crate::compute::{BackendServices, TargetPools};
use crate::error::ComputeError;
use crate::properties::BackendService;

/// Add an instance to a target pool.
///
/// # Errors
/// Returns the collaborator error unchanged.
pub async fn add_to_target_pool(
    pools: &dyn TargetPools,
    instance_link: &str,
    pool: &str,
) -> Result<(), ComputeError> {
    pools.add_instance(pool, instance_link).await?;
    info!(instance = %instance_link, pool = %pool, "Added instance to target pool");
    Ok(())
}

/// Remove an instance from the target pool holding it. Succeeds without doing
/// anything when no pool holds it.
///
/// # Errors
/// Returns the collaborator error if the lookup or removal fails.
pub async fn remove_from_target_pool(
    pools: &dyn TargetPools,
    instance_link: &str,
) -> Result<(), ComputeError> {
    let Some(pool) = pools.find_by_instance(instance_link, None).await? else {
        debug!(instance = %instance_link, "Instance is not in any target pool");
        return Ok(());
    };

    pools.remove_instance(&pool, instance_link).await?;
    info!(instance = %instance_link, pool = %pool, "Removed instance from target pool");
    Ok(())
}

/// Add an instance to a backend service.
///
/// # Errors
/// Returns the collaborator error unchanged.
pub async fn add_to_backend_service(
    backends: &dyn BackendServices,
    instance_link: &str,
    backend_service: &BackendService,
) -> Result<(), ComputeError> {
    backends
        .add_instance(&backend_service.name, instance_link)
        .await?;
    info!(
        instance = %instance_link,
        backend_service = %backend_service.name,
        "Added instance to backend service"
    );
    Ok(())
}

/// Remove an instance from its backend service.
///
/// # Errors
/// Returns the collaborator error unchanged.
pub async fn remove_from_backend_service(
    backends: &dyn BackendServices,
    instance_link: &str,
) -> Result<(), ComputeError> {
    backends.remove_instance(instance_link).await
}
