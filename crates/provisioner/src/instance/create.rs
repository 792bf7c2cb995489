//! Instance creation.

use tracing::{debug, info, warn};

use super::membership::{add_to_backend_service, add_to_target_pool};
use super::{Compensation, CompensationStack, InstanceService, ProvisionStep};
use crate::compute::models::{InstanceRequest, Operation};
use crate::compute::resource_name;
use crate::error::{ComputeError, ProvisionError};
use crate::local_disk::local_ssd_disks;
use crate::networks::Networks;
use crate::params;
use crate::properties::VmProperties;

impl InstanceService {
    /// Create an instance and return its name.
    ///
    /// Nothing is created when naming or building fails. Once the insert has
    /// been accepted, any failure deletes the instance (and undoes memberships)
    /// before the original error is returned.
    ///
    /// # Errors
    /// Input and lookup failures are returned as-is. Submission, wait and
    /// attachment failures are returned as retryable
    /// [`ProvisionError::VmCreationFailed`].
    pub async fn create(
        &self,
        props: &VmProperties,
        networks: &Networks,
        registry_endpoint: &str,
    ) -> Result<String, ProvisionError> {
        let name = self.instance_name(props).inspect_err(|e| {
            warn!(step = %ProvisionStep::Failed, error = %e, "Failed to name instance");
        })?;
        let zone = resource_name(&props.zone).to_string();

        debug!(instance = %name, step = %ProvisionStep::Building, "Building instance request");
        let request = self
            .build_request(&name, props, networks, registry_endpoint)
            .await
            .inspect_err(|e| {
                warn!(instance = %name, step = %ProvisionStep::Failed, error = %e, "Failed to build instance request");
            })?;
        debug!(instance = %name, request = ?request, "Creating instance with params");

        info!(instance = %name, zone = %zone, step = %ProvisionStep::Submitting, "Creating instance");
        let operation = self
            .services
            .instances
            .insert(&self.project, &zone, &request)
            .await
            .map_err(|e| {
                warn!(instance = %name, step = %ProvisionStep::Failed, error = %e, "Failed to create instance");
                ProvisionError::creation_failed(e)
            })?;

        let mut rollback = CompensationStack::default();
        rollback.push(Compensation::DeleteInstance {
            name: name.clone(),
            zone: zone.clone(),
        });

        if let Err(e) = self
            .commit(&name, &zone, props, &operation, &mut rollback)
            .await
        {
            warn!(instance = %name, step = %ProvisionStep::RollingBack, error = %e, "Failed to create instance, cleaning up");
            let failures = rollback.unwind(&self.project, &self.services).await;
            warn!(
                instance = %name,
                step = %ProvisionStep::Failed,
                rollback_failures = failures.len(),
                "Instance creation rolled back"
            );
            return Err(ProvisionError::creation_failed(e));
        }

        info!(instance = %name, step = %ProvisionStep::Done, "Instance created");
        Ok(name)
    }

    /// Assemble the insert request. Looks up the network, subnetwork and
    /// local SSD disk type but creates nothing.
    ///
    /// # Errors
    /// Returns input, serialization and lookup errors.
    pub async fn build_request(
        &self,
        name: &str,
        props: &VmProperties,
        networks: &Networks,
        registry_endpoint: &str,
    ) -> Result<InstanceRequest, ProvisionError> {
        let config = self.config();

        let metadata = params::metadata(name, registry_endpoint, networks.dns(), config)?;
        let network_interfaces = params::network_interfaces(
            networks,
            &self.project,
            resource_name(&props.zone),
            self.services.networks.as_ref(),
            self.services.subnetworks.as_ref(),
        )
        .await?;

        let mut disks = vec![params::boot_disk(props, config)];
        disks.extend(local_ssd_disks(props, config, self.services.disk_types.as_ref()).await?);

        Ok(InstanceRequest {
            name: name.to_string(),
            description: config.instance_description.clone(),
            can_ip_forward: networks.can_ip_forward(),
            disks,
            machine_type: props.machine_type.clone(),
            metadata,
            network_interfaces,
            scheduling: params::scheduling(props, config),
            service_accounts: params::service_accounts(props, config),
            tags: params::tags(networks, props),
            labels: props.labels.clone(),
            guest_accelerators: params::accelerators(&props.accelerators),
        })
    }

    fn instance_name(&self, props: &VmProperties) -> Result<String, ProvisionError> {
        if let Some(name) = props.requested_name() {
            return Ok(name.to_string());
        }

        let id = self
            .services
            .ids
            .generate()
            .map_err(ProvisionError::NameGeneration)?;
        let name = format!("{}-{id}", self.config.instance_name_prefix);
        debug!(instance = %name, step = %ProvisionStep::Naming, "Generated instance name");
        Ok(name)
    }

    /// Wait for the insert and join the requested load balancers, pushing a
    /// compensation after each membership.
    async fn commit(
        &self,
        name: &str,
        zone: &str,
        props: &VmProperties,
        operation: &Operation,
        rollback: &mut CompensationStack,
    ) -> Result<(), ComputeError> {
        debug!(instance = %name, operation = %operation.name, step = %ProvisionStep::Waiting, "Waiting for instance");
        let operation = self
            .services
            .operations
            .wait(operation, Some(zone), None)
            .await?;

        let instance_link = operation
            .target_link
            .clone()
            .unwrap_or_else(|| {
                format!("projects/{}/zones/{zone}/instances/{name}", self.project)
            });

        if let Some(pool) = props.requested_target_pool() {
            debug!(instance = %name, pool = %pool, step = %ProvisionStep::AttachingTargetPool, "Joining target pool");
            add_to_target_pool(self.services.target_pools.as_ref(), &instance_link, pool).await?;
            rollback.push(Compensation::LeaveTargetPool {
                pool: pool.to_string(),
                instance_link: instance_link.clone(),
            });
        }

        if let Some(backend_service) = props.requested_backend_service() {
            debug!(
                instance = %name,
                backend_service = %backend_service.name,
                step = %ProvisionStep::AttachingBackendService,
                "Joining backend service"
            );
            add_to_backend_service(
                self.services.backend_services.as_ref(),
                &instance_link,
                backend_service,
            )
            .await?;
            rollback.push(Compensation::LeaveBackendService { instance_link });
        }

        Ok(())
    }
}
