//! In-memory Compute Engine used by the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use gce_provisioner::compute::models::{
    DiskType, InstanceRequest, Operation, Subnetwork, VpcNetwork,
};
use gce_provisioner::compute::{
    BackendServices, DiskTypeCatalog, IdGenerator, InstanceApi, NetworkCatalog, OperationWaiter,
    SubnetworkCatalog, TargetPools,
};
use gce_provisioner::{
    Collaborators, ComputeError, InstanceService, Network, NetworkKind, Networks,
    ProvisionerConfig, VmProperties,
};

pub const PROJECT: &str = "test-project";
pub const ZONE: &str = "us-central1-a";

/// Failure switches and a call log shared by every fake collaborator.
#[derive(Default)]
pub struct FakeCompute {
    pub fail_id: bool,
    pub missing_network: bool,
    pub missing_subnetwork: bool,
    pub missing_disk_type: bool,
    pub fail_insert: bool,
    pub fail_insert_wait: bool,
    pub fail_delete: bool,
    pub instance_gone: bool,
    pub fail_target_pool: bool,
    pub fail_backend_service: bool,
    pub calls: Mutex<Vec<String>>,
    pub inserted: Mutex<Option<InstanceRequest>>,
}

impl FakeCompute {
    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, prefix: &str) -> bool {
        self.calls().iter().any(|c| c.starts_with(prefix))
    }

    pub fn inserted(&self) -> InstanceRequest {
        self.inserted
            .lock()
            .unwrap()
            .clone()
            .expect("no instance was inserted")
    }

    pub fn into_service(self: Arc<Self>) -> InstanceService {
        self.into_service_with(ProvisionerConfig::default())
    }

    pub fn into_service_with(self: Arc<Self>, config: ProvisionerConfig) -> InstanceService {
        InstanceService::new(PROJECT, config, self.collaborators())
    }

    pub fn collaborators(self: Arc<Self>) -> Collaborators {
        Collaborators {
            ids: self.clone(),
            disk_types: self.clone(),
            networks: self.clone(),
            subnetworks: self.clone(),
            instances: self.clone(),
            operations: self.clone(),
            target_pools: self.clone(),
            backend_services: self,
        }
    }
}

pub fn instance_link(name: &str) -> String {
    format!(
        "https://www.googleapis.com/compute/v1/projects/{PROJECT}/zones/{ZONE}/instances/{name}"
    )
}

fn api_error(message: &str) -> ComputeError {
    ComputeError::Api {
        status: 500,
        message: message.to_string(),
    }
}

impl IdGenerator for FakeCompute {
    fn generate(&self) -> Result<String, ComputeError> {
        self.record("generate");
        if self.fail_id {
            return Err(ComputeError::Config("entropy exhausted".to_string()));
        }
        Ok("1234".to_string())
    }
}

#[async_trait]
impl DiskTypeCatalog for FakeCompute {
    async fn find(&self, disk_type: &str, zone: &str) -> Result<Option<DiskType>, ComputeError> {
        self.record(format!("find_disk_type {disk_type} {zone}"));
        Ok((!self.missing_disk_type).then(|| DiskType {
            name: disk_type.to_string(),
            self_link: format!("zones/{zone}/diskTypes/{disk_type}"),
        }))
    }
}

#[async_trait]
impl NetworkCatalog for FakeCompute {
    async fn find(
        &self,
        project: &str,
        network: &str,
    ) -> Result<Option<VpcNetwork>, ComputeError> {
        self.record(format!("find_network {project} {network}"));
        Ok((!self.missing_network).then(|| VpcNetwork {
            name: network.to_string(),
            self_link: format!("projects/{project}/global/networks/{network}"),
        }))
    }
}

#[async_trait]
impl SubnetworkCatalog for FakeCompute {
    async fn find(
        &self,
        project: &str,
        subnetwork: &str,
        region: &str,
    ) -> Result<Subnetwork, ComputeError> {
        self.record(format!("find_subnetwork {project} {subnetwork} {region}"));
        if self.missing_subnetwork {
            return Err(ComputeError::NotFound(subnetwork.to_string()));
        }
        Ok(Subnetwork {
            name: subnetwork.to_string(),
            self_link: format!("projects/{project}/regions/{region}/subnetworks/{subnetwork}"),
        })
    }
}

#[async_trait]
impl InstanceApi for FakeCompute {
    async fn insert(
        &self,
        _project: &str,
        zone: &str,
        instance: &InstanceRequest,
    ) -> Result<Operation, ComputeError> {
        self.record(format!("insert {zone} {}", instance.name));
        if self.fail_insert {
            return Err(ComputeError::Api {
                status: 409,
                message: "already exists".to_string(),
            });
        }
        *self.inserted.lock().unwrap() = Some(instance.clone());
        Ok(Operation {
            name: format!("insert-{}", instance.name),
            status: "PENDING".to_string(),
            target_link: Some(instance_link(&instance.name)),
            ..Default::default()
        })
    }

    async fn delete(
        &self,
        _project: &str,
        zone: &str,
        name: &str,
    ) -> Result<Operation, ComputeError> {
        self.record(format!("delete {zone} {name}"));
        if self.instance_gone {
            return Err(ComputeError::NotFound(name.to_string()));
        }
        if self.fail_delete {
            return Err(api_error("delete refused"));
        }
        Ok(Operation {
            name: format!("delete-{name}"),
            status: "PENDING".to_string(),
            ..Default::default()
        })
    }
}

#[async_trait]
impl OperationWaiter for FakeCompute {
    async fn wait(
        &self,
        operation: &Operation,
        zone: Option<&str>,
        _region: Option<&str>,
    ) -> Result<Operation, ComputeError> {
        self.record(format!("wait {} {}", operation.name, zone.unwrap_or("-")));
        if self.fail_insert_wait && operation.name.starts_with("insert-") {
            return Err(ComputeError::OperationFailed {
                operation: operation.name.clone(),
                message: "ZONE_RESOURCE_POOL_EXHAUSTED: no capacity".to_string(),
            });
        }
        Ok(Operation {
            status: "DONE".to_string(),
            ..operation.clone()
        })
    }
}

#[async_trait]
impl TargetPools for FakeCompute {
    async fn add_instance(&self, pool: &str, instance_link: &str) -> Result<(), ComputeError> {
        self.record(format!("target_pool.add {pool} {instance_link}"));
        if self.fail_target_pool {
            return Err(api_error("target pool unavailable"));
        }
        Ok(())
    }

    async fn remove_instance(&self, pool: &str, instance_link: &str) -> Result<(), ComputeError> {
        self.record(format!("target_pool.remove {pool} {instance_link}"));
        Ok(())
    }

    async fn find_by_instance(
        &self,
        instance_link: &str,
        _region: Option<&str>,
    ) -> Result<Option<String>, ComputeError> {
        self.record(format!("target_pool.find {instance_link}"));
        Ok(None)
    }
}

#[async_trait]
impl BackendServices for FakeCompute {
    async fn add_instance(
        &self,
        backend_service: &str,
        instance_link: &str,
    ) -> Result<(), ComputeError> {
        self.record(format!("backend.add {backend_service} {instance_link}"));
        if self.fail_backend_service {
            return Err(api_error("backend service unavailable"));
        }
        Ok(())
    }

    async fn remove_instance(&self, instance_link: &str) -> Result<(), ComputeError> {
        self.record(format!("backend.remove {instance_link}"));
        Ok(())
    }
}

pub fn properties(machine_type: &str) -> VmProperties {
    VmProperties {
        zone: ZONE.to_string(),
        machine_type: machine_type.to_string(),
        stemcell: "global/images/stemcell-ubuntu-jammy".to_string(),
        ..Default::default()
    }
}

pub fn dynamic_network() -> Networks {
    [("default".to_string(), Network::default())]
        .into_iter()
        .collect()
}

pub fn manual_network_with_subnet(subnetwork: &str) -> Networks {
    let mut network = Network {
        kind: NetworkKind::Manual,
        ip: Some("10.0.16.4".to_string()),
        dns: vec!["10.0.0.2".to_string()],
        ..Default::default()
    };
    network.cloud_properties.network_name = Some("cf".to_string());
    network.cloud_properties.subnetwork_name = Some(subnetwork.to_string());
    [("private".to_string(), network)].into_iter().collect()
}
