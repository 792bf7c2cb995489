//! Compute Engine REST client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::{debug, info, warn};

use super::models::{
    BackendServiceList, BackendServiceResource, InstanceGroupInstances, InstancesRequest,
    TargetPoolAggregatedList,
};
use crate::compute::models::{DiskType, InstanceRequest, Operation, Subnetwork, VpcNetwork};
use crate::compute::{
    region_from_zone, resource_name, BackendServices, DiskTypeCatalog, InstanceApi,
    NetworkCatalog, OperationWaiter, SubnetworkCatalog, TargetPools,
};
use crate::config::PollConfig;
use crate::error::ComputeError;

/// Compute Engine v1 API root.
pub const COMPUTE_BASE_URL: &str = "https://compute.googleapis.com/compute/v1";

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Compute Engine client for one project.
#[derive(Clone)]
pub struct GceClient {
    /// HTTP client.
    client: Client,
    /// API root, overridable for tests.
    base_url: String,
    /// Project ID.
    project_id: String,
    /// `OAuth2` access token.
    access_token: String,
    /// Operation polling backoff.
    poll: PollConfig,
}

impl GceClient {
    /// Create a new client.
    ///
    /// # Errors
    /// Returns error if HTTP client cannot be created.
    pub fn new(
        project_id: impl Into<String>,
        access_token: impl Into<String>,
        poll: PollConfig,
    ) -> Result<Self, ComputeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(ComputeError::Http)?;

        Ok(Self {
            client,
            base_url: COMPUTE_BASE_URL.to_string(),
            project_id: project_id.into(),
            access_token: access_token.into(),
            poll,
        })
    }

    /// Point the client at a different API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Project this client operates in.
    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn url(&self, project: &str, path: &str) -> String {
        format!("{}/projects/{project}/{path}", self.base_url)
    }

    /// Make an authenticated GET request.
    async fn get<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, ComputeError> {
        debug!(url = %url, "GET request");

        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Make an authenticated POST request.
    async fn post<T, B>(&self, url: &str, body: &B) -> Result<T, ComputeError>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        debug!(url = %url, "POST request");

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Make an authenticated DELETE request returning an operation.
    async fn delete_request(&self, url: &str) -> Result<Operation, ComputeError> {
        debug!(url = %url, "DELETE request");

        let response = self
            .client
            .delete(url)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Handle API response.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ComputeError> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            serde_json::from_str(&text).map_err(|e| {
                warn!(error = %e, body = %text, "Failed to parse response");
                ComputeError::Serialization(e)
            })
        } else if status == StatusCode::NOT_FOUND {
            Err(ComputeError::NotFound(text))
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Err(ComputeError::Auth(text))
        } else {
            Err(ComputeError::Api {
                status: status.as_u16(),
                message: text,
            })
        }
    }

    /// Poll an operation until it is done, backing off between polls.
    async fn poll_operation(
        &self,
        operation: &Operation,
        zone: Option<&str>,
        region: Option<&str>,
    ) -> Result<Operation, ComputeError> {
        let zone = zone.or(operation.zone.as_deref()).map(resource_name);
        let region = region.or(operation.region.as_deref()).map(resource_name);
        let path = match (zone, region) {
            (Some(zone), _) => format!("zones/{zone}/operations/{}", operation.name),
            (None, Some(region)) => format!("regions/{region}/operations/{}", operation.name),
            (None, None) => format!("global/operations/{}", operation.name),
        };
        let url = self.url(&self.project_id, &path);

        let mut current = operation.clone();
        let mut delay = self.poll.initial_delay();
        let mut attempt = 0;

        loop {
            if current.is_done() {
                if let Some(message) = current.error_message() {
                    return Err(ComputeError::OperationFailed {
                        operation: current.name,
                        message,
                    });
                }
                debug!(operation = %current.name, "Operation done");
                return Ok(current);
            }

            attempt += 1;
            if attempt > self.poll.max_attempts {
                return Err(ComputeError::Timeout(self.poll.max_attempts));
            }

            debug!(
                operation = %current.name,
                status = %current.status,
                attempt,
                "Polling operation status"
            );

            tokio::time::sleep(delay).await;
            delay = self.poll.next_delay(delay);
            current = self.get(&url).await?;
        }
    }

    /// Submit an instance-list mutation on a target pool and wait for it.
    async fn mutate_target_pool(
        &self,
        pool: &str,
        instance_link: &str,
        action: &str,
    ) -> Result<(), ComputeError> {
        let region = region_from_zone(instance_zone(instance_link)?);
        let url = self.url(
            &self.project_id,
            &format!("regions/{region}/targetPools/{pool}/{action}"),
        );

        let operation: Operation = self
            .post(&url, &InstancesRequest::single(instance_link))
            .await?;
        self.poll_operation(&operation, None, Some(&region)).await?;
        Ok(())
    }

    /// Submit an instance-list mutation on an instance group and wait for it.
    async fn mutate_instance_group(
        &self,
        group_link: &str,
        instance_link: &str,
        action: &str,
    ) -> Result<(), ComputeError> {
        let zone = instance_zone(group_link)?;
        let url = self.url(
            &self.project_id,
            &format!(
                "zones/{zone}/instanceGroups/{}/{action}",
                resource_name(group_link)
            ),
        );

        let operation: Operation = self
            .post(&url, &InstancesRequest::single(instance_link))
            .await?;
        self.poll_operation(&operation, Some(zone), None).await?;
        Ok(())
    }

    /// Every backend service in the project, across all pages.
    async fn backend_services(&self) -> Result<Vec<BackendServiceResource>, ComputeError> {
        let url = self.url(&self.project_id, "global/backendServices");
        let mut services = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page: BackendServiceList = self.get(&paged(&url, page_token.as_deref())?).await?;
            services.extend(page.items);

            match next_page(page.next_page_token) {
                Some(token) => page_token = Some(token),
                None => return Ok(services),
            }
        }
    }

    /// Whether `instance_link` is a member of the instance group.
    async fn group_has_instance(
        &self,
        zone: &str,
        group_link: &str,
        instance_link: &str,
    ) -> Result<bool, ComputeError> {
        let url = self.url(
            &self.project_id,
            &format!(
                "zones/{zone}/instanceGroups/{}/listInstances",
                resource_name(group_link)
            ),
        );
        let mut page_token: Option<String> = None;

        loop {
            let page: InstanceGroupInstances = self
                .post(&paged(&url, page_token.as_deref())?, &serde_json::json!({}))
                .await?;
            if page.items.iter().any(|m| m.instance == instance_link) {
                return Ok(true);
            }

            match next_page(page.next_page_token) {
                Some(token) => page_token = Some(token),
                None => return Ok(false),
            }
        }
    }

    /// Instance groups backing `service` in `zone`.
    fn groups_in_zone<'a>(
        service: &'a BackendServiceResource,
        zone: &'a str,
    ) -> impl Iterator<Item = &'a str> {
        service
            .backends
            .iter()
            .map(|b| b.group.as_str())
            .filter(move |group| instance_zone(group).is_ok_and(|z| z == zone))
    }
}

/// `url` with the `pageToken` query parameter set when a token is given.
fn paged(url: &str, page_token: Option<&str>) -> Result<String, ComputeError> {
    let Some(token) = page_token else {
        return Ok(url.to_string());
    };
    let mut url = Url::parse(url)
        .map_err(|e| ComputeError::Config(format!("invalid request URL '{url}': {e}")))?;
    url.query_pairs_mut().append_pair("pageToken", token);
    Ok(url.into())
}

/// The token of the following page, if there is one.
fn next_page(token: Option<String>) -> Option<String> {
    token.filter(|t| !t.is_empty())
}

/// Zone segment of an instance or instance group link.
fn instance_zone(link: &str) -> Result<&str, ComputeError> {
    let mut segments = link.split('/');
    while let Some(segment) = segments.next() {
        if segment == "zones" {
            if let Some(zone) = segments.next().filter(|z| !z.is_empty()) {
                return Ok(zone);
            }
        }
    }
    Err(ComputeError::Config(format!(
        "resource link '{link}' does not name a zone"
    )))
}

#[async_trait]
impl DiskTypeCatalog for GceClient {
    async fn find(&self, disk_type: &str, zone: &str) -> Result<Option<DiskType>, ComputeError> {
        let url = self.url(&self.project_id, &format!("zones/{zone}/diskTypes/{disk_type}"));
        match self.get(&url).await {
            Ok(disk_type) => Ok(Some(disk_type)),
            Err(ComputeError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl NetworkCatalog for GceClient {
    async fn find(
        &self,
        project: &str,
        network: &str,
    ) -> Result<Option<VpcNetwork>, ComputeError> {
        let url = self.url(project, &format!("global/networks/{network}"));
        match self.get(&url).await {
            Ok(network) => Ok(Some(network)),
            Err(ComputeError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl SubnetworkCatalog for GceClient {
    async fn find(
        &self,
        project: &str,
        subnetwork: &str,
        region: &str,
    ) -> Result<Subnetwork, ComputeError> {
        let url = self.url(project, &format!("regions/{region}/subnetworks/{subnetwork}"));
        self.get(&url).await
    }
}

#[async_trait]
impl InstanceApi for GceClient {
    async fn insert(
        &self,
        project: &str,
        zone: &str,
        instance: &InstanceRequest,
    ) -> Result<Operation, ComputeError> {
        info!(instance = %instance.name, zone = %zone, "Submitting instance insert");
        let url = self.url(project, &format!("zones/{zone}/instances"));
        self.post(&url, instance).await
    }

    async fn delete(
        &self,
        project: &str,
        zone: &str,
        name: &str,
    ) -> Result<Operation, ComputeError> {
        info!(instance = %name, zone = %zone, "Submitting instance delete");
        let url = self.url(project, &format!("zones/{zone}/instances/{name}"));
        self.delete_request(&url).await
    }
}

#[async_trait]
impl OperationWaiter for GceClient {
    async fn wait(
        &self,
        operation: &Operation,
        zone: Option<&str>,
        region: Option<&str>,
    ) -> Result<Operation, ComputeError> {
        self.poll_operation(operation, zone, region).await
    }
}

#[async_trait]
impl TargetPools for GceClient {
    async fn add_instance(&self, pool: &str, instance_link: &str) -> Result<(), ComputeError> {
        self.mutate_target_pool(pool, instance_link, "addInstance").await
    }

    async fn remove_instance(&self, pool: &str, instance_link: &str) -> Result<(), ComputeError> {
        self.mutate_target_pool(pool, instance_link, "removeInstance")
            .await
    }

    async fn find_by_instance(
        &self,
        instance_link: &str,
        region: Option<&str>,
    ) -> Result<Option<String>, ComputeError> {
        let url = self.url(&self.project_id, "aggregated/targetPools");
        let scope = region.map(|r| format!("regions/{r}"));
        let mut page_token: Option<String> = None;

        loop {
            let page: TargetPoolAggregatedList =
                self.get(&paged(&url, page_token.as_deref())?).await?;

            let found = page
                .items
                .into_iter()
                .filter(|(key, _)| scope.as_ref().is_none_or(|s| s == key))
                .flat_map(|(_, scoped)| scoped.target_pools)
                .find(|pool| pool.instances.iter().any(|i| i == instance_link));
            if let Some(pool) = found {
                return Ok(Some(pool.name));
            }

            match next_page(page.next_page_token) {
                Some(token) => page_token = Some(token),
                None => return Ok(None),
            }
        }
    }
}

#[async_trait]
impl BackendServices for GceClient {
    async fn add_instance(
        &self,
        backend_service: &str,
        instance_link: &str,
    ) -> Result<(), ComputeError> {
        let zone = instance_zone(instance_link)?;
        let url = self.url(
            &self.project_id,
            &format!("global/backendServices/{backend_service}"),
        );
        let service: BackendServiceResource = self.get(&url).await?;

        let group = Self::groups_in_zone(&service, zone).next().ok_or_else(|| {
            ComputeError::NotFound(format!(
                "backend service '{backend_service}' has no instance group in zone '{zone}'"
            ))
        })?;

        self.mutate_instance_group(group, instance_link, "addInstances")
            .await
    }

    async fn remove_instance(&self, instance_link: &str) -> Result<(), ComputeError> {
        let zone = instance_zone(instance_link)?;

        for service in &self.backend_services().await? {
            for group in Self::groups_in_zone(service, zone) {
                if self.group_has_instance(zone, group, instance_link).await? {
                    self.mutate_instance_group(group, instance_link, "removeInstances")
                        .await?;
                    info!(
                        instance = %instance_link,
                        backend_service = %service.name,
                        "Removed instance from backend service"
                    );
                    return Ok(());
                }
            }
        }

        debug!(instance = %instance_link, "Instance is not in any backend service");
        Ok(())
    }
}
