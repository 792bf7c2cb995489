//! Compute Engine REST shapes only the client needs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Target pool.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetPool {
    /// Name.
    pub name: String,
    /// Member instance links.
    #[serde(default)]
    pub instances: Vec<String>,
}

/// Aggregated target pool list.
#[derive(Debug, Deserialize)]
pub struct TargetPoolAggregatedList {
    /// Pools keyed by `regions/<region>`.
    #[serde(default)]
    pub items: HashMap<String, TargetPoolsScopedList>,
    /// Token for the next page, absent on the last one.
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

/// Target pools in one region.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetPoolsScopedList {
    /// Pools.
    #[serde(default)]
    pub target_pools: Vec<TargetPool>,
}

/// Backend service.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendServiceResource {
    /// Name.
    pub name: String,
    /// Backends.
    #[serde(default)]
    pub backends: Vec<Backend>,
}

/// Backend of a backend service.
#[derive(Debug, Clone, Deserialize)]
pub struct Backend {
    /// Instance group link.
    pub group: String,
}

/// Backend service list.
#[derive(Debug, Deserialize)]
pub struct BackendServiceList {
    /// Backend services.
    #[serde(default)]
    pub items: Vec<BackendServiceResource>,
    /// Token for the next page.
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

/// Instance group membership list.
#[derive(Debug, Deserialize)]
pub struct InstanceGroupInstances {
    /// Members.
    #[serde(default)]
    pub items: Vec<InstanceReference>,
    /// Token for the next page.
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

/// Reference to an instance by link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceReference {
    /// Instance link.
    pub instance: String,
}

/// Body of add/remove instance calls on target pools and instance groups.
#[derive(Debug, Serialize)]
pub struct InstancesRequest {
    /// Instances to add or remove.
    pub instances: Vec<InstanceReference>,
}

impl InstancesRequest {
    /// Request naming a single instance.
    #[must_use]
    pub fn single(instance_link: &str) -> Self {
        Self {
            instances: vec![InstanceReference {
                instance: instance_link.to_string(),
            }],
        }
    }
}
