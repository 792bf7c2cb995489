//! Logical networks that are merged into the instance's single interface.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::ProvisionError;

/// Network used when the primary network does not name one.
pub const DEFAULT_NETWORK_NAME: &str = "default";

/// Kind of logical network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkKind {
    /// Addresses assigned by the provider.
    #[default]
    Dynamic,
    /// Static internal address.
    Manual,
    /// Reserved external address.
    Vip,
}

/// Provider-specific settings of a network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkCloudProperties {
    /// VPC network name.
    pub network_name: Option<String>,
    /// Shared VPC host project owning the network.
    pub xpn_host_project_id: Option<String>,
    /// Subnetwork name.
    pub subnetwork_name: Option<String>,
    /// Extra network tags.
    pub tags: Vec<String>,
    /// Allocate an ephemeral external IP.
    pub ephemeral_external_ip: bool,
    /// Allow the instance to forward packets.
    pub ip_forwarding: bool,
}

/// A single logical network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Network {
    /// Network kind.
    #[serde(rename = "type")]
    pub kind: NetworkKind,
    /// Address: static internal IP for manual networks, reserved external IP for vip.
    pub ip: Option<String>,
    /// DNS servers.
    pub dns: Vec<String>,
    /// Provider-specific settings.
    pub cloud_properties: NetworkCloudProperties,
}

impl Network {
    fn is_vip(&self) -> bool {
        self.kind == NetworkKind::Vip
    }
}

/// Named logical networks, keyed by network name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Networks(pub BTreeMap<String, Network>);

impl Networks {
    /// Check the networks can be merged into one interface with at most one
    /// external access configuration.
    ///
    /// # Errors
    /// Returns [`ProvisionError::InvalidNetworks`] unless there is exactly one
    /// dynamic or manual network and at most one vip network carrying an IP.
    pub fn validate(&self) -> Result<(), ProvisionError> {
        let primaries = self.0.values().filter(|n| !n.is_vip()).count();
        if primaries != 1 {
            return Err(ProvisionError::InvalidNetworks(format!(
                "exactly one dynamic or manual network is supported, got {primaries}"
            )));
        }

        let vips: Vec<_> = self.0.values().filter(|n| n.is_vip()).collect();
        if vips.len() > 1 {
            return Err(ProvisionError::InvalidNetworks(format!(
                "at most one vip network is supported, got {}",
                vips.len()
            )));
        }
        if vips.iter().any(|n| n.ip.as_deref().is_none_or(str::is_empty)) {
            return Err(ProvisionError::InvalidNetworks(
                "vip network must specify an ip".to_string(),
            ));
        }

        Ok(())
    }

    /// The dynamic or manual network backing the interface.
    #[must_use]
    pub fn primary(&self) -> Option<&Network> {
        self.0.values().find(|n| !n.is_vip())
    }

    /// The vip network, if any.
    #[must_use]
    pub fn vip(&self) -> Option<&Network> {
        self.0.values().find(|n| n.is_vip())
    }

    /// VPC network name.
    #[must_use]
    pub fn network_name(&self) -> &str {
        self.primary()
            .and_then(|n| n.cloud_properties.network_name.as_deref())
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_NETWORK_NAME)
    }

    /// Project owning the network: the shared VPC host project, else `project`.
    #[must_use]
    pub fn network_project<'a>(&'a self, project: &'a str) -> &'a str {
        self.primary()
            .and_then(|n| n.cloud_properties.xpn_host_project_id.as_deref())
            .filter(|p| !p.is_empty())
            .unwrap_or(project)
    }

    /// Subnetwork name, if one was requested.
    #[must_use]
    pub fn subnetwork_name(&self) -> Option<&str> {
        self.primary()
            .and_then(|n| n.cloud_properties.subnetwork_name.as_deref())
            .filter(|s| !s.is_empty())
    }

    /// Whether an ephemeral external IP was requested.
    #[must_use]
    pub fn ephemeral_external_ip(&self) -> bool {
        self.primary()
            .is_some_and(|n| n.cloud_properties.ephemeral_external_ip)
    }

    /// Whether any network asks for IP forwarding.
    #[must_use]
    pub fn can_ip_forward(&self) -> bool {
        self.0.values().any(|n| n.cloud_properties.ip_forwarding)
    }

    /// Static internal IP of a manual network.
    #[must_use]
    pub fn static_private_ip(&self) -> Option<&str> {
        self.primary()
            .filter(|n| n.kind == NetworkKind::Manual)
            .and_then(|n| n.ip.as_deref())
            .filter(|ip| !ip.is_empty())
    }

    /// Reserved external IP pinned by the vip network.
    #[must_use]
    pub fn external_ip(&self) -> Option<&str> {
        self.vip()
            .and_then(|n| n.ip.as_deref())
            .filter(|ip| !ip.is_empty())
    }

    /// DNS servers of the primary network.
    #[must_use]
    pub fn dns(&self) -> &[String] {
        self.primary().map_or(&[], |n| n.dns.as_slice())
    }

    /// Tags from every network, deduplicated.
    #[must_use]
    pub fn tags(&self) -> BTreeSet<String> {
        self.0
            .values()
            .flat_map(|n| n.cloud_properties.tags.iter().cloned())
            .collect()
    }
}

impl FromIterator<(String, Network)> for Networks {
    fn from_iter<T: IntoIterator<Item = (String, Network)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manual(ip: &str) -> Network {
        Network {
            kind: NetworkKind::Manual,
            ip: Some(ip.to_string()),
            dns: vec!["8.8.8.8".to_string()],
            cloud_properties: NetworkCloudProperties {
                network_name: Some("cf".to_string()),
                tags: vec!["a".to_string(), "b".to_string()],
                ..Default::default()
            },
        }
    }

    fn vip(ip: &str) -> Network {
        Network {
            kind: NetworkKind::Vip,
            ip: Some(ip.to_string()),
            cloud_properties: NetworkCloudProperties {
                tags: vec!["b".to_string(), "c".to_string()],
                ip_forwarding: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_merged_accessors() {
        let networks: Networks = [
            ("private".to_string(), manual("10.0.0.5")),
            ("public".to_string(), vip("35.1.2.3")),
        ]
        .into_iter()
        .collect();

        networks.validate().unwrap();
        assert_eq!(networks.network_name(), "cf");
        assert_eq!(networks.network_project("proj"), "proj");
        assert_eq!(networks.static_private_ip(), Some("10.0.0.5"));
        assert_eq!(networks.external_ip(), Some("35.1.2.3"));
        assert!(networks.can_ip_forward());
        assert_eq!(networks.dns(), ["8.8.8.8".to_string()]);
        assert_eq!(
            networks.tags().into_iter().collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn test_dynamic_network_defaults() {
        let networks: Networks = [("default".to_string(), Network::default())]
            .into_iter()
            .collect();

        networks.validate().unwrap();
        assert_eq!(networks.network_name(), DEFAULT_NETWORK_NAME);
        assert_eq!(networks.static_private_ip(), None);
        assert_eq!(networks.subnetwork_name(), None);
        assert!(!networks.ephemeral_external_ip());
        assert!(networks.dns().is_empty());
    }

    #[test]
    fn test_validate_rejects_multiple_interfaces() {
        let networks: Networks = [
            ("a".to_string(), manual("10.0.0.5")),
            ("b".to_string(), Network::default()),
        ]
        .into_iter()
        .collect();
        assert!(matches!(
            networks.validate(),
            Err(ProvisionError::InvalidNetworks(_))
        ));

        let networks: Networks = [
            ("a".to_string(), manual("10.0.0.5")),
            ("b".to_string(), vip("1.1.1.1")),
            ("c".to_string(), vip("2.2.2.2")),
        ]
        .into_iter()
        .collect();
        assert!(networks.validate().is_err());

        assert!(Networks::default().validate().is_err());
    }

    #[test]
    fn test_xpn_host_project_overrides_project() {
        let mut network = Network::default();
        network.cloud_properties.xpn_host_project_id = Some("host".to_string());
        let networks: Networks = [("n".to_string(), network)].into_iter().collect();
        assert_eq!(networks.network_project("service"), "host");
    }
}
