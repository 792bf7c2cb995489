use serde::Serialize;

use crate::compute::models::{Metadata, MetadataItem};
use crate::config::ProvisionerConfig;
use crate::error::ProvisionError;

/// User data document read by the agent on first boot.
#[derive(Debug, Serialize)]
pub struct UserData<'a> {
    /// Server identity.
    pub server: ServerName<'a>,
    /// Registry the agent fetches its settings from.
    pub registry: RegistryEndpoint<'a>,
    /// Name servers, omitted when none are configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns: Option<DnsItems<'a>>,
}

/// `server` block of [`UserData`].
#[derive(Debug, Serialize)]
pub struct ServerName<'a> {
    /// Instance name.
    pub name: &'a str,
}

/// `registry` block of [`UserData`].
#[derive(Debug, Serialize)]
pub struct RegistryEndpoint<'a> {
    /// Registry URL.
    pub endpoint: &'a str,
}

/// `dns` block of [`UserData`].
#[derive(Debug, Serialize)]
pub struct DnsItems<'a> {
    /// Name server addresses.
    pub nameserver: &'a [String],
}

/// Serialize the user data and wrap it as the single metadata item.
///
/// # Errors
/// Returns [`ProvisionError::UserData`] if serialization fails.
pub fn metadata(
    name: &str,
    registry_endpoint: &str,
    dns: &[String],
    config: &ProvisionerConfig,
) -> Result<Metadata, ProvisionError> {
    let user_data = UserData {
        server: ServerName { name },
        registry: RegistryEndpoint {
            endpoint: registry_endpoint,
        },
        dns: (!dns.is_empty()).then_some(DnsItems { nameserver: dns }),
    };

    let value = serde_json::to_string(&user_data).map_err(ProvisionError::UserData)?;

    Ok(Metadata {
        items: vec![MetadataItem {
            key: config.user_data_key.clone(),
            value,
        }],
    })
}
