use crate::compute::models::{NodeAffinity, Scheduling};
use crate::config::ProvisionerConfig;
use crate::properties::VmProperties;

/// Scheduling policy. Preemptible instances carry nothing but the flag.
#[must_use]
pub fn scheduling(props: &VmProperties, config: &ProvisionerConfig) -> Scheduling {
    if props.preemptible {
        return Scheduling {
            preemptible: true,
            ..Default::default()
        };
    }

    let on_host_maintenance = props
        .on_host_maintenance
        .clone()
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| config.default_on_host_maintenance.clone());

    let node_affinities = props
        .node_group
        .iter()
        .filter(|group| !group.is_empty())
        .map(|group| NodeAffinity {
            key: config.node_affinity_key.clone(),
            operator: "IN".to_string(),
            values: vec![group.clone()],
        })
        .collect();

    Scheduling {
        preemptible: false,
        automatic_restart: Some(props.automatic_restart),
        on_host_maintenance: Some(on_host_maintenance),
        node_affinities,
    }
}
