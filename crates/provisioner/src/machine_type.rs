//! Machine type identifier parsing.
//!
//! Identifiers look like `n2-standard-4`, `custom-4-5120` or `a2-highgpu-1g`,
//! optionally behind a resource path such as
//! `zones/us-central1-a/machineTypes/n2-standard-4`.

use std::fmt;
use std::str::FromStr;

use crate::config::ProvisionerConfig;
use crate::error::ProvisionError;

/// How the vCPU count is encoded in a family's size components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FamilyKind {
    /// `a2*`: the last component is the GPU count with a trailing `g`.
    AcceleratorOptimized,
    /// `n*`: the vCPU count follows the shape (`n2-standard-4`).
    GeneralPurpose,
    /// `custom`: the vCPU count comes first (`custom-4-5120`).
    Custom,
    /// Any other family: the first numeric component.
    Other,
}

/// A parsed machine type identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineType {
    /// Series, e.g. `n2`, `a2`, `custom`.
    pub family: String,
    /// Dash-separated components after the family.
    pub size_components: Vec<String>,
}

impl MachineType {
    /// Parse an identifier, ignoring any leading resource path.
    ///
    /// # Errors
    /// Returns [`ProvisionError::InvalidMachineType`] when the identifier has
    /// no family or no size components.
    pub fn parse(identifier: &str) -> Result<Self, ProvisionError> {
        let name = identifier.rsplit('/').next().unwrap_or(identifier);
        let mut parts = name.split('-');

        let family = parts.next().unwrap_or_default();
        if family.is_empty() {
            return Err(invalid(identifier, "missing machine family"));
        }

        let size_components: Vec<String> = parts.map(str::to_string).collect();
        if size_components.is_empty() {
            return Err(invalid(identifier, "missing size components"));
        }
        if size_components.iter().any(String::is_empty) {
            return Err(invalid(identifier, "empty size component"));
        }

        Ok(Self {
            family: family.to_string(),
            size_components,
        })
    }

    /// Classify the family.
    #[must_use]
    pub fn kind(&self) -> FamilyKind {
        if self.family.starts_with("a2") {
            FamilyKind::AcceleratorOptimized
        } else if self.family.starts_with('n') {
            FamilyKind::GeneralPurpose
        } else if self.family == "custom" {
            FamilyKind::Custom
        } else {
            FamilyKind::Other
        }
    }

    /// Number of vCPUs encoded in the identifier.
    ///
    /// Accelerator-optimized types do not encode vCPUs; they are inferred from
    /// the GPU count at `cpus_per_accelerator` each, capped at
    /// `max_accelerator_cpus`.
    ///
    /// # Errors
    /// Returns [`ProvisionError::InvalidMachineType`] when the component that
    /// should hold a number does not.
    pub fn cpu_count(&self, config: &ProvisionerConfig) -> Result<u32, ProvisionError> {
        match self.kind() {
            FamilyKind::AcceleratorOptimized => {
                let last = self.size_components.last().map_or("", String::as_str);
                let gpus = last.strip_suffix('g').unwrap_or(last);
                let gpus = self.number(gpus)?;
                Ok(gpus
                    .saturating_mul(config.cpus_per_accelerator)
                    .min(config.max_accelerator_cpus))
            }
            FamilyKind::GeneralPurpose => {
                let component = self
                    .size_components
                    .get(1)
                    .ok_or_else(|| invalid(&self.to_string(), "missing vCPU component"))?;
                self.number(component)
            }
            FamilyKind::Custom => {
                let component = self
                    .size_components
                    .first()
                    .ok_or_else(|| invalid(&self.to_string(), "missing vCPU component"))?;
                self.number(component)
            }
            FamilyKind::Other => self
                .size_components
                .iter()
                .find_map(|c| c.parse().ok())
                .ok_or_else(|| invalid(&self.to_string(), "no vCPU component")),
        }
    }

    fn number(&self, component: &str) -> Result<u32, ProvisionError> {
        component
            .parse()
            .map_err(|_| invalid(&self.to_string(), &format!("'{component}' is not a number")))
    }
}

impl FromStr for MachineType {
    type Err = ProvisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MachineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.family, self.size_components.join("-"))
    }
}

fn invalid(machine_type: &str, reason: &str) -> ProvisionError {
    ProvisionError::InvalidMachineType {
        machine_type: machine_type.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpus(identifier: &str) -> Result<u32, ProvisionError> {
        MachineType::parse(identifier)?.cpu_count(&ProvisionerConfig::default())
    }

    #[test]
    fn test_parse_strips_resource_path() {
        let mt = MachineType::parse("zones/us-central1-a/machineTypes/n2-standard-4").unwrap();
        assert_eq!(mt.family, "n2");
        assert_eq!(mt.size_components, vec!["standard", "4"]);
        assert_eq!(mt.kind(), FamilyKind::GeneralPurpose);
        assert_eq!(mt.to_string(), "n2-standard-4");
    }

    #[test]
    fn test_cpu_count_by_family() {
        assert_eq!(cpus("n1-standard-1").unwrap(), 1);
        assert_eq!(cpus("n2d-highmem-96").unwrap(), 96);
        assert_eq!(cpus("custom-4-5120").unwrap(), 4);
        assert_eq!(cpus("e2-standard-8").unwrap(), 8);
        assert_eq!(cpus("a2-highgpu-1g").unwrap(), 12);
    }

    #[test]
    fn test_accelerator_cpus_are_capped() {
        for gpus in 1..=16u32 {
            let identifier = format!("a2-highgpu-{gpus}g");
            assert_eq!(cpus(&identifier).unwrap(), (gpus * 12).min(96));
        }
        assert_eq!(cpus("a2-megagpu-16g").unwrap(), 96);
    }

    #[test]
    fn test_cap_follows_config() {
        let config = ProvisionerConfig {
            cpus_per_accelerator: 4,
            max_accelerator_cpus: 10,
            ..Default::default()
        };
        let mt = MachineType::parse("a2-highgpu-2g").unwrap();
        assert_eq!(mt.cpu_count(&config).unwrap(), 8);
        let mt = MachineType::parse("a2-highgpu-4g").unwrap();
        assert_eq!(mt.cpu_count(&config).unwrap(), 10);
    }

    #[test]
    fn test_malformed_identifiers() {
        assert!(MachineType::parse("").is_err());
        assert!(MachineType::parse("n2").is_err());
        assert!(MachineType::parse("n2--4").is_err());
        assert!(matches!(
            cpus("n2-standard-four"),
            Err(ProvisionError::InvalidMachineType { .. })
        ));
        assert!(cpus("n2-standard").is_err());
        assert!(cpus("custom-x-5120").is_err());
        assert!(cpus("a2-highgpu-xg").is_err());
        assert!(cpus("e2-micro").is_err());
    }

    #[test]
    fn test_hand_built_types_without_components() {
        let config = ProvisionerConfig::default();
        for family in ["custom", "n2", "a2", "e2"] {
            let mt = MachineType {
                family: family.to_string(),
                size_components: vec![],
            };
            assert!(
                matches!(
                    mt.cpu_count(&config),
                    Err(ProvisionError::InvalidMachineType { .. })
                ),
                "{family} without components"
            );
        }
    }
}
