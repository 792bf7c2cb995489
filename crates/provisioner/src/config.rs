//! Provisioner configuration.
//!
//! Every fixed default the builders rely on, overridable per service.

use std::path::Path;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Defaults and constants used while building an instance request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionerConfig {
    /// Prefix for generated instance names.
    pub instance_name_prefix: String,
    /// Description attached to every instance.
    pub instance_description: String,
    /// Boot disk size used when the properties leave it unset.
    pub default_root_disk_size_gb: u64,
    /// Metadata key carrying the user data document.
    pub user_data_key: String,
    /// Node affinity label for sole-tenant node groups.
    pub node_affinity_key: String,
    /// Service account used when only scopes are requested.
    pub default_service_account: String,
    /// Scope used when only an account is requested.
    pub full_access_scope: String,
    /// Prefix that turns a short scope into a fully qualified one.
    pub scope_prefix: String,
    /// Host maintenance policy for non-preemptible instances.
    pub default_on_host_maintenance: String,
    /// Ephemeral disk type selecting local SSDs, and the disk type looked up
    /// for each scratch disk.
    pub local_ssd_disk_type: String,
    /// vCPUs per GPU on accelerator-optimized machine types.
    pub cpus_per_accelerator: u32,
    /// vCPU cap on accelerator-optimized machine types.
    pub max_accelerator_cpus: u32,
    /// Backoff for polling long-running operations.
    pub operation_poll: PollConfig,
}

impl Default for ProvisionerConfig {
    fn default() -> Self {
        Self {
            instance_name_prefix: "vm".to_string(),
            instance_description: "Instance managed by gce-provisioner".to_string(),
            default_root_disk_size_gb: 10,
            user_data_key: "user_data".to_string(),
            node_affinity_key: "compute.googleapis.com/node-group-name".to_string(),
            default_service_account: "default".to_string(),
            full_access_scope: "https://www.googleapis.com/auth/cloud-platform".to_string(),
            scope_prefix: "https://www.googleapis.com/auth/".to_string(),
            default_on_host_maintenance: "MIGRATE".to_string(),
            local_ssd_disk_type: "local-ssd".to_string(),
            cpus_per_accelerator: 12,
            max_accelerator_cpus: 96,
            operation_poll: PollConfig::default(),
        }
    }
}

impl ProvisionerConfig {
    /// Load configuration from a YAML file. Missing fields keep their defaults.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if the
    /// polling settings are invalid.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config
            .operation_poll
            .validate()
            .with_context(|| format!("Invalid operation_poll in {}", path.display()))?;

        info!(path = %path.display(), "Loaded provisioner config");
        Ok(config)
    }
}

/// Exponential backoff settings for operation polling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Maximum number of polls before giving up.
    pub max_attempts: u32,
    /// Delay before the second poll, in milliseconds.
    pub initial_delay_ms: u64,
    /// Upper bound on the delay between polls, in milliseconds.
    pub max_delay_ms: u64,
    /// Multiplier applied to the delay after each poll.
    pub backoff_multiplier: f64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            initial_delay_ms: 500,
            max_delay_ms: 10_000,
            backoff_multiplier: 1.5,
        }
    }
}

impl PollConfig {
    /// Check the settings describe a usable backoff.
    ///
    /// # Errors
    /// Returns an error if `max_attempts` is zero or `backoff_multiplier` is
    /// not a finite number of at least 1.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.max_attempts > 0, "max_attempts must be at least 1");
        ensure!(
            self.backoff_multiplier.is_finite() && self.backoff_multiplier >= 1.0,
            "backoff_multiplier must be a finite number >= 1, got {}",
            self.backoff_multiplier
        );
        Ok(())
    }

    /// Delay to sleep after `delay`, capped at `max_delay_ms`.
    #[must_use]
    pub fn next_delay(&self, delay: Duration) -> Duration {
        let max = Duration::from_millis(self.max_delay_ms);
        Duration::try_from_secs_f64(delay.as_secs_f64() * self.backoff_multiplier)
            .map_or(max, |next| next.min(max))
    }

    /// First delay between polls.
    #[must_use]
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: ProvisionerConfig = serde_yaml::from_str(
            "instance_name_prefix: bosh\noperation_poll:\n  max_attempts: 3\n",
        )
        .unwrap();

        assert_eq!(config.instance_name_prefix, "bosh");
        assert_eq!(config.default_root_disk_size_gb, 10);
        assert_eq!(config.operation_poll.max_attempts, 3);
        assert_eq!(config.operation_poll.initial_delay_ms, 500);
    }

    #[test]
    fn test_next_delay_is_capped() {
        let poll = PollConfig {
            max_attempts: 10,
            initial_delay_ms: 1_000,
            max_delay_ms: 2_000,
            backoff_multiplier: 3.0,
        };
        let delay = poll.next_delay(poll.initial_delay());
        assert_eq!(delay, Duration::from_millis(2_000));
    }

    #[test]
    fn test_rejects_bad_backoff_multiplier() {
        for multiplier in ["-1.5", ".nan", "0.5"] {
            let config: ProvisionerConfig = serde_yaml::from_str(&format!(
                "operation_poll:\n  backoff_multiplier: {multiplier}\n"
            ))
            .unwrap();
            assert!(
                config.operation_poll.validate().is_err(),
                "multiplier {multiplier} accepted"
            );
        }
        assert!(PollConfig::default().validate().is_ok());
    }

    #[test]
    fn test_next_delay_never_panics() {
        let poll = PollConfig {
            backoff_multiplier: f64::NAN,
            ..Default::default()
        };
        assert_eq!(
            poll.next_delay(poll.initial_delay()),
            Duration::from_millis(poll.max_delay_ms)
        );
    }

    #[test]
    fn test_load_rejects_invalid_poll_settings() {
        let path = std::env::temp_dir().join(format!(
            "provisioner-config-{}.yaml",
            std::process::id()
        ));
        std::fs::write(&path, "operation_poll:\n  backoff_multiplier: -2\n").unwrap();

        let err = ProvisionerConfig::load(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(format!("{err:#}").contains("backoff_multiplier"));
    }
}
