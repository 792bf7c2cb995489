use crate::compute::models::{
    AttachedDisk, DiskInterface, DiskKind, DiskMode, DiskType, InitializeParams,
};
use crate::config::ProvisionerConfig;
use crate::properties::VmProperties;

/// Persistent boot disk created from the stemcell.
#[must_use]
pub fn boot_disk(props: &VmProperties, config: &ProvisionerConfig) -> AttachedDisk {
    let size_gb = props
        .root_disk_size_gb
        .filter(|size| *size > 0)
        .unwrap_or(config.default_root_disk_size_gb);

    AttachedDisk {
        auto_delete: true,
        boot: true,
        initialize_params: InitializeParams {
            disk_size_gb: Some(size_gb.to_string()),
            disk_type: props.root_disk_type.clone().filter(|t| !t.is_empty()),
            source_image: Some(props.stemcell.clone()),
        },
        interface: None,
        index: None,
        mode: Some(DiskMode::ReadWrite),
        kind: DiskKind::Persistent,
    }
}

/// Local scratch disk at a 1-based `index`.
#[must_use]
pub fn local_ssd_disk(disk_type: &DiskType, index: u32, interface: DiskInterface) -> AttachedDisk {
    AttachedDisk {
        auto_delete: true,
        boot: false,
        initialize_params: InitializeParams {
            disk_type: Some(disk_type.self_link.clone()),
            ..Default::default()
        },
        interface: Some(interface),
        index: Some(index),
        mode: None,
        kind: DiskKind::Scratch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boot_disk_defaults_size() {
        let props = VmProperties {
            stemcell: "global/images/stemcell-1".to_string(),
            ..Default::default()
        };
        let disk = boot_disk(&props, &ProvisionerConfig::default());

        assert!(disk.boot);
        assert!(disk.auto_delete);
        assert_eq!(disk.mode, Some(DiskMode::ReadWrite));
        assert_eq!(disk.kind, DiskKind::Persistent);
        assert_eq!(disk.initialize_params.disk_size_gb.as_deref(), Some("10"));
        assert_eq!(
            disk.initialize_params.source_image.as_deref(),
            Some("global/images/stemcell-1")
        );
        assert_eq!(disk.initialize_params.disk_type, None);
    }

    #[test]
    fn test_boot_disk_copies_requested_size_and_type() {
        let props = VmProperties {
            root_disk_size_gb: Some(50),
            root_disk_type: Some("zones/z/diskTypes/pd-ssd".to_string()),
            ..Default::default()
        };
        let disk = boot_disk(&props, &ProvisionerConfig::default());

        assert_eq!(disk.initialize_params.disk_size_gb.as_deref(), Some("50"));
        assert_eq!(
            disk.initialize_params.disk_type.as_deref(),
            Some("zones/z/diskTypes/pd-ssd")
        );
    }

    #[test]
    fn test_local_ssd_disk() {
        let disk_type = DiskType {
            name: "local-ssd".to_string(),
            self_link: "zones/z/diskTypes/local-ssd".to_string(),
        };
        let disk = local_ssd_disk(&disk_type, 3, DiskInterface::Nvme);

        assert!(!disk.boot);
        assert!(disk.auto_delete);
        assert_eq!(disk.index, Some(3));
        assert_eq!(disk.interface, Some(DiskInterface::Nvme));
        assert_eq!(disk.kind, DiskKind::Scratch);
        assert_eq!(
            disk.initialize_params.disk_type.as_deref(),
            Some("zones/z/diskTypes/local-ssd")
        );
    }
}
