//! Config drive access
//!
//! Mounts the labelled volume on a fresh temporary directory and exposes the
//! two documents as raw bytes. The handle must be given back with
//! [`ConfigDrive::release`], which unmounts the volume and removes the mount
//! point.

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::fs;
use tracing::{debug, info, warn};

use super::{ConfigSource, META_DATA_FILE, USER_DATA_FILE};
use crate::CloudInitError;
use crate::system::System;

/// An opened configuration source
#[derive(Debug)]
pub struct ConfigDrive {
    dir: PathBuf,
    /// Owned mount point, present only when we mounted the volume ourselves
    mount_point: Option<TempDir>,
}

impl ConfigDrive {
    /// Locate the documents for `source`, mounting the volume if needed
    pub async fn open(source: &ConfigSource, system: &dyn System) -> Result<Self, CloudInitError> {
        match source {
            ConfigSource::SeedDir(dir) => {
                debug!("Using seed directory {}", dir.display());
                Ok(Self {
                    dir: dir.clone(),
                    mount_point: None,
                })
            }
            ConfigSource::Volume { label } => {
                info!("Mounting config drive with LABEL = {}", label);

                let mount_point = tempfile::Builder::new()
                    .prefix("configdrive")
                    .tempdir()
                    .map_err(|e| CloudInitError::mount(label, e.to_string()))?;

                // On failure the TempDir is dropped, which removes the mount point.
                system
                    .mount(label, mount_point.path())
                    .await
                    .map_err(|e| CloudInitError::mount(label, e.to_string()))?;

                debug!("Mounted {} at {}", label, mount_point.path().display());
                Ok(Self {
                    dir: mount_point.path().to_path_buf(),
                    mount_point: Some(mount_point),
                })
            }
        }
    }

    /// Directory holding the documents
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Raw `meta-data` document
    pub async fn read_meta_data(&self) -> Result<Vec<u8>, CloudInitError> {
        self.read(META_DATA_FILE).await
    }

    /// Raw `user-data` document
    pub async fn read_user_data(&self) -> Result<Vec<u8>, CloudInitError> {
        self.read(USER_DATA_FILE).await
    }

    async fn read(&self, filename: &str) -> Result<Vec<u8>, CloudInitError> {
        let path = self.dir.join(filename);
        fs::read(&path)
            .await
            .map_err(|source| CloudInitError::Read { path, source })
    }

    /// Unmount the volume and remove the mount point
    ///
    /// If unmounting fails the mount point is left in place rather than
    /// removing files from a still-mounted volume.
    pub async fn release(self, system: &dyn System) {
        let Some(mount_point) = self.mount_point else {
            return;
        };

        match system.unmount(mount_point.path()).await {
            Ok(()) => {
                debug!("Unmounted {}", mount_point.path().display());
                if let Err(e) = mount_point.close() {
                    warn!("Could not remove mount point: {}", e);
                }
            }
            Err(e) => {
                let path = mount_point.keep();
                warn!("Could not unmount {}: {}", path.display(), e);
            }
        }
    }
}
