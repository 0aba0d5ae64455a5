//! Run settings
//!
//! Everything that differs between a real boot and a test run: where the
//! configuration comes from, where the sudoers fragment goes and how long
//! an external command may take.

use crate::datasources::ConfigSource;
use crate::modules::sudoers::{SUDOERS_DIR, fragment_path};
use crate::system::command::DEFAULT_COMMAND_TIMEOUT;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Tag used for the SSH key set and the sudoers fragment name
pub const DEFAULT_CLIENT_TAG: &str = "rancher-flatcar-cloudinit";

/// Settings for a single provisioning run
#[derive(Debug, Clone)]
pub struct Settings {
    /// Where `meta-data` and `user-data` are read from
    pub source: ConfigSource,
    /// Client tag passed to key authorization and used as fragment name
    pub client_tag: String,
    /// Directory the sudoers fragment is created in
    pub sudoers_dir: PathBuf,
    /// Bound on each external command
    pub command_timeout: Duration,
    /// Optional JSON result document
    pub result_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source: ConfigSource::default(),
            client_tag: DEFAULT_CLIENT_TAG.to_string(),
            sudoers_dir: PathBuf::from(SUDOERS_DIR),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            result_file: None,
        }
    }
}

impl Settings {
    /// Read from an existing directory instead of mounting (useful for testing)
    pub fn with_seed_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.source = ConfigSource::SeedDir(dir.as_ref().to_path_buf());
        self
    }

    /// Write the sudoers fragment somewhere other than `/etc/sudoers.d`
    pub fn with_sudoers_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.sudoers_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Full path of the sudoers fragment
    pub fn sudoers_path(&self) -> PathBuf {
        fragment_path(&self.sudoers_dir, &self.client_tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(
            settings.source,
            ConfigSource::Volume {
                label: "cidata".to_string()
            }
        );
        assert_eq!(
            settings.sudoers_path(),
            PathBuf::from("/etc/sudoers.d/rancher-flatcar-cloudinit")
        );
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::default()
            .with_seed_dir("/tmp/seed")
            .with_sudoers_dir("/tmp/sudoers.d");
        assert_eq!(settings.source, ConfigSource::SeedDir("/tmp/seed".into()));
        assert_eq!(
            settings.sudoers_path(),
            PathBuf::from("/tmp/sudoers.d/rancher-flatcar-cloudinit")
        );
    }
}
