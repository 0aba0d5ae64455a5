//! Configuration sources
//!
//! The instance configuration lives on a small volume labelled `cidata`
//! holding `meta-data` and `user-data`. For hosts that already expose the
//! files somewhere (or for testing), a plain seed directory works too.

pub mod nocloud;

pub use nocloud::ConfigDrive;

use std::path::PathBuf;

/// Label of the configuration volume
pub const CONFIG_DRIVE_LABEL: &str = "cidata";

/// Instance metadata document
pub const META_DATA_FILE: &str = "meta-data";

/// Cloud-config document
pub const USER_DATA_FILE: &str = "user-data";

/// Where the two configuration documents come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Mount the volume with this label on a temporary mount point
    Volume { label: String },
    /// Read directly from an existing directory, nothing is mounted
    SeedDir(PathBuf),
}

impl ConfigSource {
    /// Name reported in the run result
    pub fn name(&self) -> &'static str {
        match self {
            ConfigSource::Volume { .. } => "ConfigDrive",
            ConfigSource::SeedDir(_) => "NoCloud",
        }
    }
}

impl Default for ConfigSource {
    fn default() -> Self {
        ConfigSource::Volume {
            label: CONFIG_DRIVE_LABEL.to_string(),
        }
    }
}
