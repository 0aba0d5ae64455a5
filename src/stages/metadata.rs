//! Metadata stage

use crate::CloudInitError;
use crate::config::InstanceMetadata;
use crate::datasources::ConfigDrive;
use crate::modules::hostname;
use crate::report::ProvisionReport;
use crate::system::System;
use tracing::{debug, info};

/// Decode `meta-data` and apply the hostname
pub async fn run(
    drive: &ConfigDrive,
    system: &dyn System,
    report: &mut ProvisionReport,
) -> Result<InstanceMetadata, CloudInitError> {
    // Historical banner; log scrapers match on it for both stages.
    info!("Processing user-data");

    let raw = drive.read_meta_data().await?;
    let metadata = InstanceMetadata::from_bytes(&raw)?;
    report.instance_id = metadata.instance_id.clone();

    match metadata.hostname() {
        Some(name) => {
            if let Err(e) = hostname::set_hostname(system, name).await {
                report.record(e);
            }
        }
        None => debug!("No local-hostname in meta-data, leaving hostname alone"),
    }

    Ok(metadata)
}
