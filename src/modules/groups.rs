//! Group creation module

use crate::CloudInitError;
use crate::report::ProvisionReport;
use crate::system::System;
use tracing::info;

/// Create groups in order; a failed group is recorded and skipped
pub async fn create_groups(system: &dyn System, groups: &[String], report: &mut ProvisionReport) {
    for group in groups {
        match create_group(system, group).await {
            Ok(()) => report.groups_created.push(group.clone()),
            Err(e) => report.record(e),
        }
    }
}

/// Create a single group
pub async fn create_group(system: &dyn System, name: &str) -> Result<(), CloudInitError> {
    info!("Creating group: {}", name);

    system
        .add_group(name)
        .await
        .map_err(|cause| CloudInitError::Group {
            group: name.to_string(),
            cause: Box::new(cause),
        })
}
