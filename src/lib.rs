//! cidata-init library
//!
//! First-boot provisioning from a cloud-init style config drive: mounts the
//! `cidata` volume, sets the hostname from `meta-data`, then applies the
//! `groups` and `users` of a `#cloud-config` `user-data` document.
//!
//! # Design Principles
//!
//! - **Safety First**: No unsafe code (`#![forbid(unsafe_code)]`)
//! - **One pass**: Strictly sequential, no retries, no rollback
//! - **Fault isolation**: One bad group or user never stops the others
//! - **Testable**: Every host mutation goes through [`system::System`]

pub mod config;
pub mod datasources;
pub mod modules;
pub mod report;
pub mod settings;
pub mod stages;
pub mod system;

mod error;

pub use config::{CloudConfig, InstanceMetadata, UserSpec};
pub use error::CloudInitError;
pub use report::ProvisionReport;
pub use settings::Settings;

use datasources::ConfigDrive;
use system::System;
use tracing::info;

/// Run the whole pipeline: open the config source, run both stages, release
/// the source and optionally write the result document
///
/// Only mount, read, signature and decode failures are returned as errors.
/// Item-level failures end up in the returned report.
pub async fn run(
    settings: &Settings,
    system: &dyn System,
) -> Result<ProvisionReport, CloudInitError> {
    let mut report = ProvisionReport::new();
    report.datasource = Some(settings.source.name());

    let result = run_pipeline(settings, system, &mut report).await;

    if let Some(path) = &settings.result_file {
        report.write_result(path, result.as_ref().err()).await;
    }

    result.map(|()| report)
}

async fn run_pipeline(
    settings: &Settings,
    system: &dyn System,
    report: &mut ProvisionReport,
) -> Result<(), CloudInitError> {
    let drive = ConfigDrive::open(&settings.source, system).await?;

    // Release runs whatever the stages return.
    let result = run_stages(&drive, settings, system, report).await;
    drive.release(system).await;
    result
}

async fn run_stages(
    drive: &ConfigDrive,
    settings: &Settings,
    system: &dyn System,
    report: &mut ProvisionReport,
) -> Result<(), CloudInitError> {
    stages::metadata::run(drive, system, report).await?;
    stages::userdata::run(drive, system, settings, report).await?;

    info!(
        "Provisioning finished: {} groups, {} users, {} failures",
        report.groups_created.len(),
        report.users_created.len(),
        report.errors.len()
    );
    Ok(())
}
