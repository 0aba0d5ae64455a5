//! User-data stage

use crate::CloudInitError;
use crate::config::CloudConfig;
use crate::datasources::ConfigDrive;
use crate::modules::{groups, ssh_keys, sudoers::Sudoers, users};
use crate::report::ProvisionReport;
use crate::settings::Settings;
use crate::system::System;
use tracing::{debug, info};

/// Check, decode and apply `user-data`
pub async fn run(
    drive: &ConfigDrive,
    system: &dyn System,
    settings: &Settings,
    report: &mut ProvisionReport,
) -> Result<(), CloudInitError> {
    info!("Processing user-data");

    let raw = drive.read_user_data().await?;
    let config = CloudConfig::from_bytes(&raw)?;
    debug!(
        "Decoded cloud-config with {} groups and {} users",
        config.groups.len(),
        config.users.len()
    );

    apply(&config, system, settings, report).await;
    Ok(())
}

/// Apply a decoded cloud-config: groups, then users with their SSH keys,
/// then the sudoers fragment
///
/// A user whose account could not be created gets neither keys nor a
/// sudoers entry. No failure stops the items after it.
pub async fn apply(
    config: &CloudConfig,
    system: &dyn System,
    settings: &Settings,
    report: &mut ProvisionReport,
) {
    groups::create_groups(system, &config.groups, report).await;

    let mut sudoers = Sudoers::new();
    for user in &config.users {
        if let Err(e) = users::create_user(system, user).await {
            report.record(e);
            continue;
        }
        report.users_created.push(user.name.clone());

        if let Err(e) = ssh_keys::authorize_keys(
            system,
            &user.name,
            &settings.client_tag,
            &user.ssh_authorized_keys,
        )
        .await
        {
            report.record(e);
        }

        sudoers.push(user.sudoers_line());
    }

    match sudoers.write(&settings.sudoers_path()).await {
        Ok(entries) => report.sudoers_entries = entries,
        Err(e) => report.record(e),
    }
}
