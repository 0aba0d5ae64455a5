//! Mock host for testing
//!
//! Records every invocation in order and fails the ones it is told to.

use super::System;
use crate::CloudInitError;
use crate::datasources::{META_DATA_FILE, USER_DATA_FILE};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A single recorded call on [`MockSystem`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Mount { label: String, target: PathBuf },
    Unmount { target: PathBuf },
    SetHostname(String),
    AddGroup(String),
    AddUser(Vec<String>),
    AuthorizeSshKeys {
        user: String,
        client_tag: String,
        keys: String,
    },
}

/// Mock host for testing
///
/// # Example
/// ```
/// use cidata_init::system::MockSystem;
///
/// let mock = MockSystem::new()
///     .with_volume("local-hostname: node-1\n", "#cloud-config\ngroups: [docker]\n")
///     .with_failing_group("docker");
/// ```
#[derive(Debug, Default)]
pub struct MockSystem {
    volume: Option<(String, String)>,
    fail_mount: bool,
    fail_hostname: bool,
    failing_groups: HashSet<String>,
    failing_users: HashSet<String>,
    failing_keys: HashSet<String>,
    invocations: Mutex<Vec<Invocation>>,
}

impl MockSystem {
    /// Create a mock where every call succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// Files that appear in the mount point when the volume is mounted
    pub fn with_volume(mut self, meta_data: &str, user_data: &str) -> Self {
        self.volume = Some((meta_data.to_string(), user_data.to_string()));
        self
    }

    /// Fail every mount
    pub fn with_mount_failure(mut self) -> Self {
        self.fail_mount = true;
        self
    }

    /// Fail hostname assignment
    pub fn with_hostname_failure(mut self) -> Self {
        self.fail_hostname = true;
        self
    }

    /// Fail creation of the named group
    pub fn with_failing_group(mut self, name: &str) -> Self {
        self.failing_groups.insert(name.to_string());
        self
    }

    /// Fail creation of the named user
    pub fn with_failing_user(mut self, name: &str) -> Self {
        self.failing_users.insert(name.to_string());
        self
    }

    /// Fail key authorization for the named user
    pub fn with_failing_keys(mut self, user: &str) -> Self {
        self.failing_keys.insert(user.to_string());
        self
    }

    /// All invocations so far, in call order
    pub fn invocations(&self) -> Vec<Invocation> {
        self.lock().clone()
    }

    /// Argument lists passed to user creation
    pub fn user_adds(&self) -> Vec<Vec<String>> {
        self.lock()
            .iter()
            .filter_map(|i| match i {
                Invocation::AddUser(args) => Some(args.clone()),
                _ => None,
            })
            .collect()
    }

    /// Groups passed to group creation
    pub fn group_adds(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|i| match i {
                Invocation::AddGroup(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    /// `(user, keys)` pairs handed to key authorization
    pub fn key_authorizations(&self) -> Vec<(String, String)> {
        self.lock()
            .iter()
            .filter_map(|i| match i {
                Invocation::AuthorizeSshKeys { user, keys, .. } => {
                    Some((user.clone(), keys.clone()))
                }
                _ => None,
            })
            .collect()
    }

    /// Number of group or user creations attempted
    pub fn account_changes(&self) -> usize {
        self.lock()
            .iter()
            .filter(|i| matches!(i, Invocation::AddGroup(_) | Invocation::AddUser(_)))
            .count()
    }

    fn record(&self, invocation: Invocation) {
        self.lock().push(invocation);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Invocation>> {
        // A poisoned lock only means another test thread panicked mid-push.
        self.invocations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn failure(program: &str, output: String) -> CloudInitError {
        CloudInitError::command(program, "exit status: 1", output)
    }
}

#[async_trait]
impl System for MockSystem {
    async fn mount(&self, label: &str, target: &Path) -> Result<(), CloudInitError> {
        self.record(Invocation::Mount {
            label: label.to_string(),
            target: target.to_path_buf(),
        });

        if self.fail_mount {
            return Err(Self::failure(
                "mount",
                format!("mount: can't find LABEL={label}"),
            ));
        }

        if let Some((meta_data, user_data)) = &self.volume {
            tokio::fs::write(target.join(META_DATA_FILE), meta_data).await?;
            tokio::fs::write(target.join(USER_DATA_FILE), user_data).await?;
        }
        Ok(())
    }

    async fn unmount(&self, target: &Path) -> Result<(), CloudInitError> {
        self.record(Invocation::Unmount {
            target: target.to_path_buf(),
        });
        Ok(())
    }

    async fn set_hostname(&self, hostname: &str) -> Result<(), CloudInitError> {
        self.record(Invocation::SetHostname(hostname.to_string()));
        if self.fail_hostname {
            return Err(Self::failure(
                "hostnamectl",
                "Could not set static hostname".to_string(),
            ));
        }
        Ok(())
    }

    async fn add_group(&self, name: &str) -> Result<(), CloudInitError> {
        self.record(Invocation::AddGroup(name.to_string()));
        if self.failing_groups.contains(name) {
            return Err(Self::failure(
                "groupadd",
                format!("groupadd: group '{name}' already exists"),
            ));
        }
        Ok(())
    }

    async fn add_user(&self, args: &[String]) -> Result<(), CloudInitError> {
        self.record(Invocation::AddUser(args.to_vec()));
        let name = args.last().map(String::as_str).unwrap_or_default();
        if self.failing_users.contains(name) {
            return Err(Self::failure(
                "useradd",
                format!("useradd: user '{name}' already exists"),
            ));
        }
        Ok(())
    }

    async fn authorize_ssh_keys(
        &self,
        user: &str,
        client_tag: &str,
        keys: &str,
    ) -> Result<(), CloudInitError> {
        self.record(Invocation::AuthorizeSshKeys {
            user: user.to_string(),
            client_tag: client_tag.to_string(),
            keys: keys.to_string(),
        });
        if self.failing_keys.contains(user) {
            return Err(Self::failure(
                "update-ssh-keys",
                format!("update-ssh-keys: no home directory for {user}"),
            ));
        }
        Ok(())
    }
}
