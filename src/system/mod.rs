//! Host capabilities
//!
//! Every mutation of the host goes through the [`System`] trait so the
//! provisioning steps never touch the account database or mount table
//! directly. [`command::CommandSystem`] drives the usual OS utilities and
//! [`mock::MockSystem`] records invocations for tests.

pub mod command;
pub mod mock;

pub use command::CommandSystem;
pub use mock::{Invocation, MockSystem};

use crate::CloudInitError;
use async_trait::async_trait;
use std::path::Path;

/// Operations the provisioning engine needs from the host
///
/// Failed invocations return [`CloudInitError::Command`] carrying the
/// captured output of the failed program.
#[async_trait]
pub trait System: Send + Sync {
    /// Mount the filesystem with `label` at `target`
    async fn mount(&self, label: &str, target: &Path) -> Result<(), CloudInitError>;

    /// Unmount whatever is mounted at `target`
    async fn unmount(&self, target: &Path) -> Result<(), CloudInitError>;

    /// Set the running hostname
    async fn set_hostname(&self, hostname: &str) -> Result<(), CloudInitError>;

    /// Create a group
    async fn add_group(&self, name: &str) -> Result<(), CloudInitError>;

    /// Create a user account from a prepared argument list
    async fn add_user(&self, args: &[String]) -> Result<(), CloudInitError>;

    /// Hand newline-joined public keys for `user` to the key authorization tool
    async fn authorize_ssh_keys(
        &self,
        user: &str,
        client_tag: &str,
        keys: &str,
    ) -> Result<(), CloudInitError>;
}
