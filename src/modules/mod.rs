//! Provisioning modules
//!
//! Each module applies one kind of directive. The user-data stage runs them
//! in a fixed order: groups, users, SSH keys, sudoers. Hostname comes from
//! meta-data and runs first.

pub mod groups;
pub mod hostname;
pub mod ssh_keys;
pub mod sudoers;
pub mod users;
