//! Provisioning stages
//!
//! Stages run in order, once, against an opened config drive:
//! 1. Metadata - decode `meta-data` and set the hostname
//! 2. User-data - check the `#cloud-config` signature, decode, then create
//!    groups, users, SSH keys and the sudoers fragment
//!
//! Read, signature and decode failures abort the run. Everything past
//! decoding is per item: failures are recorded and the next item is tried.

pub mod metadata;
pub mod userdata;
