//! SSH key authorization module
//!
//! Keys are handed to the key authorization tool on stdin rather than being
//! written to `authorized_keys` directly.

use crate::CloudInitError;
use crate::system::System;
use tracing::info;

/// Trim each key and join them with newlines, ending with a newline
pub fn key_blob(keys: &[String]) -> String {
    let keys: Vec<&str> = keys.iter().map(|k| k.trim()).collect();
    format!("{}\n", keys.join("\n"))
}

/// Authorize `keys` for `username` under `client_tag`
pub async fn authorize_keys(
    system: &dyn System,
    username: &str,
    client_tag: &str,
    keys: &[String],
) -> Result<(), CloudInitError> {
    info!("Configuring {} SSH keys for user {}", keys.len(), username);

    system
        .authorize_ssh_keys(username, client_tag, &key_blob(keys))
        .await
        .map_err(|cause| CloudInitError::SshAuthorization {
            user: username.to_string(),
            output: cause.output().unwrap_or_default().to_string(),
            cause: Box::new(cause),
        })
}
