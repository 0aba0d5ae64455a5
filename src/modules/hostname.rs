//! Hostname configuration module

use crate::CloudInitError;
use crate::system::System;
use tracing::info;

/// Set the system hostname
pub async fn set_hostname(system: &dyn System, hostname: &str) -> Result<(), CloudInitError> {
    info!("Setting hostname to: {}", hostname);

    system
        .set_hostname(hostname)
        .await
        .map_err(|cause| CloudInitError::Hostname {
            hostname: hostname.to_string(),
            cause: Box::new(cause),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::{Invocation, MockSystem};

    #[tokio::test]
    async fn test_set_hostname() {
        let system = MockSystem::new();
        set_hostname(&system, "node-1").await.unwrap();
        assert_eq!(
            system.invocations(),
            vec![Invocation::SetHostname("node-1".to_string())]
        );
    }

    #[tokio::test]
    async fn test_set_hostname_failure() {
        let system = MockSystem::new().with_hostname_failure();
        let err = set_hostname(&system, "node-1").await.unwrap_err();
        assert!(matches!(err, CloudInitError::Hostname { ref hostname, .. } if hostname == "node-1"));
        assert_eq!(err.output(), Some("Could not set static hostname"));
    }
}
