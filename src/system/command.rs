//! [`System`] implementation backed by OS utilities

use super::System;
use crate::CloudInitError;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Default bound on every external invocation
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(300);

/// Runs `mount`, `hostnamectl`, `groupadd`, `useradd` and `update-ssh-keys`
#[derive(Debug, Clone)]
pub struct CommandSystem {
    timeout: Duration,
}

impl CommandSystem {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    /// Set the bound applied to each invocation
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run `program`, optionally feeding `input` on stdin, and fail with the
    /// captured stdout and stderr on a non-zero exit
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        input: Option<&[u8]>,
    ) -> Result<(), CloudInitError> {
        debug!("Running {} {}", program, args.join(" "));

        let mut child = Command::new(program)
            .args(args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CloudInitError::command(program, "spawn failure", e.to_string()))?;

        let exchange = async move {
            if let (Some(input), Some(mut stdin)) = (input, child.stdin.take()) {
                stdin.write_all(input).await?;
                // Dropping stdin closes the pipe so the child sees EOF.
                drop(stdin);
            }
            child.wait_with_output().await
        };

        let output = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| CloudInitError::Timeout {
                program: program.to_string(),
                after: self.timeout,
            })?
            .map_err(|e| CloudInitError::command(program, "I/O failure", e.to_string()))?;

        if !output.status.success() {
            let combined = format!(
                "{}{}",
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
            return Err(CloudInitError::command(
                program,
                output.status.to_string(),
                combined.trim_end(),
            ));
        }

        Ok(())
    }
}

impl Default for CommandSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl System for CommandSystem {
    async fn mount(&self, label: &str, target: &Path) -> Result<(), CloudInitError> {
        let target = target.to_string_lossy().into_owned();
        self.run("mount", &["-o", "ro", "-L", label, target.as_str()], None)
            .await
    }

    async fn unmount(&self, target: &Path) -> Result<(), CloudInitError> {
        let target = target.to_string_lossy().into_owned();
        self.run("umount", &[target.as_str()], None).await
    }

    async fn set_hostname(&self, hostname: &str) -> Result<(), CloudInitError> {
        self.run("hostnamectl", &["set-hostname", hostname], None)
            .await
    }

    async fn add_group(&self, name: &str) -> Result<(), CloudInitError> {
        self.run("groupadd", &[name], None).await
    }

    async fn add_user(&self, args: &[String]) -> Result<(), CloudInitError> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run("useradd", &args, None).await
    }

    async fn authorize_ssh_keys(
        &self,
        user: &str,
        client_tag: &str,
        keys: &str,
    ) -> Result<(), CloudInitError> {
        self.run(
            "update-ssh-keys",
            &["-u", user, "-a", client_tag],
            Some(keys.as_bytes()),
        )
        .await
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_success() {
        let system = CommandSystem::new();
        system.run("true", &[], None).await.unwrap();
    }

    #[tokio::test]
    async fn test_run_failure_captures_output() {
        let system = CommandSystem::new();
        let err = system
            .run("sh", &["-c", "echo out; echo err >&2; exit 3"], None)
            .await
            .unwrap_err();

        match err {
            CloudInitError::Command {
                program,
                status,
                output,
            } => {
                assert_eq!(program, "sh");
                assert!(status.contains('3'));
                assert_eq!(output, "out\nerr");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_run_feeds_stdin() {
        let system = CommandSystem::new();
        let err = system
            .run("sh", &["-c", "cat; exit 1"], Some(b"key1\nkey2\n"))
            .await
            .unwrap_err();
        assert_eq!(err.output(), Some("key1\nkey2"));
    }

    #[tokio::test]
    async fn test_run_times_out() {
        let system = CommandSystem::new().with_timeout(Duration::from_millis(100));
        let err = system.run("sleep", &["5"], None).await.unwrap_err();
        assert!(
            matches!(err, CloudInitError::Timeout { after, .. } if after == Duration::from_millis(100))
        );
        assert_eq!(err.to_string(), "Timeout waiting for sleep after 100ms");
    }

    #[tokio::test]
    async fn test_missing_program() {
        let system = CommandSystem::new();
        let err = system
            .run("definitely-not-a-real-program-xyz", &[], None)
            .await
            .unwrap_err();
        assert!(matches!(err, CloudInitError::Command { .. }));
    }
}
