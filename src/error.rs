//! Error types for cidata-init

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for cidata-init operations
#[derive(Error, Debug)]
pub enum CloudInitError {
    #[error("could not mount config drive with label '{label}': {message}")]
    Mount { label: String, message: String },

    #[error("could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse {document} file as YAML: {source}")]
    Decode {
        document: &'static str,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("user-data is not a cloud-config")]
    UnsupportedFormat,

    #[error("call to {program} failed with {status}: {output}")]
    Command {
        program: String,
        status: String,
        output: String,
    },

    #[error("Timeout waiting for {program} after {after:?}")]
    Timeout { program: String, after: Duration },

    #[error("Error setting hostname '{hostname}': {cause}")]
    Hostname {
        hostname: String,
        cause: Box<CloudInitError>,
    },

    #[error("Error creating group '{group}': {cause}")]
    Group {
        group: String,
        cause: Box<CloudInitError>,
    },

    #[error("Error creating user '{name}': {cause}")]
    UserCreation {
        name: String,
        cause: Box<CloudInitError>,
    },

    #[error("Error authorizing SSH keys for '{user}': {cause}")]
    SshAuthorization {
        user: String,
        cause: Box<CloudInitError>,
        output: String,
    },

    #[error("Error writing sudoers file {}: {source}", .path.display())]
    Sudoers {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CloudInitError {
    /// Create a mount error
    pub fn mount(label: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Mount {
            label: label.into(),
            message: message.into(),
        }
    }

    /// Create a command error from a failed invocation
    pub fn command(
        program: impl Into<String>,
        status: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self::Command {
            program: program.into(),
            status: status.into(),
            output: output.into(),
        }
    }

    /// Errors that abort the whole run; everything else is scoped to one item
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Mount { .. } | Self::Read { .. } | Self::Decode { .. } | Self::UnsupportedFormat
        )
    }

    /// Captured output of the failed invocation, if any
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::Command { output, .. } | Self::SshAuthorization { output, .. } => {
                Some(output.as_str())
            }
            Self::Hostname { cause, .. }
            | Self::Group { cause, .. }
            | Self::UserCreation { cause, .. } => cause.output(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(CloudInitError::mount("cidata", "no such device").is_fatal());
        assert!(CloudInitError::UnsupportedFormat.is_fatal());

        let cause = CloudInitError::command("groupadd", "exit status: 9", "group exists");
        let group = CloudInitError::Group {
            group: "wheel".to_string(),
            cause: Box::new(cause),
        };
        assert!(!group.is_fatal());
        assert_eq!(group.output(), Some("group exists"));
    }

    #[test]
    fn test_timeout_display_keeps_subsecond_bounds() {
        let err = CloudInitError::Timeout {
            program: "update-ssh-keys".to_string(),
            after: Duration::from_millis(250),
        };
        assert_eq!(err.to_string(), "Timeout waiting for update-ssh-keys after 250ms");
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            CloudInitError::UnsupportedFormat.to_string(),
            "user-data is not a cloud-config"
        );

        let err = CloudInitError::UserCreation {
            name: "alice".to_string(),
            cause: Box::new(CloudInitError::command(
                "useradd",
                "exit status: 9",
                "useradd: user 'alice' already exists",
            )),
        };
        assert_eq!(
            err.to_string(),
            "Error creating user 'alice': call to useradd failed with exit status: 9: \
             useradd: user 'alice' already exists"
        );
    }
}
