//! Cloud-config parsing and types
//!
//! Handles the two documents found on the config drive: `meta-data` and the
//! `#cloud-config` flavoured `user-data`.

use crate::CloudInitError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

mod scalar;

/// Marker that must open every user-data document we act on
pub const CLOUD_CONFIG_HEADER: &str = "#cloud-config";

/// Instance metadata read from `meta-data`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct InstanceMetadata {
    /// Hostname to assign to the running machine
    #[serde(deserialize_with = "scalar::optional")]
    pub local_hostname: Option<String>,
    /// Instance identifier, only used for the run result
    #[serde(deserialize_with = "scalar::optional")]
    pub instance_id: Option<String>,
}

impl InstanceMetadata {
    /// Parse meta-data from raw bytes. A missing hostname is not an error.
    pub fn from_bytes(data: &[u8]) -> Result<Self, CloudInitError> {
        decode_document(&String::from_utf8_lossy(data), "meta-data")
    }

    /// Hostname to set, ignoring empty values
    pub fn hostname(&self) -> Option<&str> {
        non_empty(&self.local_hostname)
    }
}

/// Main cloud-config structure
///
/// Only `groups` and `users` are acted on; other keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    /// Groups to create, in document order
    #[serde(deserialize_with = "scalar::list")]
    pub groups: Vec<String>,

    /// Users to create, in document order
    pub users: Vec<UserSpec>,
}

/// A single entry of the `users` list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSpec {
    #[serde(deserialize_with = "scalar::string")]
    pub name: String,
    #[serde(default, rename = "password", deserialize_with = "scalar::optional")]
    pub password_hash: Option<String>,
    #[serde(default, deserialize_with = "scalar::optional")]
    pub gecos: Option<String>,
    #[serde(default, deserialize_with = "scalar::optional")]
    pub homedir: Option<String>,
    #[serde(default)]
    pub no_create_home: bool,
    #[serde(default)]
    pub no_user_group: bool,
    #[serde(default)]
    pub no_log_init: bool,
    #[serde(default)]
    pub system: bool,
    #[serde(default, deserialize_with = "scalar::optional")]
    pub primary_group: Option<String>,
    #[serde(default, deserialize_with = "scalar::list")]
    pub groups: Vec<String>,
    #[serde(default, deserialize_with = "scalar::optional")]
    pub shell: Option<String>,
    #[serde(default, deserialize_with = "scalar::list")]
    pub ssh_authorized_keys: Vec<String>,
    #[serde(default, deserialize_with = "scalar::optional")]
    pub sudo: Option<String>,

    // Accepted for compatibility, not acted on.
    #[serde(default)]
    pub lock_passwd: bool,
    #[serde(default)]
    pub create_groups: bool,
}

impl UserSpec {
    /// Home directory to pass to account creation: `homedir` or `/home/<name>`
    pub fn effective_homedir(&self) -> String {
        match non_empty(&self.homedir) {
            Some(dir) => dir.to_string(),
            None => format!("/home/{}", self.name),
        }
    }

    /// The sudoers line for this user. An empty rule still yields `"<name> "`.
    pub fn sudoers_line(&self) -> String {
        format!("{} {}", self.name, self.sudo.as_deref().unwrap_or_default())
    }
}

impl CloudConfig {
    /// Check the signature and parse user-data from raw bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self, CloudInitError> {
        let text = String::from_utf8_lossy(data);
        if !Self::is_cloud_config(&text) {
            return Err(CloudInitError::UnsupportedFormat);
        }
        decode_document(&text, "user-data")
    }

    /// Check if the first line, minus trailing whitespace, is `#cloud-config`
    pub fn is_cloud_config(data: &str) -> bool {
        let header = data.split('\n').next().unwrap_or_default();
        header.trim_end() == CLOUD_CONFIG_HEADER
    }
}

pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Decode a YAML document, treating an empty (or comment-only) one as defaults
fn decode_document<T>(text: &str, document: &'static str) -> Result<T, CloudInitError>
where
    T: DeserializeOwned + Default,
{
    let value: serde_yaml::Value = serde_yaml::from_str(text)
        .map_err(|source| CloudInitError::Decode { document, source })?;

    if value.is_null() {
        return Ok(T::default());
    }

    serde_yaml::from_value(value).map_err(|source| CloudInitError::Decode { document, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_cloud_config() {
        assert!(CloudConfig::is_cloud_config("#cloud-config\ngroups: []"));
        assert!(CloudConfig::is_cloud_config("#cloud-config \t\r\nusers: []"));
        assert!(CloudConfig::is_cloud_config("#cloud-config"));
        assert!(!CloudConfig::is_cloud_config("  #cloud-config\n"));
        assert!(!CloudConfig::is_cloud_config("#!/bin/bash\necho hello"));
        assert!(!CloudConfig::is_cloud_config("#cloud-configs\n"));
        assert!(!CloudConfig::is_cloud_config(""));
    }

    #[test]
    fn test_signature_depends_only_on_first_line() {
        for body in ["", "groups: [a]\n", "not: [valid"] {
            assert!(CloudConfig::is_cloud_config(&format!("#cloud-config  \n{body}")));
            assert!(!CloudConfig::is_cloud_config(&format!("#include\n{body}")));
        }
    }

    #[test]
    fn test_parse_full_user() {
        let yaml = r#"#cloud-config
groups:
  - docker
  - admins
users:
  - name: alice
    gecos: Alice Example
    homedir: /srv/alice
    primary_group: admins
    groups: [docker, wheel]
    shell: /bin/bash
    password: "$6$salt$hash"
    no_create_home: true
    no_user_group: true
    no_log_init: true
    system: true
    lock_passwd: true
    create_groups: false
    sudo: "ALL=(ALL) NOPASSWD:ALL"
    ssh_authorized_keys:
      - ssh-ed25519 AAAA alice@laptop
"#;
        let config = CloudConfig::from_bytes(yaml.as_bytes()).unwrap();
        assert_eq!(config.groups, vec!["docker", "admins"]);
        assert_eq!(config.users.len(), 1);

        let alice = &config.users[0];
        assert_eq!(alice.name, "alice");
        assert_eq!(alice.gecos.as_deref(), Some("Alice Example"));
        assert_eq!(alice.password_hash.as_deref(), Some("$6$salt$hash"));
        assert_eq!(alice.groups, vec!["docker", "wheel"]);
        assert!(alice.no_create_home && alice.no_user_group && alice.no_log_init);
        assert!(alice.system && alice.lock_passwd && !alice.create_groups);
        assert_eq!(alice.effective_homedir(), "/srv/alice");
        assert_eq!(alice.ssh_authorized_keys.len(), 1);
    }

    #[test]
    fn test_user_order_preserved() {
        let yaml = "#cloud-config\nusers:\n  - name: c\n  - name: a\n  - name: b\n";
        let config = CloudConfig::from_bytes(yaml.as_bytes()).unwrap();
        let names: Vec<_> = config.users.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["c", "a", "b"]);

        let reencoded = serde_yaml::to_string(&config).unwrap();
        let again = CloudConfig::from_bytes(format!("#cloud-config\n{reencoded}").as_bytes())
            .unwrap();
        assert_eq!(again, config);
    }

    #[test]
    fn test_default_homedir() {
        let user = UserSpec {
            name: "bob".to_string(),
            homedir: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(user.effective_homedir(), "/home/bob");

        let user = UserSpec {
            name: "carol".to_string(),
            ..Default::default()
        };
        assert_eq!(user.effective_homedir(), "/home/carol");
    }

    #[test]
    fn test_sudoers_line_with_empty_rule() {
        let user = UserSpec {
            name: "bob".to_string(),
            ..Default::default()
        };
        assert_eq!(user.sudoers_line(), "bob ");
    }

    #[test]
    fn test_script_rejected_before_parsing() {
        let err = CloudConfig::from_bytes(b"#!/bin/bash\nuseradd mallory\n").unwrap_err();
        assert!(matches!(err, CloudInitError::UnsupportedFormat));
    }

    #[test]
    fn test_malformed_user_data() {
        let err = CloudConfig::from_bytes(b"#cloud-config\nusers: [unclosed\n").unwrap_err();
        assert!(matches!(err, CloudInitError::Decode { document: "user-data", .. }));
    }

    #[test]
    fn test_header_only_user_data() {
        let config = CloudConfig::from_bytes(b"#cloud-config\n").unwrap();
        assert_eq!(config, CloudConfig::default());
    }

    #[test]
    fn test_metadata_parsing() {
        let meta = InstanceMetadata::from_bytes(b"instance-id: i-123\nlocal-hostname: node-1\n")
            .unwrap();
        assert_eq!(meta.hostname(), Some("node-1"));
        assert_eq!(meta.instance_id.as_deref(), Some("i-123"));

        let meta = InstanceMetadata::from_bytes(b"instance-id: i-123\n").unwrap();
        assert_eq!(meta.hostname(), None);

        let meta = InstanceMetadata::from_bytes(b"local-hostname: ''\n").unwrap();
        assert_eq!(meta.hostname(), None);
    }

    #[test]
    fn test_numeric_scalars_are_text() {
        let meta = InstanceMetadata::from_bytes(b"local-hostname: 1234\n").unwrap();
        assert_eq!(meta.hostname(), Some("1234"));

        let yaml = r#"#cloud-config
groups: [1000, wheel]
users:
  - name: 42
    gecos: 42
    primary_group: 1000
    groups: [1000, true]
    sudo: ALL=(ALL) ALL
    ssh_authorized_keys:
      - ssh-ed25519 AAAA
"#;
        let config = CloudConfig::from_bytes(yaml.as_bytes()).unwrap();
        assert_eq!(config.groups, vec!["1000", "wheel"]);

        let user = &config.users[0];
        assert_eq!(user.name, "42");
        assert_eq!(user.gecos.as_deref(), Some("42"));
        assert_eq!(user.primary_group.as_deref(), Some("1000"));
        assert_eq!(user.groups, vec!["1000", "true"]);
        assert_eq!(user.effective_homedir(), "/home/42");
    }

    #[test]
    fn test_null_values_decode_as_absent() {
        let yaml = "#cloud-config\ngroups:\nusers:\n  - name: bob\n    shell:\n    groups:\n";
        let config = CloudConfig::from_bytes(yaml.as_bytes()).unwrap();
        assert!(config.groups.is_empty());
        assert_eq!(config.users[0].shell, None);
        assert!(config.users[0].groups.is_empty());
    }

    #[test]
    fn test_nested_values_are_rejected() {
        let err = CloudConfig::from_bytes(b"#cloud-config\ngroups:\n  - {name: wheel}\n")
            .unwrap_err();
        assert!(matches!(err, CloudInitError::Decode { document: "user-data", .. }));

        let err = InstanceMetadata::from_bytes(b"local-hostname: [a, b]\n").unwrap_err();
        assert!(matches!(err, CloudInitError::Decode { document: "meta-data", .. }));
    }

    #[test]
    fn test_malformed_metadata() {
        let err = InstanceMetadata::from_bytes(b"local-hostname: [unclosed").unwrap_err();
        assert!(matches!(err, CloudInitError::Decode { document: "meta-data", .. }));
    }
}
