//! Sudoers fragment module
//!
//! Lines are accumulated while users are created and written once at the end
//! of the run. An existing fragment is never overwritten.

use crate::CloudInitError;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::info;

/// Directory holding sudoers fragments
pub const SUDOERS_DIR: &str = "/etc/sudoers.d";

/// Separator between entries in the fragment
const LINE_SEPARATOR: &str = "\r\n";

/// Path of the fragment for `client_tag` inside `dir`
pub fn fragment_path(dir: impl AsRef<Path>, client_tag: &str) -> PathBuf {
    dir.as_ref().join(client_tag)
}

/// Accumulated sudoers entries, in user creation order
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Sudoers {
    lines: Vec<String>,
}

impl Sudoers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: String) {
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Fragment content: entries joined by CRLF
    pub fn render(&self) -> String {
        self.lines.join(LINE_SEPARATOR)
    }

    /// Create the fragment at `path` with mode 0440 and write all entries
    ///
    /// Returns the number of entries written. Nothing is created when there
    /// are no entries; an existing file is an error.
    pub async fn write(&self, path: &Path) -> Result<usize, CloudInitError> {
        if self.is_empty() {
            return Ok(0);
        }

        let sudoers_error = |source: std::io::Error| CloudInitError::Sudoers {
            path: path.to_path_buf(),
            source,
        };

        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        options.mode(0o440);

        let mut file = options.open(path).await.map_err(sudoers_error)?;
        file.write_all(self.render().as_bytes())
            .await
            .map_err(sudoers_error)?;
        file.flush().await.map_err(sudoers_error)?;

        // Creation mode is subject to the umask; sudo wants exactly 0440.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o440))
                .await
                .map_err(sudoers_error)?;
        }

        info!("Wrote {} entries to sudoers file", self.lines.len());
        Ok(self.lines.len())
    }
}
