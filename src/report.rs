//! Run report
//!
//! Collects item-level failures so a run can finish and still say what went
//! wrong, and optionally persists them as a small JSON result document.

use crate::CloudInitError;
use serde::Serialize;
use std::path::Path;
use tokio::fs;
use tracing::{debug, error, warn};

/// Outcome of one provisioning pass
#[derive(Debug, Default)]
pub struct ProvisionReport {
    /// Source the configuration came from
    pub datasource: Option<&'static str>,
    /// Instance id from meta-data, if any
    pub instance_id: Option<String>,
    /// Groups created successfully
    pub groups_created: Vec<String>,
    /// Users created successfully, in creation order
    pub users_created: Vec<String>,
    /// Entries written to the sudoers fragment
    pub sudoers_entries: usize,
    /// Item-level failures, in the order they happened
    pub errors: Vec<CloudInitError>,
}

#[derive(Serialize)]
struct ResultDocument<'a> {
    v1: ResultBody<'a>,
}

#[derive(Serialize)]
struct ResultBody<'a> {
    datasource: Option<&'a str>,
    instance_id: Option<&'a str>,
    errors: Vec<String>,
}

impl ProvisionReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log a failed item and keep it for the result
    pub fn record(&mut self, err: CloudInitError) {
        error!("{}", err);
        self.errors.push(err);
    }

    /// Whether every item went through
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Render the result document, including a fatal error if the run aborted
    pub fn to_json(&self, fatal: Option<&CloudInitError>) -> Result<String, serde_json::Error> {
        let errors = self
            .errors
            .iter()
            .chain(fatal)
            .map(ToString::to_string)
            .collect();

        let document = ResultDocument {
            v1: ResultBody {
                datasource: self.datasource,
                instance_id: self.instance_id.as_deref(),
                errors,
            },
        };
        serde_json::to_string_pretty(&document)
    }

    /// Write the result document; failures are logged only
    pub async fn write_result(&self, path: &Path, fatal: Option<&CloudInitError>) {
        let json = match self.to_json(fatal) {
            Ok(json) => json,
            Err(e) => {
                warn!("Could not render result document: {}", e);
                return;
            }
        };

        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent).await {
                warn!("Could not create {}: {}", parent.display(), e);
                return;
            }
        }

        match fs::write(path, json).await {
            Ok(()) => debug!("Wrote result to {}", path.display()),
            Err(e) => warn!("Could not write result file {}: {}", path.display(), e),
        }
    }
}
