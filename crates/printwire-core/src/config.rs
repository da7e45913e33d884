// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Dispatch configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PrintwireError, Result};

/// Longest `name` value IPP allows, in octets (RFC 8011 SS5.1.3).
pub const MAX_IPP_NAME_LEN: usize = 255;

/// What to do when a page range clamps to zero pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyRangePolicy {
    /// Fail the request with `InvalidRange` before contacting the printer.
    #[default]
    Reject,
    /// Submit the zero-page document anyway and let the printer decide.
    Submit,
}

/// Settings for the dispatch pipeline.
///
/// Every field has a default, so a partial JSON file is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// TCP port of the printer's IPP service (default 631).
    pub ipp_port: u16,
    /// Resource path of the print queue (default `/ipp/print`).
    pub resource_path: String,
    /// Constant `job-name` sent with every job.
    pub job_name: String,
    /// `requesting-user-name` operation attribute.
    pub requesting_user_name: String,
    /// Upper bound on the whole network exchange. `None` leaves it to the
    /// transport and the printer.
    pub request_timeout_secs: Option<u64>,
    /// Directory for extracted page ranges (`None` = OS temp dir).
    pub temp_dir: Option<PathBuf>,
    /// Keep extracted page-range files after the request finishes.
    pub keep_extracted_files: bool,
    pub empty_range_policy: EmptyRangePolicy,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            ipp_port: 631,
            resource_path: "/ipp/print".into(),
            job_name: "IPP_Print_PDF".into(),
            requesting_user_name: "printwire".into(),
            request_timeout_secs: None,
            temp_dir: None,
            keep_extracted_files: false,
            empty_range_policy: EmptyRangePolicy::Reject,
        }
    }
}

impl DispatchConfig {
    /// Read a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file, or use defaults when it does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.ipp_port == 0 {
            return Err(PrintwireError::Config("ipp_port must be non-zero".into()));
        }
        if !self.resource_path.starts_with('/') {
            return Err(PrintwireError::Config(format!(
                "resource_path must start with '/', got '{}'",
                self.resource_path
            )));
        }
        for (field, value) in [
            ("job_name", &self.job_name),
            ("requesting_user_name", &self.requesting_user_name),
        ] {
            if value.is_empty() || value.len() > MAX_IPP_NAME_LEN {
                return Err(PrintwireError::Config(format!(
                    "{field} must be 1 to {MAX_IPP_NAME_LEN} bytes, got {}",
                    value.len()
                )));
            }
        }
        Ok(())
    }
}
