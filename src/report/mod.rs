//! Reporting: terminal summary and JSON rendering of an export bundle.

pub mod format;

pub use format::*;

use crate::app::pipeline::ExportBundle;
use crate::error::AppError;

/// Pretty JSON of the full bundle (constants, tables, tally).
pub fn bundle_json(bundle: &ExportBundle) -> Result<String, AppError> {
    serde_json::to_string_pretty(bundle).map_err(|e| AppError::new(2, format!("Failed to render JSON: {e}")))
}
