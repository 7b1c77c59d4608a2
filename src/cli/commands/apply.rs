//! Apply command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::ledger::EditOperation;
use crate::pipeline::Pipeline;
use anyhow::Result;
use std::path::Path;

/// Run the apply command.
pub fn run_apply(operations_file: &Path, settings: Settings) -> Result<()> {
    let content = std::fs::read_to_string(operations_file)?;
    let operations: Vec<EditOperation> = serde_json::from_str(&content)?;

    if operations.is_empty() {
        Output::info("No operations in the batch, nothing to do.");
        return Ok(());
    }

    let pipeline = Pipeline::new(settings)?;
    let report = pipeline.apply_review(&operations)?;

    Output::success(&format!(
        "Applied {} operation(s): {} created, {} updated, {} deleted",
        operations.len(),
        report.created,
        report.updated,
        report.deleted
    ));
    if report.skipped > 0 {
        Output::warning(&format!(
            "{} operation(s) were skipped (malformed or unknown id); see the log.",
            report.skipped
        ));
    }

    Ok(())
}
