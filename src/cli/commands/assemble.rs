//! Assemble command implementation.

use crate::cli::{preflight, Output};
use crate::config::Settings;
use crate::pipeline::Pipeline;
use anyhow::Result;

/// Run the assemble command.
pub fn run_assemble(settings: Settings) -> Result<()> {
    preflight::check(preflight::Operation::Assemble)?;

    let pipeline = Pipeline::new(settings)?;

    let spinner = Output::spinner("Composing vocals and mixing with the background...");
    let output = pipeline.assemble()?;
    spinner.finish_and_clear();

    Output::success(&format!("Dubbed audio written to {}", output.display()));
    Ok(())
}
