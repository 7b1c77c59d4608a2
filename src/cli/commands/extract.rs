//! Extract command implementation.

use crate::cli::{preflight, Output};
use crate::config::Settings;
use crate::pipeline::Pipeline;
use anyhow::Result;
use std::path::Path;

/// Run the extract command.
pub fn run_extract(audio: &Path, settings: Settings) -> Result<()> {
    preflight::check(preflight::Operation::Extract)?;

    if !audio.exists() {
        anyhow::bail!("Source audio file not found: {}", audio.display());
    }

    let pipeline = Pipeline::new(settings)?;

    let spinner = Output::spinner(&format!("Cutting chunks from {}...", audio.display()));
    let count = pipeline.extract(audio)?;
    spinner.finish_and_clear();

    Output::success(&format!(
        "Extracted {} chunk(s) into {}",
        count,
        pipeline.settings().output_dir().display()
    ));
    Ok(())
}
