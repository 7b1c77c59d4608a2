//! Status command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::Pipeline;
use anyhow::Result;

/// Run the status command.
pub fn run_status(settings: Settings) -> Result<()> {
    let pipeline = Pipeline::new(settings)?;
    let (records, artifacts, _) = pipeline.store().load()?;
    let drifted = pipeline.drift_report()?;

    Output::header(&format!(
        "Ledger for '{}' ({} utterances)",
        pipeline.store().target_language(),
        records.len()
    ));
    println!();

    for record in &records {
        Output::utterance(
            record.id,
            record.start,
            record.end,
            record.speaker_id.as_deref().unwrap_or("?"),
            record
                .translated_text
                .as_deref()
                .or(record.text.as_deref())
                .unwrap_or(""),
        );
    }

    println!();
    Output::kv("Ledger file", &pipeline.store().ledger_path().display().to_string());
    Output::kv(
        "Background track",
        &artifacts
            .map(|a| a.audio_background_file.display().to_string())
            .unwrap_or_else(|| "not recorded".to_string()),
    );

    if drifted.is_empty() {
        Output::success("No drift since the last fingerprinting pass.");
    } else {
        println!();
        Output::warning(&format!("{} utterance(s) drifted:", drifted.len()));
        for (id, fields) in &drifted {
            let detail = if fields.is_empty() {
                "content changed".to_string()
            } else {
                fields.join(", ")
            };
            Output::kv(&format!("#{}", id), &detail);
        }
    }

    Ok(())
}
