//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools are available before starting operations
//! that would otherwise fail midway.

use crate::error::{DubbaError, Result};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Extraction decodes and writes WAV in-process.
    Extract,
    /// Assembly exports the final MP3 through ffmpeg.
    Assemble,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation) -> Result<()> {
    match operation {
        Operation::Extract => {
            // No external requirements for extraction
        }
        Operation::Assemble => {
            check_tool("ffmpeg")?;
        }
    }
    Ok(())
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    // ffmpeg/ffprobe use -version (single dash), others use --version
    let version_arg = match name {
        "ffmpeg" | "ffprobe" => "-version",
        _ => "--version",
    };
    match Command::new(name).arg(version_arg).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(DubbaError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(DubbaError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(DubbaError::ToolNotFound(format!("{}: {}", name, e))),
    }
}
