use super::MetadataTool;
use crate::model::FailureReason;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::trace;

/// Runs an external exiftool binary as `<tool_path> -j <file>`.
#[derive(Debug, Clone)]
pub struct ExifTool {
    tool_path: PathBuf,
}

impl ExifTool {
    pub fn new(tool_path: impl Into<PathBuf>) -> Self {
        Self {
            tool_path: tool_path.into(),
        }
    }

    pub fn tool_path(&self) -> &Path {
        &self.tool_path
    }

    /// Version string reported by `<tool_path> -ver`, if the tool runs at all.
    pub fn version(&self) -> Option<String> {
        Command::new(&self.tool_path)
            .arg("-ver")
            .stdin(Stdio::null())
            .output()
            .ok()
            .filter(|o| o.status.success())
            .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
    }
}

impl MetadataTool for ExifTool {
    fn invoke(&self, path: &Path) -> Result<Vec<u8>, FailureReason> {
        let output = Command::new(&self.tool_path)
            .arg("-j")
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                FailureReason::ProcessError(format!(
                    "failed to run {}: {}",
                    self.tool_path.display(),
                    e
                ))
            })?;

        trace!(
            "{} exited with {} for {}",
            self.tool_path.display(),
            output.status,
            path.display()
        );

        // Killed by a signal.
        if output.status.code().is_none() {
            return Err(FailureReason::ProcessError(format!(
                "terminated abnormally ({})",
                output.status
            )));
        }

        // exiftool exits non-zero for unreadable files but still prints a JSON record,
        // so only treat the failure as fatal when there is nothing to parse.
        if !output.status.success() && output.stdout.iter().all(u8::is_ascii_whitespace) {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let detail = if stderr.is_empty() {
                output.status.to_string()
            } else {
                format!("{}: {}", output.status, stderr)
            };
            return Err(FailureReason::ProcessError(detail));
        }

        Ok(output.stdout)
    }
}
