use std::fmt;
use std::path::PathBuf;

/// Placeholder recorded when a field is absent or unparseable.
pub const UNKNOWN: &str = "Unknown";

/// A discovered file queued for metadata extraction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CandidateFile {
    pub path: PathBuf,
    /// Lowercased extension without the leading dot.
    pub extension: String,
}

impl CandidateFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// 35mm-equivalent focal length in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FocalLength {
    Millimetres(i64),
    Unknown,
}

impl fmt::Display for FocalLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FocalLength::Millimetres(mm) => write!(f, "{}", mm),
            FocalLength::Unknown => f.write_str(UNKNOWN),
        }
    }
}

/// The five attributes resolved for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecord {
    pub equivalent_focal_length: FocalLength,
    pub camera_model: String,
    pub lens_model: String,
    pub aperture: String,
    pub iso: String,
}

impl MetadataRecord {
    pub fn unknown() -> Self {
        Self {
            equivalent_focal_length: FocalLength::Unknown,
            camera_model: UNKNOWN.to_string(),
            lens_model: UNKNOWN.to_string(),
            aperture: UNKNOWN.to_string(),
            iso: UNKNOWN.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Tool output was not a JSON array of objects.
    ParseError(String),
    /// Tool could not be started or terminated abnormally.
    ProcessError(String),
    /// Tool returned an empty list.
    NoMetadata,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::ParseError(detail) => write!(f, "parse_error: {}", detail),
            FailureReason::ProcessError(detail) => write!(f, "process_error: {}", detail),
            FailureReason::NoMetadata => f.write_str("no_metadata"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionFailure {
    pub path: PathBuf,
    pub reason: FailureReason,
}

impl fmt::Display for ExtractionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.path.display(), self.reason)
    }
}

/// Outcome of extracting one candidate; produced exactly once per file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionResult {
    Success {
        path: PathBuf,
        record: MetadataRecord,
    },
    Failure(ExtractionFailure),
}

impl ExtractionResult {
    pub fn path(&self) -> &PathBuf {
        match self {
            ExtractionResult::Success { path, .. } => path,
            ExtractionResult::Failure(failure) => &failure.path,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExtractionResult::Success { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_focal_length_display() {
        assert_eq!(FocalLength::Millimetres(35).to_string(), "35");
        assert_eq!(FocalLength::Unknown.to_string(), "Unknown");
    }

    #[test]
    fn test_failure_reason_display() {
        let failure = ExtractionFailure {
            path: PathBuf::from("/photos/a.jpg"),
            reason: FailureReason::ProcessError("exit status 1".to_string()),
        };
        assert_eq!(
            failure.to_string(),
            "/photos/a.jpg (process_error: exit status 1)"
        );
        assert_eq!(FailureReason::NoMetadata.to_string(), "no_metadata");
    }
}
