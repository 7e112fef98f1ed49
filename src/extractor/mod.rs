//! Per-file metadata extraction.
//!
//! An [`Extractor`] asks a [`MetadataTool`] for the raw JSON array describing one file,
//! takes the first record and resolves the five tracked attributes from it. Every
//! problem along the way becomes an [`ExtractionFailure`] value; nothing here returns
//! `Err` to the caller, so one bad file cannot abort a batch.

mod exiftool;
pub mod fields;

pub use exiftool::ExifTool;
pub use fields::{resolve_record, Tags};

use crate::model::{CandidateFile, ExtractionFailure, ExtractionResult, FailureReason};
use std::path::Path;
use tracing::{info, warn};

/// Source of raw metadata output for a single file.
///
/// Implementations block until the output is available. The returned bytes are expected
/// to be a UTF-8 JSON array of tag objects, as produced by `exiftool -j`.
pub trait MetadataTool: Send + Sync {
    fn invoke(&self, path: &Path) -> Result<Vec<u8>, FailureReason>;
}

impl<T: MetadataTool + ?Sized> MetadataTool for &T {
    fn invoke(&self, path: &Path) -> Result<Vec<u8>, FailureReason> {
        (**self).invoke(path)
    }
}

pub struct Extractor<T> {
    tool: T,
}

impl<T: MetadataTool> Extractor<T> {
    pub fn new(tool: T) -> Self {
        Self { tool }
    }

    pub fn tool(&self) -> &T {
        &self.tool
    }

    pub fn extract(&self, candidate: &CandidateFile) -> ExtractionResult {
        let path = &candidate.path;
        let outcome = self
            .tool
            .invoke(path)
            .and_then(|stdout| parse_tool_output(&stdout));

        match outcome {
            Ok(tags) => {
                info!("Processed: {}", candidate.file_name());
                ExtractionResult::Success {
                    path: path.clone(),
                    record: resolve_record(&tags),
                }
            }
            Err(reason) => {
                warn!("Error processing file {}: {}", path.display(), reason);
                ExtractionResult::Failure(ExtractionFailure {
                    path: path.clone(),
                    reason,
                })
            }
        }
    }
}

/// Parse tool output into the first tag record.
///
/// An empty array, or a first record with no tags at all, is reported as
/// [`FailureReason::NoMetadata`].
pub fn parse_tool_output(stdout: &[u8]) -> Result<Tags, FailureReason> {
    let records: Vec<Tags> = serde_json::from_slice(stdout)
        .map_err(|e| FailureReason::ParseError(e.to_string()))?;

    match records.into_iter().next() {
        Some(tags) if !tags.is_empty() => Ok(tags),
        _ => Err(FailureReason::NoMetadata),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FocalLength, MetadataRecord};
    use std::path::PathBuf;

    struct CannedTool(Result<&'static str, FailureReason>);

    impl MetadataTool for CannedTool {
        fn invoke(&self, _path: &Path) -> Result<Vec<u8>, FailureReason> {
            self.0.clone().map(|s| s.as_bytes().to_vec())
        }
    }

    fn candidate(path: &str) -> CandidateFile {
        CandidateFile {
            path: PathBuf::from(path),
            extension: "jpg".to_string(),
        }
    }

    #[test]
    fn test_parse_tool_output_takes_first_record() {
        let tags = parse_tool_output(br#"[{"Model":"A"},{"Model":"B"}]"#).unwrap();
        assert_eq!(tags.get("Model").and_then(|v| v.as_str()), Some("A"));
    }

    #[test]
    fn test_parse_tool_output_empty_list() {
        assert_eq!(parse_tool_output(b"[]"), Err(FailureReason::NoMetadata));
        assert_eq!(parse_tool_output(b"[{}]"), Err(FailureReason::NoMetadata));
    }

    #[test]
    fn test_parse_tool_output_malformed() {
        let inputs: [&[u8]; 4] = [b"", b"not json", br#"{"Model":"A"}"#, b"[1, 2]"];
        for bad in inputs {
            assert!(matches!(
                parse_tool_output(bad),
                Err(FailureReason::ParseError(_))
            ));
        }
    }

    #[test]
    fn test_extract_success() {
        let extractor = Extractor::new(CannedTool(Ok(
            r#"[{"SourceFile":"a.jpg","FocalLengthIn35mmFormat":"50 mm","Model":"Z 6","ISO":100}]"#,
        )));
        let result = extractor.extract(&candidate("/photos/a.jpg"));
        let expected = MetadataRecord {
            equivalent_focal_length: FocalLength::Millimetres(50),
            camera_model: "Z 6".to_string(),
            iso: "100".to_string(),
            ..MetadataRecord::unknown()
        };
        assert_eq!(
            result,
            ExtractionResult::Success {
                path: PathBuf::from("/photos/a.jpg"),
                record: expected,
            }
        );
    }

    #[test]
    fn test_extract_is_repeatable() {
        let extractor = Extractor::new(CannedTool(Ok(r#"[{"Model":"X100V","FNumber":2}]"#)));
        let file = candidate("/photos/b.jpg");
        assert_eq!(extractor.extract(&file), extractor.extract(&file));
    }

    #[test]
    fn test_extract_process_error_is_failure() {
        let extractor = Extractor::new(CannedTool(Err(FailureReason::ProcessError(
            "boom".to_string(),
        ))));
        match extractor.extract(&candidate("/photos/c.jpg")) {
            ExtractionResult::Failure(failure) => {
                assert_eq!(failure.path, PathBuf::from("/photos/c.jpg"));
                assert_eq!(failure.reason, FailureReason::ProcessError("boom".to_string()));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_parse_error_is_failure() {
        let extractor = Extractor::new(CannedTool(Ok("Warning: garbage")));
        let result = extractor.extract(&candidate("/photos/d.jpg"));
        assert!(matches!(
            result,
            ExtractionResult::Failure(ExtractionFailure {
                reason: FailureReason::ParseError(_),
                ..
            })
        ));
    }
}
