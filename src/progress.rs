/// Trait for reporting run progress.
///
/// The CLI implements it with indicatif; tests and library callers use [`SilentReporter`].
/// All methods have default no-op implementations. Extraction callbacks arrive from
/// worker threads, so implementations must be `Send + Sync`.
pub trait ProgressReporter: Send + Sync {
    fn on_scan_start(&self) {}
    fn on_scan_complete(&self, _total_files: usize, _duration_secs: f64) {}
    fn on_extract_start(&self, _total_files: usize) {}
    fn on_file_processed(&self, _path: &str, _succeeded: bool) {}
    fn on_extract_complete(&self, _succeeded: usize, _failed: usize, _duration_secs: f64) {}
    fn on_render_start(&self, _charts: usize) {}
    fn on_render_complete(&self, _saved: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
