use crate::aggregate::Aggregator;
use crate::error::Error;
use crate::extractor::{Extractor, MetadataTool};
use crate::model::{CandidateFile, ExtractionResult};
use crate::progress::ProgressReporter;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    pub submitted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub duration: Duration,
}

/// Runs extractions on a fixed-size worker pool and funnels every result through a
/// channel into a single consumer loop.
pub struct Dispatcher {
    pool: ThreadPool,
    workers: usize,
}

impl Dispatcher {
    pub fn new(workers: usize) -> Result<Self, Error> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("extract-{}", i))
            .build()?;
        Ok(Self { pool, workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Extract every candidate exactly once and merge each result into `aggregator`
    /// in completion order. Returns once the last result has been merged.
    pub fn run<T: MetadataTool>(
        &self,
        candidates: Vec<CandidateFile>,
        extractor: &Extractor<T>,
        aggregator: &Aggregator,
        reporter: &dyn ProgressReporter,
    ) -> DispatchSummary {
        let start = Instant::now();
        let submitted = candidates.len();
        let mut succeeded = 0usize;
        let mut failed = 0usize;

        debug!(
            "Dispatching {} files to {} workers",
            submitted, self.workers
        );

        let (tx, rx) = mpsc::channel::<ExtractionResult>();

        thread::scope(|scope| {
            scope.spawn(move || {
                self.pool.install(|| {
                    candidates
                        .par_iter()
                        .with_max_len(1)
                        .for_each_with(tx, |tx, candidate| {
                            let result = extractor.extract(candidate);
                            // The consumer outlives every sender.
                            let _ = tx.send(result);
                        });
                });
            });

            // Ends when the last sender clone is dropped.
            for result in rx {
                let path = result.path().to_string_lossy().into_owned();
                let is_success = result.is_success();
                if aggregator.merge(result) {
                    if is_success {
                        succeeded += 1;
                    } else {
                        failed += 1;
                    }
                }
                reporter.on_file_processed(&path, is_success);
            }
        });

        if succeeded + failed != submitted {
            error!(
                "Dispatched {} files but merged {} results",
                submitted,
                succeeded + failed
            );
        }

        DispatchSummary {
            submitted,
            succeeded,
            failed,
            duration: start.elapsed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Attribute;
    use crate::model::FailureReason;
    use crate::progress::SilentReporter;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Tracks how many invocations overlap.
    struct CountingTool {
        active: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    impl CountingTool {
        fn new() -> Self {
            Self {
                active: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl MetadataTool for CountingTool {
        fn invoke(&self, path: &Path) -> Result<Vec<u8>, FailureReason> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(2));
            self.active.fetch_sub(1, Ordering::SeqCst);

            if path.to_string_lossy().contains("bad") {
                return Err(FailureReason::ProcessError("crashed".to_string()));
            }
            Ok(br#"[{"Model":"GR III","FocalLengthIn35mmFormat":28}]"#.to_vec())
        }
    }

    fn candidates(count: usize) -> Vec<CandidateFile> {
        (0..count)
            .map(|i| CandidateFile {
                path: PathBuf::from(format!("/photos/{:04}.jpg", i)),
                extension: "jpg".to_string(),
            })
            .collect()
    }

    #[test]
    fn test_every_candidate_yields_one_result() {
        let dispatcher = Dispatcher::new(4).unwrap();
        assert_eq!(dispatcher.workers(), 4);
        let extractor = Extractor::new(CountingTool::new());
        let aggregator = Aggregator::new();

        let summary = dispatcher.run(candidates(50), &extractor, &aggregator, &SilentReporter);

        assert_eq!(summary.submitted, 50);
        assert_eq!(summary.succeeded, 50);
        assert_eq!(summary.failed, 0);
        assert_eq!(extractor.tool().calls.load(Ordering::SeqCst), 50);

        let (dist, failures) = aggregator.finish();
        assert!(failures.is_empty());
        assert_eq!(dist.get(Attribute::FocalLength).get("28"), 50);
    }

    #[test]
    fn test_pool_size_bounds_concurrency() {
        let dispatcher = Dispatcher::new(3).unwrap();
        let extractor = Extractor::new(CountingTool::new());
        let aggregator = Aggregator::new();

        dispatcher.run(candidates(40), &extractor, &aggregator, &SilentReporter);

        let peak = extractor.tool().peak.load(Ordering::SeqCst);
        assert!(peak >= 1 && peak <= 3, "peak concurrency was {}", peak);
    }

    #[test]
    fn test_failure_does_not_stop_batch() {
        let dispatcher = Dispatcher::new(2).unwrap();
        let extractor = Extractor::new(CountingTool::new());
        let aggregator = Aggregator::new();

        let mut files = candidates(10);
        files.push(CandidateFile {
            path: PathBuf::from("/photos/bad.jpg"),
            extension: "jpg".to_string(),
        });

        let summary = dispatcher.run(files, &extractor, &aggregator, &SilentReporter);
        assert_eq!(summary.succeeded, 10);
        assert_eq!(summary.failed, 1);

        let (dist, failures) = aggregator.finish();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].path, PathBuf::from("/photos/bad.jpg"));
        assert_eq!(dist.get(Attribute::CameraModel).total(), 10);
    }

    #[test]
    fn test_empty_candidate_list() {
        let dispatcher = Dispatcher::new(1).unwrap();
        let extractor = Extractor::new(CountingTool::new());
        let aggregator = Aggregator::new();

        let summary = dispatcher.run(Vec::new(), &extractor, &aggregator, &SilentReporter);
        assert_eq!(summary.submitted, 0);
        assert_eq!(summary.succeeded + summary.failed, 0);
    }
}
