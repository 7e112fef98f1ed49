use crate::aggregate::{Aggregator, Attribute, Distributions};
use crate::config::{self, AppConfig};
use crate::dispatch::Dispatcher;
use crate::error::Error;
use crate::extractor::{ExifTool, Extractor, MetadataTool};
use crate::model::{CandidateFile, ExtractionFailure};
use crate::progress::ProgressReporter;
use crate::render::{ChartSpec, ChartWriter, RenderOutcome, Renderer};
use crate::scanner;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

pub struct StatsEngine<T> {
    config: AppConfig,
    extractor: Extractor<T>,
}

/// Everything a single run produced. Immutable once returned.
#[derive(Debug)]
pub struct RunResult {
    pub distributions: Distributions,
    pub failures: Vec<ExtractionFailure>,
    pub candidate_count: usize,
    pub success_count: usize,
    pub scan_duration: Duration,
    pub extract_duration: Duration,
}

#[derive(Debug, Default)]
pub struct RenderReport {
    pub saved: Vec<PathBuf>,
    pub skipped: Vec<Attribute>,
    pub failed: Vec<(Attribute, String)>,
    pub duration: Duration,
}

impl StatsEngine<ExifTool> {
    pub fn new(config: AppConfig) -> Self {
        let tool = ExifTool::new(&config.tool_path);
        Self::with_tool(config, tool)
    }
}

impl<T: MetadataTool> StatsEngine<T> {
    pub fn with_tool(config: AppConfig, tool: T) -> Self {
        Self {
            config,
            extractor: Extractor::new(tool),
        }
    }

    pub fn tool(&self) -> &T {
        self.extractor.tool()
    }

    /// Candidate files under every configured root, each listed once. Roots are
    /// canonicalised first, so one directory spelled several ways is walked once.
    pub fn discover(&self) -> Result<Vec<CandidateFile>, Error> {
        let roots = scanner::canonical_roots(&self.config.root_paths)?;
        let roots = config::non_overlapping_directories(roots);
        info!("Scanning directories: {:?}", roots);

        let root_slices: Vec<&str> = roots.iter().map(|s| s.as_str()).collect();
        let ignore_slices: Vec<&str> = self
            .config
            .ignore_patterns
            .iter()
            .map(|s| s.as_str())
            .collect();

        scanner::discover_candidates(&root_slices, &self.config.extensions, &ignore_slices)
    }

    /// Discover, extract and aggregate:
    /// 1. Walk the roots for candidate files
    /// 2. Extract metadata on the worker pool, merging results as they complete
    /// 3. Freeze the tables
    pub fn run(&self, reporter: &dyn ProgressReporter) -> Result<RunResult, Error> {
        self.config.validate()?;

        // Phase 1: Discovery
        reporter.on_scan_start();
        let scan_start = Instant::now();
        let candidates = self.discover()?;
        let scan_duration = scan_start.elapsed();
        let candidate_count = candidates.len();
        reporter.on_scan_complete(candidate_count, scan_duration.as_secs_f64());
        debug!(
            "Discovery completed in {:.2}s, {} candidate files",
            scan_duration.as_secs_f64(),
            candidate_count
        );

        // Phase 2: Extraction + aggregation
        let dispatcher = Dispatcher::new(self.config.workers)?;
        info!("Extracting metadata with {} workers...", dispatcher.workers());
        reporter.on_extract_start(candidate_count);
        let aggregator = Aggregator::new();
        let summary = dispatcher.run(candidates, &self.extractor, &aggregator, reporter);
        reporter.on_extract_complete(
            summary.succeeded,
            summary.failed,
            summary.duration.as_secs_f64(),
        );
        debug!(
            "Extraction completed in {:.2}s, {} succeeded, {} failed",
            summary.duration.as_secs_f64(),
            summary.succeeded,
            summary.failed
        );

        // Phase 3: Freeze
        let (distributions, failures) = aggregator.finish();

        Ok(RunResult {
            distributions,
            failures,
            candidate_count,
            success_count: summary.succeeded,
            scan_duration,
            extract_duration: summary.duration,
        })
    }
}

/// Render one chart per attribute. A chart that fails to render is logged and
/// reported; it does not stop the others.
pub fn render_charts<W: ChartWriter>(
    renderer: &Renderer<W>,
    distributions: &Distributions,
    reporter: &dyn ProgressReporter,
) -> RenderReport {
    let start = Instant::now();
    let mut report = RenderReport::default();
    reporter.on_render_start(Attribute::ALL.len());

    for (attribute, table) in distributions.iter() {
        let spec = ChartSpec::for_attribute(attribute);
        match renderer.render(table, &spec) {
            Ok(RenderOutcome::Saved(path)) => report.saved.push(path),
            Ok(RenderOutcome::Skipped) => report.skipped.push(attribute),
            Err(err) => {
                error!("Error rendering {}: {}", spec.title, err);
                report.failed.push((attribute, err.to_string()));
            }
        }
    }

    report.duration = start.elapsed();
    reporter.on_render_complete(report.saved.len(), report.duration.as_secs_f64());
    report
}
