pub mod aggregate;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod export;
pub mod extractor;
pub mod model;
pub mod progress;
pub mod render;
pub mod scanner;

pub use aggregate::{Aggregator, Attribute, Distributions, FrequencyTable};
pub use config::AppConfig;
pub use engine::{render_charts, RenderReport, RunResult, StatsEngine};
pub use error::Error;
pub use extractor::{ExifTool, Extractor, MetadataTool};
pub use model::{CandidateFile, ExtractionFailure, ExtractionResult, FailureReason, MetadataRecord};
pub use progress::{ProgressReporter, SilentReporter};
pub use render::{ChartSpec, DisplayMode, PngChartWriter, RenderOutcome, Renderer};
