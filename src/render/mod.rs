//! Turning finished frequency tables into chart files.
//!
//! [`arrange`] applies the display policy (lexical order, numeric order or fixed-width
//! bins) and a [`ChartWriter`] draws the resulting bars. [`Renderer`] ties the two
//! together and owns the output directory.

mod chart;

pub use chart::PngChartWriter;

use crate::aggregate::{Attribute, FrequencyTable};
use crate::error::Error;
use crate::model::UNKNOWN;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Values treated as "no number" when sorting numerically.
const NON_NUMERIC_SENTINELS: [&str; 2] = [UNKNOWN, "undef"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    #[default]
    Lexical,
    /// Order by value parsed as a float; sentinels and unparseable values go last.
    NumericSort,
    /// Group integer values into `[k*size, (k+1)*size)` buckets.
    Bin(u64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSpec {
    pub title: String,
    pub x_label: String,
    pub mode: DisplayMode,
}

impl ChartSpec {
    pub fn new(title: &str, x_label: &str, mode: DisplayMode) -> Self {
        Self {
            title: title.to_string(),
            x_label: x_label.to_string(),
            mode,
        }
    }

    /// Chart title, axis label and display mode used for each attribute.
    pub fn for_attribute(attribute: Attribute) -> Self {
        match attribute {
            Attribute::FocalLength => ChartSpec::new(
                "Full-frame Equivalent Focal Length Distribution",
                "Focal Length (35mm equivalent)",
                DisplayMode::Bin(10),
            ),
            Attribute::CameraModel => ChartSpec::new(
                "Camera Model Distribution",
                "Camera Model",
                DisplayMode::Lexical,
            ),
            Attribute::LensModel => ChartSpec::new(
                "Lens Model Distribution",
                "Lens Model",
                DisplayMode::Lexical,
            ),
            Attribute::Aperture => ChartSpec::new(
                "Aperture Distribution",
                "Aperture (F-number)",
                DisplayMode::NumericSort,
            ),
            Attribute::Iso => ChartSpec::new(
                "ISO Distribution",
                "ISO Value",
                DisplayMode::NumericSort,
            ),
        }
    }

    /// File name of the chart, `<title>.<extension>`, with path separators replaced.
    pub fn file_name(&self, extension: &str) -> String {
        let stem: String = self
            .title
            .chars()
            .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
            .collect();
        format!("{}.{}", stem, extension)
    }
}

/// Ordered `(label, count)` bars for `table` under `mode`.
pub fn arrange(table: &FrequencyTable, mode: DisplayMode) -> Vec<(String, usize)> {
    match mode {
        DisplayMode::Lexical => table.iter().map(|(k, v)| (k.to_string(), v)).collect(),
        DisplayMode::NumericSort => numeric_sorted(table),
        DisplayMode::Bin(0) => {
            warn!("Bin size 0 is not usable, falling back to lexical order");
            arrange(table, DisplayMode::Lexical)
        }
        DisplayMode::Bin(size) => binned(table, size),
    }
}

fn numeric_key(value: &str) -> f64 {
    let trimmed = value.trim();
    if NON_NUMERIC_SENTINELS.contains(&trimmed) {
        return f64::INFINITY;
    }
    match trimmed.parse::<f64>() {
        Ok(n) if !n.is_nan() => n,
        _ => f64::INFINITY,
    }
}

fn numeric_sorted(table: &FrequencyTable) -> Vec<(String, usize)> {
    let mut items: Vec<(f64, &str, usize)> = table
        .iter()
        .map(|(k, v)| (numeric_key(k), k, v))
        .collect();
    items.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(b.1)));
    items
        .into_iter()
        .map(|(_, k, v)| (k.to_string(), v))
        .collect()
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum BinKey {
    Range(u64),
    Other(String),
}

fn binned(table: &FrequencyTable, size: u64) -> Vec<(String, usize)> {
    let mut bins: BTreeMap<BinKey, usize> = BTreeMap::new();

    for (value, count) in table.iter() {
        let key = if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
            match value.parse::<u64>() {
                Ok(n) => BinKey::Range((n / size) * size),
                Err(_) => BinKey::Other(value.to_string()),
            }
        } else {
            BinKey::Other(value.to_string())
        };
        *bins.entry(key).or_insert(0) += count;
    }

    bins.into_iter()
        .map(|(key, count)| match key {
            BinKey::Range(lo) => (format!("[{}~{})", lo, lo.saturating_add(size)), count),
            BinKey::Other(label) => (label, count),
        })
        .collect()
}

/// Draws one bar chart to a file.
pub trait ChartWriter: Send + Sync {
    fn extension(&self) -> &'static str {
        "png"
    }

    fn write_chart(&self, spec: &ChartSpec, bars: &[(String, usize)], path: &Path)
        -> Result<(), Error>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Saved(PathBuf),
    /// The table was empty; nothing was written.
    Skipped,
}

pub struct Renderer<W> {
    output_dir: PathBuf,
    writer: W,
}

impl<W: ChartWriter> Renderer<W> {
    pub fn new(output_dir: impl Into<PathBuf>, writer: W) -> Self {
        Self {
            output_dir: output_dir.into(),
            writer,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn render(&self, table: &FrequencyTable, spec: &ChartSpec) -> Result<RenderOutcome, Error> {
        if table.is_empty() {
            info!("No data available for {}. Unable to generate plot.", spec.title);
            return Ok(RenderOutcome::Skipped);
        }

        fs::create_dir_all(&self.output_dir)?;

        let bars = arrange(table, spec.mode);
        let path = self
            .output_dir
            .join(spec.file_name(self.writer.extension()));
        self.writer.write_chart(spec, &bars, &path)?;

        info!("Saved plot to {}", path.display());
        Ok(RenderOutcome::Saved(path))
    }
}
