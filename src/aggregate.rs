use crate::model::{ExtractionFailure, ExtractionResult, MetadataRecord};
use ahash::RandomState;
use dashmap::{DashMap, DashSet};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::error;

/// The five tracked metadata dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attribute {
    FocalLength,
    CameraModel,
    LensModel,
    Aperture,
    Iso,
}

impl Attribute {
    pub const ALL: [Attribute; 5] = [
        Attribute::FocalLength,
        Attribute::CameraModel,
        Attribute::LensModel,
        Attribute::Aperture,
        Attribute::Iso,
    ];

    fn index(self) -> usize {
        match self {
            Attribute::FocalLength => 0,
            Attribute::CameraModel => 1,
            Attribute::LensModel => 2,
            Attribute::Aperture => 3,
            Attribute::Iso => 4,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Attribute::FocalLength => "focal_length_35mm",
            Attribute::CameraModel => "camera_model",
            Attribute::LensModel => "lens_model",
            Attribute::Aperture => "aperture",
            Attribute::Iso => "iso",
        }
    }

    /// Value of this attribute in `record`, as recorded in its table.
    pub fn value_of(self, record: &MetadataRecord) -> String {
        match self {
            Attribute::FocalLength => record.equivalent_focal_length.to_string(),
            Attribute::CameraModel => record.camera_model.clone(),
            Attribute::LensModel => record.lens_model.clone(),
            Attribute::Aperture => record.aperture.clone(),
            Attribute::Iso => record.iso.clone(),
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Finished value → count histogram for one attribute. Iterates in lexical key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: BTreeMap<String, usize>,
}

impl FrequencyTable {
    pub fn get(&self, value: &str) -> usize {
        self.counts.get(value).copied().unwrap_or(0)
    }

    /// Number of distinct values.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<S: Into<String>> FromIterator<(S, usize)> for FrequencyTable {
    fn from_iter<I: IntoIterator<Item = (S, usize)>>(iter: I) -> Self {
        let mut counts = BTreeMap::new();
        for (value, count) in iter {
            *counts.entry(value.into()).or_insert(0) += count;
        }
        Self { counts }
    }
}

/// The five frozen tables of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Distributions {
    tables: [FrequencyTable; 5],
}

impl Distributions {
    pub fn get(&self, attribute: Attribute) -> &FrequencyTable {
        &self.tables[attribute.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Attribute, &FrequencyTable)> {
        Attribute::ALL.into_iter().map(move |a| (a, self.get(a)))
    }
}

/// Concurrent accumulator for extraction results.
///
/// Each table is an independent sharded map, so merges from different threads only
/// contend when they touch the same shard of the same table.
pub struct Aggregator {
    tables: [DashMap<String, usize, RandomState>; 5],
    failures: Mutex<Vec<ExtractionFailure>>,
    seen: DashSet<PathBuf, RandomState>,
    successes: AtomicUsize,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregator {
    pub fn new() -> Self {
        Self {
            tables: std::array::from_fn(|_| DashMap::with_hasher(RandomState::new())),
            failures: Mutex::new(Vec::new()),
            seen: DashSet::with_hasher(RandomState::new()),
            successes: AtomicUsize::new(0),
        }
    }

    /// Merge one result. Returns `false` (and changes nothing) if a result for the
    /// same path was already merged.
    pub fn merge(&self, result: ExtractionResult) -> bool {
        if !self.seen.insert(result.path().clone()) {
            error!(
                "Duplicate result for {} ignored",
                result.path().display()
            );
            return false;
        }

        match result {
            ExtractionResult::Success { record, .. } => {
                self.record(&record);
                self.successes.fetch_add(1, Ordering::Relaxed);
            }
            ExtractionResult::Failure(failure) => {
                // A poisoned lock only means another merge panicked mid-push.
                let mut failures = self
                    .failures
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                failures.push(failure);
            }
        }
        true
    }

    fn record(&self, record: &MetadataRecord) {
        for attribute in Attribute::ALL {
            *self.tables[attribute.index()]
                .entry(attribute.value_of(record))
                .or_insert(0) += 1;
        }
    }

    pub fn success_count(&self) -> usize {
        self.successes.load(Ordering::Relaxed)
    }

    /// Freeze the tables. Failures are returned sorted by path.
    pub fn finish(self) -> (Distributions, Vec<ExtractionFailure>) {
        let [focal, camera, lens, aperture, iso] = self.tables;
        let distributions = Distributions {
            tables: [
                freeze(focal),
                freeze(camera),
                freeze(lens),
                freeze(aperture),
                freeze(iso),
            ],
        };

        let mut failures = self
            .failures
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        failures.sort_by(|a, b| a.path.cmp(&b.path));

        (distributions, failures)
    }
}

fn freeze(table: DashMap<String, usize, RandomState>) -> FrequencyTable {
    table.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FailureReason, FocalLength};
    use rayon::prelude::*;

    fn success(path: &str, focal: i64, model: &str) -> ExtractionResult {
        ExtractionResult::Success {
            path: PathBuf::from(path),
            record: MetadataRecord {
                equivalent_focal_length: FocalLength::Millimetres(focal),
                camera_model: model.to_string(),
                ..MetadataRecord::unknown()
            },
        }
    }

    #[test]
    fn test_merge_counts_each_attribute() {
        let aggregator = Aggregator::new();
        assert!(aggregator.merge(success("/a.jpg", 35, "X-T5")));
        assert!(aggregator.merge(success("/b.jpg", 35, "X100V")));
        assert!(aggregator.merge(success("/c.jpg", 50, "X-T5")));

        let (dist, failures) = aggregator.finish();
        assert!(failures.is_empty());

        let focal = dist.get(Attribute::FocalLength);
        assert_eq!(focal.get("35"), 2);
        assert_eq!(focal.get("50"), 1);
        assert_eq!(dist.get(Attribute::CameraModel).get("X-T5"), 2);
        assert_eq!(dist.get(Attribute::LensModel).get("Unknown"), 3);
        for (_, table) in dist.iter() {
            assert_eq!(table.total(), 3);
        }
    }

    #[test]
    fn test_failures_are_collected_not_counted() {
        let aggregator = Aggregator::new();
        aggregator.merge(success("/a.jpg", 24, "A7 IV"));
        aggregator.merge(ExtractionResult::Failure(ExtractionFailure {
            path: PathBuf::from("/broken.jpg"),
            reason: FailureReason::NoMetadata,
        }));

        assert_eq!(aggregator.success_count(), 1);
        let (dist, failures) = aggregator.finish();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].path, PathBuf::from("/broken.jpg"));
        assert_eq!(dist.get(Attribute::Iso).total(), 1);
    }

    #[test]
    fn test_duplicate_path_is_ignored() {
        let aggregator = Aggregator::new();
        assert!(aggregator.merge(success("/a.jpg", 24, "A7 IV")));
        assert!(!aggregator.merge(success("/a.jpg", 24, "A7 IV")));
        let (dist, _) = aggregator.finish();
        assert_eq!(dist.get(Attribute::FocalLength).total(), 1);
    }

    #[test]
    fn test_concurrent_merge_loses_nothing() {
        let aggregator = Aggregator::new();
        (0..2_000i64).into_par_iter().for_each(|i| {
            aggregator.merge(success(&format!("/photos/{}.jpg", i), (i % 7) * 10, "Z 8"));
        });

        assert_eq!(aggregator.success_count(), 2_000);
        let (dist, _) = aggregator.finish();
        for (_, table) in dist.iter() {
            assert_eq!(table.total(), 2_000);
        }
        assert_eq!(dist.get(Attribute::CameraModel).get("Z 8"), 2_000);
        assert_eq!(dist.get(Attribute::FocalLength).len(), 7);
    }

    #[test]
    fn test_frequency_table_from_iter_sums_duplicates() {
        let table: FrequencyTable = vec![("5", 1), ("12", 2), ("5", 3)].into_iter().collect();
        assert_eq!(table.get("5"), 4);
        assert_eq!(table.total(), 6);
        assert_eq!(table.len(), 2);
    }
}
