//! The dataset pipeline aggregate.
//!
//! A [`Dataset`] owns the working feature table, the optional label column and
//! the optional train/test partitions, and exposes the fluent pipeline
//! operations: generate → label → damage → split → repair → persist. Every
//! operation consumes and returns the aggregate so stages chain with `?`.

use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};
use uuid::Uuid;

use crate::damage::Damage;
use crate::fix::Fix;
use crate::io::snapshot::{self, DeserializeError, SerializeError, Snapshot, TableData};
use crate::target::TargetFn;

use super::Matrix;

/// File extension for persisted snapshots.
pub const SNAPSHOT_EXTENSION: &str = "dlab";

/// Pipeline validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DataError {
    /// A two-dimensional table was expected but the input had no rows or no
    /// columns.
    #[error("expected a non-empty two-dimensional table")]
    EmptyTable,

    /// The input rows do not all have the same length.
    #[error("ragged input: row {row} has {got} values, expected {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        got: usize,
    },

    /// A cell could not be converted to a number.
    #[error("value {value:?} at row {row}, column {col} is not numeric")]
    ParseValue {
        row: usize,
        col: usize,
        value: String,
    },

    /// A target generator was applied to an empty feature row.
    #[error("feature row is empty")]
    EmptyFeatureRow,

    /// An operation ran before the feature table was set.
    #[error("{operation} requires features; set them with set_features() or random()")]
    MissingFeatures { operation: &'static str },

    /// An operation ran before labels were generated.
    #[error("{operation} requires labels; generate them with make_target()")]
    MissingLabels { operation: &'static str },

    /// A damage proportion outside `[0, 1)` would select more cells than
    /// exist.
    #[error("damage proportion {0} is outside [0, 1)")]
    DamageProportionOutOfRange(f64),

    /// The split fraction must lie strictly between 0 and 1.
    #[error("test fraction {0} is outside (0, 1)")]
    TestFractionOutOfRange(f64),

    /// Splitting needs at least one row on each side.
    #[error("need at least 2 rows to split, got {rows}")]
    TooFewRows { rows: usize },
}

/// The dataset aggregate.
///
/// All optional fields start absent; pipeline operations fill them in.
/// Randomness for `random`, `damage` and `split` comes from a privately owned
/// generator, entropy-seeded by default and fixable via [`Dataset::with_seed`]
/// for reproducible runs. The generator itself is not part of the persisted
/// state.
#[derive(Debug, Clone)]
pub struct Dataset {
    features: Option<Matrix>,
    labels: Option<Vec<f64>>,
    train_features: Option<Matrix>,
    train_labels: Option<Vec<f64>>,
    test_features: Option<Matrix>,
    test_labels: Option<Vec<f64>>,
    rng: StdRng,
}

impl Default for Dataset {
    fn default() -> Self {
        Self::new()
    }
}

impl Dataset {
    /// Create an empty dataset with an entropy-seeded generator.
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Create an empty dataset with a fixed seed for reproducible pipelines.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            features: None,
            labels: None,
            train_features: None,
            train_labels: None,
            test_features: None,
            test_labels: None,
            rng,
        }
    }

    /// Fill the feature table with uniform `[0, 1)` values.
    ///
    /// Clears labels and partitions derived from any previous table.
    pub fn random(mut self, observations: usize, features: usize) -> Self {
        let data: Vec<f64> = (0..observations * features)
            .map(|_| self.rng.gen::<f64>())
            .collect();
        self.features = Some(Matrix::from_vec(data, observations, features));
        self.labels = None;
        self.clear_partitions();
        info!(observations, features, "generated random feature table");
        self
    }

    /// Set the feature table from rows, validating rectangular 2D shape.
    ///
    /// Existing partitions are cleared; labels are kept and must be
    /// regenerated if the row count changed.
    pub fn set_features(mut self, rows: &[Vec<f64>]) -> Result<Self, DataError> {
        let matrix = Matrix::from_rows(rows)?;
        info!(
            rows = matrix.num_rows(),
            cols = matrix.num_cols(),
            "features set"
        );
        self.features = Some(matrix);
        self.clear_partitions();
        Ok(self)
    }

    /// Set the feature table from plain text (one row per line).
    pub fn set_features_text(mut self, text: &str) -> Result<Self, DataError> {
        let matrix = Matrix::from_text(text)?;
        info!(
            rows = matrix.num_rows(),
            cols = matrix.num_cols(),
            "features parsed from text"
        );
        self.features = Some(matrix);
        self.clear_partitions();
        Ok(self)
    }

    /// Generate one label per feature row with the given target generator.
    pub fn make_target(mut self, generator: TargetFn) -> Result<Self, DataError> {
        let features = self.features.as_ref().ok_or(DataError::MissingFeatures {
            operation: "make_target",
        })?;
        let mut labels = Vec::with_capacity(features.num_rows());
        for row in features.rows() {
            labels.push(generator.label(row)?);
        }
        let positives = labels.iter().filter(|&&l| l == 1.0).count();
        info!(
            rows = labels.len(),
            positives,
            generator = generator.name(),
            "targets generated"
        );
        self.labels = Some(labels);
        Ok(self)
    }

    /// Corrupt the feature table with the given damage variant.
    ///
    /// Repeated damage compounds; it is not idempotent.
    pub fn damage(mut self, damage: Damage) -> Result<Self, DataError> {
        let features = self.features.take().ok_or(DataError::MissingFeatures {
            operation: "damage",
        })?;
        let damaged = damage.apply(features, &mut self.rng)?;
        info!(
            damage = damage.name(),
            rows = damaged.num_rows(),
            cols = damaged.num_cols(),
            missing = damaged.num_missing(),
            "features damaged"
        );
        self.features = Some(damaged);
        Ok(self)
    }

    /// Repair missing cells in the feature table with the given fix variant.
    ///
    /// Idempotent once no missing cells remain.
    pub fn fix(mut self, fix: Fix) -> Result<Self, DataError> {
        let features = self
            .features
            .take()
            .ok_or(DataError::MissingFeatures { operation: "fix" })?;
        let fixed = fix.apply(features);
        info!(fix = fix.name(), "features repaired");
        self.features = Some(fixed);
        Ok(self)
    }

    /// Randomly partition rows into train and test subsets.
    ///
    /// `test_fraction` must lie in `(0, 1)`; the test partition gets
    /// `round(rows * test_fraction)` rows (at least one row on each side) and
    /// the index sets are disjoint and exhaustive.
    pub fn split(mut self, test_fraction: f64) -> Result<Self, DataError> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(DataError::TestFractionOutOfRange(test_fraction));
        }
        let features = self
            .features
            .as_ref()
            .ok_or(DataError::MissingFeatures { operation: "split" })?;
        let labels = self
            .labels
            .as_ref()
            .ok_or(DataError::MissingLabels { operation: "split" })?;

        let rows = features.num_rows();
        if rows < 2 {
            return Err(DataError::TooFewRows { rows });
        }

        let mut indices: Vec<usize> = (0..rows).collect();
        indices.shuffle(&mut self.rng);

        let test_len = ((rows as f64) * test_fraction).round() as usize;
        let test_len = test_len.clamp(1, rows - 1);
        let (test_idx, train_idx) = indices.split_at(test_len);

        self.train_features = Some(features.take_rows(train_idx));
        self.train_labels = Some(train_idx.iter().map(|&i| labels[i]).collect());
        self.test_features = Some(features.take_rows(test_idx));
        self.test_labels = Some(test_idx.iter().map(|&i| labels[i]).collect());

        info!(
            train_rows = rows - test_len,
            test_rows = test_len,
            test_fraction,
            "dataset split"
        );
        Ok(self)
    }

    /// Serialize the present fields into a freshly named snapshot under `dir`.
    ///
    /// Returns the snapshot path. The payload is built entirely in memory
    /// before a single write, so failures never leave a partial file; a
    /// missing directory surfaces as the underlying I/O error.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<PathBuf, SerializeError> {
        let path = dir
            .as_ref()
            .join(format!("{}.{SNAPSHOT_EXTENSION}", Uuid::new_v4()));
        snapshot::write_file(&path, &self.to_snapshot())?;
        info!(path = %path.display(), "dataset saved");
        Ok(path)
    }

    /// Restore fields from a snapshot.
    ///
    /// Fields present in the snapshot overwrite the receiver; absent fields
    /// are skipped (and logged), leaving the receiver's value untouched.
    pub fn read(mut self, path: impl AsRef<Path>) -> Result<Self, DeserializeError> {
        let path = path.as_ref();
        let snap = snapshot::read_file(path)?;

        match snap.features {
            Some(table) => self.features = Some(table.into_matrix()?),
            None => debug!(path = %path.display(), "snapshot does not contain features"),
        }
        match snap.labels {
            Some(column) => self.labels = Some(column),
            None => debug!(path = %path.display(), "snapshot does not contain labels"),
        }
        match snap.train_features {
            Some(table) => self.train_features = Some(table.into_matrix()?),
            None => debug!(path = %path.display(), "snapshot does not contain train_features"),
        }
        match snap.train_labels {
            Some(column) => self.train_labels = Some(column),
            None => debug!(path = %path.display(), "snapshot does not contain train_labels"),
        }
        match snap.test_features {
            Some(table) => self.test_features = Some(table.into_matrix()?),
            None => debug!(path = %path.display(), "snapshot does not contain test_features"),
        }
        match snap.test_labels {
            Some(column) => self.test_labels = Some(column),
            None => debug!(path = %path.display(), "snapshot does not contain test_labels"),
        }

        info!(path = %path.display(), "dataset read");
        Ok(self)
    }

    /// Log the shape of every present field.
    pub fn info(&self) {
        fn table(name: &str, m: &Option<Matrix>) {
            match m {
                Some(m) => info!(
                    field = name,
                    rows = m.num_rows(),
                    cols = m.num_cols(),
                    missing = m.num_missing(),
                    "present"
                ),
                None => info!(field = name, "absent"),
            }
        }
        fn column(name: &str, c: &Option<Vec<f64>>) {
            match c {
                Some(c) => info!(field = name, rows = c.len(), "present"),
                None => info!(field = name, "absent"),
            }
        }
        table("features", &self.features);
        column("labels", &self.labels);
        table("train_features", &self.train_features);
        column("train_labels", &self.train_labels);
        table("test_features", &self.test_features);
        column("test_labels", &self.test_labels);
    }

    fn clear_partitions(&mut self) {
        self.train_features = None;
        self.train_labels = None;
        self.test_features = None;
        self.test_labels = None;
    }

    fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            features: self.features.as_ref().map(TableData::from),
            labels: self.labels.clone(),
            train_features: self.train_features.as_ref().map(TableData::from),
            train_labels: self.train_labels.clone(),
            test_features: self.test_features.as_ref().map(TableData::from),
            test_labels: self.test_labels.clone(),
        }
    }

    /// The working feature table, if set.
    pub fn features(&self) -> Option<&Matrix> {
        self.features.as_ref()
    }

    /// The label column, if generated.
    pub fn labels(&self) -> Option<&[f64]> {
        self.labels.as_deref()
    }

    /// The train-partition features, if split.
    pub fn train_features(&self) -> Option<&Matrix> {
        self.train_features.as_ref()
    }

    /// The train-partition labels, if split.
    pub fn train_labels(&self) -> Option<&[f64]> {
        self.train_labels.as_deref()
    }

    /// The test-partition features, if split.
    pub fn test_features(&self) -> Option<&Matrix> {
        self.test_features.as_ref()
    }

    /// The test-partition labels, if split.
    pub fn test_labels(&self) -> Option<&[f64]> {
        self.test_labels.as_deref()
    }
}
