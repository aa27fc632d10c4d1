//! Error taxonomy for data access and transforms
//!
//! Lookups that cannot be satisfied fail fast with a "data not found"
//! message naming the dataset. Conditions that only make a derived value
//! meaningless (empty series, zero denominators) are not errors; see
//! [`crate::transform::Computed`].

use crate::dataset::Dataset;
use std::path::PathBuf;

/// Errors raised while loading datasets or shaping them for charts
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("data not found: dataset `{dataset}` has no column `{column}`")]
    MissingColumn {
        dataset: Dataset,
        column: &'static str,
    },

    #[error("data not found: dataset `{dataset}` has no row {row}")]
    MissingRow { dataset: Dataset, row: usize },

    #[error("data not found: dataset `{0}` was not loaded for this page")]
    NotLoaded(Dataset),

    #[error("unrecognized {scale} label `{label}`")]
    UnknownLabel { scale: String, label: String },

    #[error("category `{category}` is not on the {axis} axis")]
    UnknownCategory { axis: String, category: String },

    #[error("more than one value for cell ({row}, {column})")]
    DuplicateCell { row: String, column: String },

    #[error("duplicate key `{key}` in dataset `{dataset}`")]
    DuplicateKey { dataset: Dataset, key: String },

    #[error("failed to read dataset `{dataset}` from {}", path.display())]
    Io {
        dataset: Dataset,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed row in dataset `{dataset}`")]
    Csv {
        dataset: Dataset,
        #[source]
        source: csv::Error,
    },
}

impl DashboardError {
    /// True for the lookup failures that mean the requested data is absent
    pub fn is_data_not_found(&self) -> bool {
        matches!(
            self,
            DashboardError::MissingColumn { .. }
                | DashboardError::MissingRow { .. }
                | DashboardError::NotLoaded(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
