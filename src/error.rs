//! Errors surfaced while scoring an episode

use thiserror::Error;

/// Errors that can occur when computing the prototypical loss
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LossError {
    /// The two vector sets passed to the distance primitive have
    /// different feature widths
    #[error("feature width mismatch: left operand has {left} columns, right operand has {right}")]
    DimensionMismatch { left: usize, right: usize },

    /// The label batch is not aligned with the embedding batch
    #[error("label count {labels} does not match embedding row count {rows}")]
    LabelCountMismatch { labels: usize, rows: usize },

    /// The batch contains no samples
    #[error("episode batch contains no samples")]
    EmptyBatch,

    /// The scorer was configured with a support count of zero
    #[error("n_support must be at least 1")]
    ZeroSupport,

    /// A class cannot contribute both a support set and at least one query
    #[error("class {class} has {count} samples, need at least n_support + 1 = {required}")]
    InsufficientSamples {
        class: i64,
        count: usize,
        required: usize,
    },

    /// Classes contribute different numbers of query samples
    #[error("class {class} has {count} query samples, expected {expected}")]
    UnevenQuerySplit {
        class: i64,
        count: usize,
        expected: usize,
    },
}
