//! Episodic prototypical loss and accuracy
//!
//! Implements the prototypical-network scoring rule: each class's first
//! `n_support` samples (in batch order) form a centroid, and the remaining
//! samples are scored by the log-softmax of their negated squared distances
//! to every centroid.

use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::distance::{log_softmax_rows, squared_euclidean};
use crate::error::LossError;

/// Episodic loss scorer holding the fixed `n_support` hyperparameter.
///
/// The scorer is a stateless configuration value; [`PrototypicalLoss::score`]
/// is a pure function of its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrototypicalLoss {
    n_support: usize,
}

impl PrototypicalLoss {
    /// Create a scorer that uses the first `n_support` samples of each
    /// class as its support set.
    pub fn new(n_support: usize) -> Self {
        Self { n_support }
    }

    /// Number of support samples per class.
    pub fn n_support(&self) -> usize {
        self.n_support
    }

    /// Score one episode. See [`prototypical_loss`].
    pub fn score(
        &self,
        embeddings: ArrayView2<'_, f64>,
        labels: &[i64],
    ) -> Result<EpisodeScore, LossError> {
        prototypical_loss(embeddings, labels, self.n_support)
    }
}

/// Result of scoring one episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeScore {
    /// Mean negative log-probability of the true class over all queries.
    pub loss: f64,
    /// Fraction of queries whose most probable class is their true class.
    pub accuracy: f64,
    /// Distinct label values in ascending order. Class index `i` in the
    /// episode corresponds to `classes[i]`.
    pub classes: Vec<i64>,
}

/// Compute prototypical loss and accuracy for one episode.
///
/// For each distinct label value (taken in ascending order), the first
/// `n_support` matching rows of `embeddings` are averaged into a class
/// prototype; every remaining matching row is a query. Each query is scored
/// by the log-softmax, over classes, of its negated squared Euclidean
/// distances to the prototypes. The loss is the mean negative true-class
/// log-probability; the accuracy is the fraction of queries whose nearest
/// prototype belongs to their own class.
///
/// Every class must have at least `n_support + 1` samples and all classes
/// must contribute the same number of queries; violations fail fast with a
/// descriptive [`LossError`] before any arithmetic is performed.
pub fn prototypical_loss(
    embeddings: ArrayView2<'_, f64>,
    labels: &[i64],
    n_support: usize,
) -> Result<EpisodeScore, LossError> {
    if n_support == 0 {
        return Err(LossError::ZeroSupport);
    }
    if labels.len() != embeddings.nrows() {
        return Err(LossError::LabelCountMismatch {
            labels: labels.len(),
            rows: embeddings.nrows(),
        });
    }
    if labels.is_empty() {
        return Err(LossError::EmptyBatch);
    }

    // Group row indices by label; BTreeMap iteration gives the ascending
    // class order that defines each class's index.
    let mut indices_by_class: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (row, &label) in labels.iter().enumerate() {
        indices_by_class.entry(label).or_default().push(row);
    }

    let n_classes = indices_by_class.len();
    let mut n_query = 0;
    for (i, (&class, rows)) in indices_by_class.iter().enumerate() {
        if rows.len() < n_support + 1 {
            return Err(LossError::InsufficientSamples {
                class,
                count: rows.len(),
                required: n_support + 1,
            });
        }
        if i == 0 {
            n_query = rows.len() - n_support;
        } else if rows.len() - n_support != n_query {
            return Err(LossError::UnevenQuerySplit {
                class,
                count: rows.len() - n_support,
                expected: n_query,
            });
        }
    }

    tracing::debug!(
        "scoring episode: {} classes, {} queries per class, n_support={}",
        n_classes,
        n_query,
        n_support
    );

    // Class prototypes: mean of each class's support rows, stacked C x D.
    let dim = embeddings.ncols();
    let mut prototypes = Array2::zeros((n_classes, dim));
    for (ci, rows) in indices_by_class.values().enumerate() {
        let mut proto = prototypes.row_mut(ci);
        for &row in &rows[..n_support] {
            proto += &embeddings.row(row);
        }
    }
    prototypes /= n_support as f64;

    // Queries, concatenated in class order: row ci * n_query + q belongs
    // to class index ci.
    let query_rows: Vec<usize> = indices_by_class
        .values()
        .flat_map(|rows| rows[n_support..].iter().copied())
        .collect();
    let queries = embeddings.select(Axis(0), &query_rows);

    let mut log_p = squared_euclidean(queries.view(), prototypes.view())?;
    log_p.mapv_inplace(|d| -d);
    log_softmax_rows(&mut log_p);

    let total = n_classes * n_query;
    let mut loss_sum = 0.0;
    let mut correct = 0;
    for ci in 0..n_classes {
        for q in 0..n_query {
            let row = log_p.row(ci * n_query + q);
            loss_sum -= row[ci];

            let predicted = row
                .iter()
                .enumerate()
                .fold((0, f64::NEG_INFINITY), |best, (j, &v)| {
                    if v > best.1 {
                        (j, v)
                    } else {
                        best
                    }
                })
                .0;
            if predicted == ci {
                correct += 1;
            }
        }
    }

    Ok(EpisodeScore {
        loss: loss_sum / total as f64,
        accuracy: correct as f64 / total as f64,
        classes: indices_by_class.into_keys().collect(),
    })
}
