//! Pairwise distance computation for prototype-based classification
//!
//! Provides the squared-Euclidean distance matrix used to score query
//! embeddings against class prototypes, and the log-softmax conversion
//! from negated distances to log-probabilities.

use ndarray::{Array2, ArrayView2, Axis};

use crate::error::LossError;

/// Compute the pairwise squared Euclidean distance matrix between two
/// sets of vectors.
///
/// `x` has shape (n, d) and `y` has shape (m, d); the result has shape
/// (n, m) with entry (i, j) = sum((x[i] - y[j])^2).
///
/// Returns [`LossError::DimensionMismatch`] if the feature widths differ.
pub fn squared_euclidean(
    x: ArrayView2<'_, f64>,
    y: ArrayView2<'_, f64>,
) -> Result<Array2<f64>, LossError> {
    if x.ncols() != y.ncols() {
        return Err(LossError::DimensionMismatch {
            left: x.ncols(),
            right: y.ncols(),
        });
    }

    let mut distances = Array2::zeros((x.nrows(), y.nrows()));
    for (i, xi) in x.outer_iter().enumerate() {
        // Broadcast the query row against every reference row at once.
        let diff = &y - &xi;
        let row = diff.mapv_into(|v| v * v).sum_axis(Axis(1));
        distances.row_mut(i).assign(&row);
    }

    Ok(distances)
}

/// Apply a numerically stable log-softmax along each row, in place.
///
/// Each row is shifted by its log-sum-exp, so that exponentiating and
/// summing a row yields 1.
pub fn log_softmax_rows(scores: &mut Array2<f64>) {
    for mut row in scores.rows_mut() {
        let max = row.fold(f64::NEG_INFINITY, |a, &b| a.max(b));
        let lse = max + row.iter().map(|v| (v - max).exp()).sum::<f64>().ln();
        row.mapv_inplace(|v| v - lse);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_squared_euclidean() {
        let x = array![[1.0, 2.0, 3.0]];
        let y = array![[4.0, 5.0, 6.0]];

        let d = squared_euclidean(x.view(), y.view()).unwrap();
        assert_relative_eq!(d[[0, 0]], 27.0, epsilon = 1e-12);
    }

    #[test]
    fn test_matrix_shape_and_values() {
        let x = array![[0.0, 0.0], [1.0, 1.0]];
        let y = array![[0.0, 0.0], [2.0, 2.0], [0.0, 3.0]];

        let d = squared_euclidean(x.view(), y.view()).unwrap();
        assert_eq!(d.shape(), &[2, 3]);
        assert_relative_eq!(d[[0, 0]], 0.0);
        assert_relative_eq!(d[[0, 1]], 8.0);
        assert_relative_eq!(d[[0, 2]], 9.0);
        assert_relative_eq!(d[[1, 1]], 2.0);
        assert_relative_eq!(d[[1, 2]], 5.0);
    }

    #[test]
    fn test_zero_iff_identical() {
        let x = array![[1.5, -2.5], [1.5, -2.4999999]];
        let y = array![[1.5, -2.5]];

        let d = squared_euclidean(x.view(), y.view()).unwrap();
        assert_eq!(d[[0, 0]], 0.0);
        assert!(d[[1, 0]] > 0.0);
    }

    #[test]
    fn test_dimension_mismatch() {
        let x = array![[1.0, 2.0, 3.0]];
        let y = array![[1.0, 2.0]];

        let err = squared_euclidean(x.view(), y.view()).unwrap_err();
        assert_eq!(err, LossError::DimensionMismatch { left: 3, right: 2 });
    }

    #[test]
    fn test_log_softmax_rows_normalized() {
        let mut scores = array![[-1.0, -2.0, -3.0], [0.0, 0.0, 0.0]];
        log_softmax_rows(&mut scores);

        for row in scores.rows() {
            let total: f64 = row.iter().map(|v| v.exp()).sum();
            assert_relative_eq!(total, 1.0, epsilon = 1e-12);
        }

        // Uniform scores give -ln(3) everywhere.
        assert_relative_eq!(scores[[1, 0]], -(3.0f64.ln()), epsilon = 1e-12);
    }

    #[test]
    fn test_log_softmax_large_magnitudes() {
        let mut scores = array![[-1000.0, -1001.0]];
        log_softmax_rows(&mut scores);

        let total: f64 = scores.row(0).iter().map(|v| v.exp()).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-12);
        assert!(scores[[0, 0]] > scores[[0, 1]]);
    }
}
