use bitvec::slice::BitSlice;

use crate::dataset::AnswerMatrix;

/// Ranks cuts. Cheap cuts are added to the tangle search tree first.
pub trait CostFunction {
    fn cost(&self, cut: &BitSlice) -> f64;
}

impl<F> CostFunction for F
where
    F: Fn(&BitSlice) -> f64,
{
    fn cost(&self, cut: &BitSlice) -> f64 {
        self(cut)
    }
}

/// Mean similarity between the two sides of a bipartition.
///
/// Two points are as similar as the number of features they agree on,
/// i.e. the number of features minus their manhattan distance. The cost of a
/// cut `A` over `n` points is
///
/// ```text
/// 1 / (|A| * (n - |A|)) * sum_{i in A, j not in A} similarity(i, j)
/// ```
///
/// so a cut separating dissimilar points is cheap.
#[derive(Debug, Clone, PartialEq)]
pub struct BipartitionSimilarity {
    /// Row major `num_points x num_points` matrix.
    similarities: Vec<f64>,
    num_points: usize,
}

impl BipartitionSimilarity {
    pub fn new(points: &AnswerMatrix) -> BipartitionSimilarity {
        let rows = points.rows();
        let num_points = rows.len();
        let num_features = points.num_questions();

        let mut similarities = vec![num_features as f64; num_points * num_points];
        for (i, a) in rows.iter().enumerate() {
            for (j, b) in rows.iter().enumerate().skip(i + 1) {
                let mut differing = a.to_bitvec();
                differing ^= b.as_bitslice();
                let similarity = (num_features - differing.count_ones()) as f64;
                similarities[i * num_points + j] = similarity;
                similarities[j * num_points + i] = similarity;
            }
        }
        BipartitionSimilarity {
            similarities,
            num_points,
        }
    }

    /// Number of features points `i` and `j` agree on.
    pub fn similarity(&self, i: usize, j: usize) -> f64 {
        self.similarities[i * self.num_points + j]
    }

    pub fn num_points(&self) -> usize {
        self.num_points
    }

    pub fn mean_manhattan_similarity(&self, cut: &BitSlice) -> f64 {
        let n = cut.len();
        let size = cut.count_ones();
        if size == 0 || size == n {
            return 0.0;
        }

        let mut total = 0.0;
        for i in cut.iter_ones() {
            let row = &self.similarities[i * self.num_points..(i + 1) * self.num_points];
            for j in cut.iter_zeros() {
                total += row[j];
            }
        }
        total / (size * (n - size)) as f64
    }
}

impl CostFunction for BipartitionSimilarity {
    fn cost(&self, cut: &BitSlice) -> f64 {
        self.mean_manhattan_similarity(cut)
    }
}

/// Scales the values linearly onto `[0, 1]`. A constant input maps to zeros.
pub fn normalize(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if !range.is_finite() || range == 0.0 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| (v - min) / range).collect()
}

/// Weight of each cut in the soft predictions: `exp(-normalize(cost))`.
pub fn cut_weights(costs: &[f64]) -> Vec<f64> {
    normalize(costs).into_iter().map(|c| (-c).exp()).collect()
}

#[cfg(test)]
mod tests {
    use bitvec::bits;
    use bitvec::prelude::Lsb0;

    use super::*;

    fn sample_points() -> AnswerMatrix {
        AnswerMatrix::from_rows(vec![
            vec![false, true, false, false],
            vec![true, true, true, false],
            vec![true, true, false, false],
        ])
        .unwrap()
    }

    #[test]
    fn test_mean_manhattan_similarities() {
        let bp = BipartitionSimilarity::new(&sample_points());
        let expected = [[4.0, 2.0, 3.0], [2.0, 4.0, 3.0], [3.0, 3.0, 4.0]];
        assert_eq!(bp.num_points(), 3);
        for (i, row) in expected.iter().enumerate() {
            for (j, similarity) in row.iter().enumerate() {
                assert_eq!(bp.similarity(i, j), *similarity, "similarity({}, {})", i, j);
            }
        }
    }

    #[test]
    fn test_mean_manhattan_cost() {
        let bp = BipartitionSimilarity::new(&sample_points());
        assert_eq!(bp.cost(bits![0, 1, 0]), 1.0 / (1.0 * (3.0 - 1.0)) * (2.0 + 3.0));
        assert_eq!(bp.cost(bits![1, 1, 0]), 1.0 / (2.0 * (3.0 - 2.0)) * (3.0 + 3.0));
    }

    #[test]
    fn test_degenerate_cut_costs_nothing() {
        let bp = BipartitionSimilarity::new(&sample_points());
        assert_eq!(bp.cost(bits![1, 1, 1]), 0.0);
        assert_eq!(bp.cost(bits![0, 0, 0]), 0.0);
    }

    #[test]
    fn test_closure_cost_function() {
        let size = |cut: &BitSlice| cut.count_ones() as f64;
        assert_eq!(size.cost(bits![1, 0, 1]), 2.0);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(&[1.0, 3.0, 2.0]), vec![0.0, 1.0, 0.5]);
        assert_eq!(normalize(&[2.0, 2.0]), vec![0.0, 0.0]);
        assert!(normalize(&[]).is_empty());
    }

    #[test]
    fn test_cut_weights() {
        let weights = cut_weights(&[0.0, 10.0]);
        assert_eq!(weights[0], 1.0);
        assert!((weights[1] - (-1.0f64).exp()).abs() < 1e-12);
    }
}
