//! Least-squares regression trees (the weak learner of [`crate::gbc`]).
//!
//! Splits maximise Friedman's improvement
//! `n_l n_r / (n_l + n_r) * (mean_l - mean_r)²`; thresholds sit halfway
//! between adjacent distinct feature values. Leaf values are supplied by the
//! caller so the boosting stage can install Newton steps.

use nalgebra::DMatrix;

/// Growth limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
    /// Maximum depth (root = depth 0).
    pub max_depth: usize,
    /// Minimum samples required to split a node.
    pub min_samples_split: usize,
    /// Minimum samples in each child.
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self { max_depth: 3, min_samples_split: 2, min_samples_leaf: 1 }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Split { feature: usize, threshold: f64, left: usize, right: usize },
    Leaf { value: f64 },
}

/// Fitted tree, nodes stored in an arena with the root at index 0.
#[derive(Debug, Clone)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

struct Builder<'a, F> {
    x: &'a DMatrix<f64>,
    target: &'a [f64],
    params: TreeParams,
    leaf_value: F,
    nodes: Vec<Node>,
}

impl RegressionTree {
    /// Grow a tree on `rows` of `x` against `target` (indexed by row).
    pub fn fit<F>(
        x: &DMatrix<f64>,
        target: &[f64],
        rows: &[usize],
        params: TreeParams,
        leaf_value: F,
    ) -> Self
    where
        F: FnMut(&[usize]) -> f64,
    {
        let mut b = Builder { x, target, params, leaf_value, nodes: Vec::new() };
        let mut rows = rows.to_vec();
        b.grow(&mut rows, 0);
        Self { nodes: b.nodes }
    }

    /// Prediction for row `r` of `x`.
    pub fn predict_row(&self, x: &DMatrix<f64>, r: usize) -> f64 {
        let mut at = 0;
        loop {
            match &self.nodes[at] {
                Node::Leaf { value } => return *value,
                Node::Split { feature, threshold, left, right } => {
                    at = if x[(r, *feature)] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Number of leaves.
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| matches!(n, Node::Leaf { .. })).count()
    }
}

impl<F: FnMut(&[usize]) -> f64> Builder<'_, F> {
    fn grow(&mut self, rows: &mut [usize], depth: usize) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { value: 0.0 });

        let split = if depth < self.params.max_depth && rows.len() >= self.params.min_samples_split {
            self.best_split(rows)
        } else {
            None
        };

        match split {
            Some((feature, threshold)) => {
                let mid = partition(rows, |r| self.x[(r, feature)] <= threshold);
                let (lo, hi) = rows.split_at_mut(mid);
                let left = self.grow(lo, depth + 1);
                let right = self.grow(hi, depth + 1);
                self.nodes[id] = Node::Split { feature, threshold, left, right };
            }
            None => {
                let value = (self.leaf_value)(rows);
                self.nodes[id] = Node::Leaf { value };
            }
        }
        id
    }

    fn best_split(&self, rows: &[usize]) -> Option<(usize, f64)> {
        let n = rows.len();
        let min_leaf = self.params.min_samples_leaf.max(1);
        let total: f64 = rows.iter().map(|&r| self.target[r]).sum();
        let mean = total / n as f64;
        let sse: f64 = rows.iter().map(|&r| (self.target[r] - mean).powi(2)).sum();
        if sse <= f64::EPSILON * n as f64 {
            return None;
        }

        let mut best: Option<(usize, f64, f64)> = None;
        let mut order = rows.to_vec();
        for f in 0..self.x.ncols() {
            order.sort_by(|&a, &b| self.x[(a, f)].total_cmp(&self.x[(b, f)]));
            let mut left_sum = 0.0;
            for pos in 0..n - 1 {
                left_sum += self.target[order[pos]];
                let n_l = pos + 1;
                let n_r = n - n_l;
                if n_l < min_leaf || n_r < min_leaf {
                    continue;
                }
                let (v, v_next) = (self.x[(order[pos], f)], self.x[(order[pos + 1], f)]);
                if v_next <= v {
                    continue;
                }
                let diff = left_sum / n_l as f64 - (total - left_sum) / n_r as f64;
                let gain = (n_l * n_r) as f64 / n as f64 * diff * diff;
                if best.is_none_or(|(_, _, g)| gain > g) {
                    let mut threshold = 0.5 * (v + v_next);
                    if threshold >= v_next {
                        threshold = v;
                    }
                    best = Some((f, threshold, gain));
                }
            }
        }
        // An impure node takes its best split even at zero gain; XOR-like
        // targets only separate one level down.
        best.map(|(f, t, _)| (f, t))
    }
}

/// Stable in-place partition; returns the count of rows satisfying `pred`.
fn partition(rows: &mut [usize], pred: impl Fn(usize) -> bool) -> usize {
    let (yes, no): (Vec<usize>, Vec<usize>) = rows.iter().partition(|&&r| pred(r));
    let mid = yes.len();
    for (slot, r) in rows.iter_mut().zip(yes.into_iter().chain(no)) {
        *slot = r;
    }
    mid
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mean_leaf(target: &[f64]) -> impl FnMut(&[usize]) -> f64 + '_ {
        move |rows| rows.iter().map(|&r| target[r]).sum::<f64>() / rows.len() as f64
    }

    #[test]
    fn fits_a_step() {
        let x = DMatrix::from_column_slice(6, 1, &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        let t = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let rows: Vec<usize> = (0..6).collect();
        let tree = RegressionTree::fit(&x, &t, &rows, TreeParams::default(), mean_leaf(&t));
        assert_eq!(tree.n_leaves(), 2);
        for r in 0..6 {
            assert_eq!(tree.predict_row(&x, r), t[r]);
        }
    }

    #[test]
    fn pure_node_is_a_leaf() {
        let x = DMatrix::from_column_slice(3, 1, &[0.0, 1.0, 2.0]);
        let t = [2.0, 2.0, 2.0];
        let tree = RegressionTree::fit(&x, &t, &[0, 1, 2], TreeParams::default(), mean_leaf(&t));
        assert_eq!(tree.n_leaves(), 1);
    }

    #[test]
    fn depth_limit_caps_leaves() {
        let x = DMatrix::from_column_slice(16, 1, &(0..16).map(|v| v as f64).collect::<Vec<_>>());
        let t: Vec<f64> = (0..16).map(|v| v as f64).collect();
        let rows: Vec<usize> = (0..16).collect();
        let params = TreeParams { max_depth: 2, ..TreeParams::default() };
        let tree = RegressionTree::fit(&x, &t, &rows, params, mean_leaf(&t));
        assert_eq!(tree.n_leaves(), 4);
    }

    #[test]
    fn zero_gain_root_still_splits_on_xor() {
        #[rustfmt::skip]
        let x = DMatrix::from_row_slice(4, 2, &[
            0.0, 0.0,
            1.0, 1.0,
            0.0, 1.0,
            1.0, 0.0,
        ]);
        let t = [-0.5, -0.5, 0.5, 0.5];
        let tree = RegressionTree::fit(&x, &t, &[0, 1, 2, 3], TreeParams::default(), mean_leaf(&t));
        assert_eq!(tree.n_leaves(), 4);
        for r in 0..4 {
            assert_eq!(tree.predict_row(&x, r), t[r]);
        }
    }

    #[test]
    fn constant_feature_never_splits() {
        let x = DMatrix::from_column_slice(4, 1, &[1.0; 4]);
        let t = [0.0, 1.0, 0.0, 1.0];
        let tree = RegressionTree::fit(&x, &t, &[0, 1, 2, 3], TreeParams::default(), mean_leaf(&t));
        assert_eq!(tree.n_leaves(), 1);
    }
}
