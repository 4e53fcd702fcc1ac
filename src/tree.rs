use rand::seq::index::sample as sample_indices;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Node in an array-backed regression tree. `feature < 0` marks a leaf.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    pub feature: i32,
    pub threshold: f64,
    pub left: i32,
    pub right: i32,
    pub value: f64,
}

impl TreeNode {
    pub const fn is_leaf(&self) -> bool {
        self.feature < 0
    }
}

#[derive(Debug, Clone)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features considered per split; `None` scans all of them.
    pub max_features: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<TreeNode>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    sse: f64,
}

impl RegressionTree {
    /// Fit by recursive variance-reduction splitting over the given sample
    /// rows. Impurity decrease is accumulated into `importances` per feature.
    pub fn fit(
        xs: &[Vec<f64>],
        ys: &[f64],
        rows: &[usize],
        params: &TreeParams,
        rng: &mut ChaCha8Rng,
        importances: &mut [f64],
    ) -> Self {
        let mut nodes = Vec::new();
        grow(&mut nodes, xs, ys, rows, 0, params, rng, importances);
        Self { nodes }
    }

    /// Traverse root to leaf. Missing feature slots read as 0.
    pub fn predict(&self, features: &[f64]) -> f64 {
        let mut idx = 0usize;
        loop {
            let node = &self.nodes[idx];
            if node.is_leaf() {
                return node.value;
            }
            let feat_val = features.get(node.feature as usize).copied().unwrap_or(0.0);
            idx = if feat_val <= node.threshold {
                node.left as usize
            } else {
                node.right as usize
            };
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }
}

fn sum_and_sq(ys: &[f64], rows: &[usize]) -> (f64, f64) {
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for &row in rows {
        sum += ys[row];
        sum_sq += ys[row] * ys[row];
    }
    (sum, sum_sq)
}

#[allow(clippy::too_many_arguments)]
fn grow(
    nodes: &mut Vec<TreeNode>,
    xs: &[Vec<f64>],
    ys: &[f64],
    rows: &[usize],
    depth: usize,
    params: &TreeParams,
    rng: &mut ChaCha8Rng,
    importances: &mut [f64],
) -> i32 {
    let n = rows.len();
    let (sum, sum_sq) = sum_and_sq(ys, rows);
    let mean = sum / n as f64;
    let parent_sse = (sum_sq - sum * sum / n as f64).max(0.0);

    let make_leaf = |nodes: &mut Vec<TreeNode>| -> i32 {
        nodes.push(TreeNode {
            feature: -1,
            threshold: 0.0,
            left: -1,
            right: -1,
            value: mean,
        });
        (nodes.len() - 1) as i32
    };

    if depth >= params.max_depth || n < params.min_samples_split || parent_sse <= 1e-12 {
        return make_leaf(nodes);
    }

    let best = match find_best_split(xs, ys, rows, params, rng) {
        Some(split) => split,
        None => return make_leaf(nodes),
    };

    importances[best.feature] += parent_sse - best.sse;

    let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
        .iter()
        .partition(|&&row| xs[row][best.feature] <= best.threshold);

    let node_idx = nodes.len();
    nodes.push(TreeNode {
        feature: best.feature as i32,
        threshold: best.threshold,
        left: -1,
        right: -1,
        value: mean,
    });

    let left = grow(nodes, xs, ys, &left_rows, depth + 1, params, rng, importances);
    let right = grow(nodes, xs, ys, &right_rows, depth + 1, params, rng, importances);
    nodes[node_idx].left = left;
    nodes[node_idx].right = right;
    node_idx as i32
}

fn find_best_split(
    xs: &[Vec<f64>],
    ys: &[f64],
    rows: &[usize],
    params: &TreeParams,
    rng: &mut ChaCha8Rng,
) -> Option<BestSplit> {
    let n = rows.len();
    let n_features = xs.first().map_or(0, Vec::len);
    if n_features == 0 {
        return None;
    }

    let candidates: Vec<usize> = match params.max_features {
        Some(k) if k < n_features => sample_indices(rng, n_features, k).into_vec(),
        _ => (0..n_features).collect(),
    };

    let min_leaf = params.min_samples_leaf.max(1);
    let mut best: Option<BestSplit> = None;
    let mut pairs: Vec<(f64, f64)> = Vec::with_capacity(n);

    for &feature in &candidates {
        pairs.clear();
        pairs.extend(rows.iter().map(|&row| (xs[row][feature], ys[row])));
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let total_sum: f64 = pairs.iter().map(|p| p.1).sum();
        let total_sq: f64 = pairs.iter().map(|p| p.1 * p.1).sum();

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for i in 0..n - 1 {
            left_sum += pairs[i].1;
            left_sq += pairs[i].1 * pairs[i].1;

            let n_left = i + 1;
            let n_right = n - n_left;
            if n_left < min_leaf || n_right < min_leaf {
                continue;
            }
            // No valid split between identical values.
            if pairs[i].0 == pairs[i + 1].0 {
                continue;
            }

            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let sse = (left_sq - left_sum * left_sum / n_left as f64).max(0.0)
                + (right_sq - right_sum * right_sum / n_right as f64).max(0.0);

            if best.as_ref().map_or(true, |b| sse < b.sse) {
                best = Some(BestSplit {
                    feature,
                    threshold: (pairs[i].0 + pairs[i + 1].0) / 2.0,
                    sse,
                });
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn default_params() -> TreeParams {
        TreeParams {
            max_depth: 6,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }

    fn fit_simple(xs: &[Vec<f64>], ys: &[f64], params: &TreeParams) -> (RegressionTree, Vec<f64>) {
        let rows: Vec<usize> = (0..xs.len()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut importances = vec![0.0; xs[0].len()];
        let tree = RegressionTree::fit(xs, ys, &rows, params, &mut rng, &mut importances);
        (tree, importances)
    }

    #[test]
    fn fits_a_step_function_exactly() {
        let xs: Vec<Vec<f64>> = (0..20).map(|i| vec![f64::from(i)]).collect();
        let ys: Vec<f64> = (0..20).map(|i| if i < 10 { 1.0 } else { 5.0 }).collect();
        let (tree, _) = fit_simple(&xs, &ys, &default_params());

        assert_eq!(tree.predict(&[3.0]), 1.0);
        assert_eq!(tree.predict(&[15.0]), 5.0);
    }

    #[test]
    fn threshold_boundary_goes_left() {
        let xs = vec![vec![0.0], vec![1.0], vec![2.0], vec![3.0]];
        let ys = vec![0.0, 0.0, 10.0, 10.0];
        let (tree, _) = fit_simple(&xs, &ys, &default_params());
        // Split lands at 1.5; values at or below go left.
        assert_eq!(tree.predict(&[1.5]), 0.0);
        assert_eq!(tree.predict(&[1.6]), 10.0);
    }

    #[test]
    fn constant_target_yields_single_leaf() {
        let xs = vec![vec![1.0], vec![2.0], vec![3.0]];
        let ys = vec![4.0, 4.0, 4.0];
        let (tree, importances) = fit_simple(&xs, &ys, &default_params());
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.predict(&[100.0]), 4.0);
        assert_eq!(importances[0], 0.0);
    }

    #[test]
    fn importance_lands_on_the_informative_feature() {
        // Feature 1 carries all of the signal, feature 0 is constant.
        let xs: Vec<Vec<f64>> = (0..30).map(|i| vec![1.0, f64::from(i)]).collect();
        let ys: Vec<f64> = (0..30).map(|i| f64::from(i) * 2.0).collect();
        let (_, importances) = fit_simple(&xs, &ys, &default_params());
        assert_eq!(importances[0], 0.0);
        assert!(importances[1] > 0.0);
    }

    #[test]
    fn min_samples_leaf_is_respected() {
        let xs: Vec<Vec<f64>> = (0..8).map(|i| vec![f64::from(i)]).collect();
        let ys: Vec<f64> = (0..8).map(f64::from).collect();
        let params = TreeParams {
            min_samples_leaf: 4,
            ..default_params()
        };
        let (tree, _) = fit_simple(&xs, &ys, &params);
        // Only the 4/4 split is allowed, so exactly one internal node.
        assert_eq!(tree.n_nodes(), 3);
        assert_eq!(tree.n_leaves(), 2);
    }

    #[test]
    fn max_depth_zero_is_a_stump_mean() {
        let xs: Vec<Vec<f64>> = (0..5).map(|i| vec![f64::from(i)]).collect();
        let ys = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let params = TreeParams {
            max_depth: 0,
            ..default_params()
        };
        let (tree, _) = fit_simple(&xs, &ys, &params);
        assert_eq!(tree.n_nodes(), 1);
        assert!((tree.predict(&[0.0]) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn serde_round_trip() {
        let xs: Vec<Vec<f64>> = (0..20).map(|i| vec![f64::from(i)]).collect();
        let ys: Vec<f64> = (0..20).map(|i| if i < 10 { 1.0 } else { 5.0 }).collect();
        let (tree, _) = fit_simple(&xs, &ys, &default_params());

        let json = serde_json::to_string(&tree).unwrap();
        let restored: RegressionTree = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.predict(&[3.0]), tree.predict(&[3.0]));
        assert_eq!(restored.n_nodes(), tree.n_nodes());
    }
}
