//! Random forest regression.
//!
//! Bagged CART trees with squared-error splits, grown without a depth limit.
//! Each tree draws its bootstrap sample from an RNG seeded by the forest seed
//! and the tree index, so results do not depend on the thread count.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::{Result, ScorebookError};

/// A fitted model that maps feature rows to predictions
pub trait Regressor: Send + Sync {
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>>;

    /// Relative importance of each feature, summing to 1 (or all zero)
    fn feature_importances(&self) -> &[f64];
}

/// Fits a [`Regressor`] from a feature matrix and targets
pub trait Trainer {
    type Model: Regressor;

    fn fit(&self, features: &[Vec<f64>], targets: &[f64]) -> Result<Self::Model>;

    /// Short model description for reports and the ledger
    fn describe(&self) -> String;
}

#[derive(Debug, Clone)]
pub struct RandomForestTrainer {
    pub n_estimators: usize,
    pub random_state: u64,
    /// Worker threads (None = rayon's global pool, one per core)
    pub n_jobs: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for RandomForestTrainer {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            random_state: 42,
            n_jobs: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

impl RandomForestTrainer {
    pub fn new(n_estimators: usize, random_state: u64) -> Self {
        Self {
            n_estimators,
            random_state,
            ..Default::default()
        }
    }

    pub fn with_n_jobs(mut self, n_jobs: Option<usize>) -> Self {
        self.n_jobs = n_jobs;
        self
    }

    fn tree_seed(&self, index: usize) -> u64 {
        self.random_state ^ (index as u64).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
    }

    fn grow_trees(&self, features: &[Vec<f64>], targets: &[f64]) -> Vec<(RegressionTree, Vec<f64>)> {
        (0..self.n_estimators)
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(self.tree_seed(i));
                let n = targets.len();
                let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                RegressionTree::grow(features, targets, sample, self)
            })
            .collect()
    }
}

impl Trainer for RandomForestTrainer {
    type Model = RandomForest;

    fn fit(&self, features: &[Vec<f64>], targets: &[f64]) -> Result<RandomForest> {
        if features.is_empty() {
            return Err(ScorebookError::Training("training set is empty".to_string()));
        }
        if features.len() != targets.len() {
            return Err(ScorebookError::Training(format!(
                "{} feature rows but {} targets",
                features.len(),
                targets.len()
            )));
        }
        if self.n_estimators == 0 {
            return Err(ScorebookError::Training(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        let n_features = features[0].len();
        if let Some(i) = features.iter().position(|r| r.len() != n_features) {
            return Err(ScorebookError::Training(format!(
                "row {} has {} features, expected {}",
                i,
                features[i].len(),
                n_features
            )));
        }

        info!(
            "Growing {} trees on {} rows x {} features",
            self.n_estimators,
            features.len(),
            n_features
        );

        let grown = match self.n_jobs {
            Some(threads) => rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| ScorebookError::Training(format!("thread pool: {e}")))?
                .install(|| self.grow_trees(features, targets)),
            None => self.grow_trees(features, targets),
        };

        let mut importances = vec![0.0; n_features];
        let mut trees = Vec::with_capacity(grown.len());
        for (tree, tree_importances) in grown {
            for (total, value) in importances.iter_mut().zip(tree_importances) {
                *total += value;
            }
            trees.push(tree);
        }
        normalize(&mut importances);

        debug!(
            "Forest grown: {} nodes total",
            trees.iter().map(|t| t.nodes.len()).sum::<usize>()
        );

        Ok(RandomForest {
            trees,
            n_features,
            importances,
        })
    }

    fn describe(&self) -> String {
        format!("RandomForestRegressor (n_estimators={})", self.n_estimators)
    }
}

fn normalize(values: &mut [f64]) {
    let sum: f64 = values.iter().sum();
    if sum > 0.0 {
        for v in values.iter_mut() {
            *v /= sum;
        }
    }
}

/// Averaged ensemble of regression trees
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
    n_features: usize,
    importances: Vec<f64>,
}

impl RandomForest {
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for RandomForest {
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        if let Some(i) = rows.iter().position(|r| r.len() != self.n_features) {
            return Err(ScorebookError::Validation(format!(
                "prediction row {} has {} features, model expects {}",
                i,
                rows[i].len(),
                self.n_features
            )));
        }

        let n_trees = self.trees.len() as f64;
        Ok(rows
            .par_iter()
            .map(|row| self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / n_trees)
            .collect())
    }

    fn feature_importances(&self) -> &[f64] {
        &self.importances
    }
}

#[derive(Debug, Clone, Copy)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
struct RegressionTree {
    nodes: Vec<Node>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    child_sse: f64,
}

impl RegressionTree {
    /// Grow a tree on `sample` (indices may repeat). Returns the tree and its
    /// normalised impurity-decrease importances.
    fn grow(
        features: &[Vec<f64>],
        targets: &[f64],
        sample: Vec<usize>,
        params: &RandomForestTrainer,
    ) -> (Self, Vec<f64>) {
        let n_features = features[0].len();
        let mut importances = vec![0.0; n_features];
        let mut nodes = vec![Node::Leaf { value: 0.0 }];
        let mut pending = vec![(0usize, sample)];

        while let Some((index, samples)) = pending.pop() {
            let n = samples.len() as f64;
            let (sum, sum_sq) = samples.iter().fold((0.0, 0.0), |(s, sq), &i| {
                (s + targets[i], sq + targets[i] * targets[i])
            });
            nodes[index] = Node::Leaf { value: sum / n };

            let node_sse = sum_sq - sum * sum / n;
            if samples.len() < params.min_samples_split || node_sse <= 1e-12 {
                continue;
            }

            let Some(best) = best_split(features, targets, &samples, params.min_samples_leaf)
            else {
                continue;
            };
            importances[best.feature] += (node_sse - best.child_sse).max(0.0);

            let (left, right): (Vec<usize>, Vec<usize>) = samples
                .into_iter()
                .partition(|&i| features[i][best.feature] <= best.threshold);

            let left_index = nodes.len();
            let right_index = left_index + 1;
            nodes.push(Node::Leaf { value: 0.0 });
            nodes.push(Node::Leaf { value: 0.0 });
            nodes[index] = Node::Split {
                feature: best.feature,
                threshold: best.threshold,
                left: left_index,
                right: right_index,
            };
            pending.push((left_index, left));
            pending.push((right_index, right));
        }

        normalize(&mut importances);
        (Self { nodes }, importances)
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes[index] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[feature] <= threshold { left } else { right };
                }
            }
        }
    }
}

/// Lowest total child SSE over every feature and every gap between distinct values
fn best_split(
    features: &[Vec<f64>],
    targets: &[f64],
    samples: &[usize],
    min_samples_leaf: usize,
) -> Option<BestSplit> {
    let n = samples.len();
    let total_sum: f64 = samples.iter().map(|&i| targets[i]).sum();
    let total_sq: f64 = samples.iter().map(|&i| targets[i] * targets[i]).sum();
    let mut best: Option<BestSplit> = None;
    let mut sorted = samples.to_vec();

    for feature in 0..features[0].len() {
        sorted.sort_by(|&a, &b| features[a][feature].total_cmp(&features[b][feature]));

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for k in 1..n {
            let y = targets[sorted[k - 1]];
            left_sum += y;
            left_sq += y * y;

            let lo = features[sorted[k - 1]][feature];
            let hi = features[sorted[k]][feature];
            if lo == hi || k < min_samples_leaf || n - k < min_samples_leaf {
                continue;
            }

            let left_n = k as f64;
            let right_n = (n - k) as f64;
            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let child_sse =
                (left_sq - left_sum * left_sum / left_n) + (right_sq - right_sum * right_sum / right_n);

            if best.as_ref().map_or(true, |b| child_sse < b.child_sse - 1e-12) {
                let mid = lo + (hi - lo) / 2.0;
                best = Some(BestSplit {
                    feature,
                    threshold: if mid < hi { mid } else { lo },
                    child_sse,
                });
            }
        }
    }

    best
}
