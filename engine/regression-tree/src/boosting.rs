//! Gradient boosting of regression trees.
//!
//! The first tree is a constant at the training-target mean. Every later
//! tree fits the remaining residual scaled by the learning rate, while the
//! running prediction decays by `l2_decay` before each new tree is added.
//! An optional validation set drives early stopping and rollback to the
//! best round.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::model::Ensemble;
use crate::tree::{train_tree, NodeHandle, TreeNode, TreeParams};
use crate::Sample;

/// Boosting hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoostingParams {
    pub max_features: usize,
    pub min_leaf_size: usize,
    pub max_depth: u32,
    /// Upper bound on ensemble length, bias tree included
    pub max_trees: usize,
    pub learning_rate: f64,
    /// Decay applied to the running prediction each round (1.0 disables)
    pub l2_decay: f64,
    /// Non-improving validation rounds tolerated before stopping.
    ///
    /// The stale counter is bumped in every round, including one that
    /// improves. After an improvement the run stops on the `patience + 1`th
    /// stale round; if no round ever beats the baseline it stops on the
    /// `patience + 2`th.
    pub patience: u32,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            max_features: 0,
            min_leaf_size: 32,
            max_depth: 8,
            max_trees: 64,
            learning_rate: 0.5,
            l2_decay: 1.0,
            patience: 3,
        }
    }
}

impl BoostingParams {
    fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_features: self.max_features,
            min_leaf_size: self.min_leaf_size,
            max_depth: self.max_depth,
        }
    }
}

/// Losses after one boosting round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundReport {
    /// Number of trees after this round, bias included
    pub round: usize,
    pub train_rmse: f64,
    pub validation_rmse: Option<f64>,
}

/// Trained ensemble plus the per-round loss history.
#[derive(Debug, Clone, Default)]
pub struct BoostingOutcome {
    pub ensemble: Ensemble,
    pub history: Vec<RoundReport>,
    /// Set when validation loss stopped improving.
    pub stopped_early: bool,
}

/// Train a boosted ensemble on `train`, early-stopping on `validation`.
pub fn train_boosted(
    params: &BoostingParams,
    train: &[Sample<'_>],
    validation: Option<&[Sample<'_>]>,
) -> BoostingOutcome {
    let mut outcome = BoostingOutcome::default();
    if params.max_trees < 1 || train.is_empty() {
        return outcome;
    }

    let n = train.len() as f64;
    let bias = train.iter().map(|s| s.target).sum::<f64>() / n;
    let centered: Vec<f64> = train.iter().map(|s| s.target - bias).collect();
    let mut predictions = vec![0.0; train.len()];
    let mut residuals: Vec<Sample<'_>> = train
        .iter()
        .zip(&centered)
        .map(|(s, &c)| Sample::new(s.features, c * params.learning_rate))
        .collect();

    let mut trees = vec![TreeNode::leaf(bias)];

    // Validation state: centered truth, running prediction, best loss/length
    let mut validation_state = validation.filter(|v| !v.is_empty()).map(|v| {
        let truth: Vec<f64> = v.iter().map(|s| s.target - bias).collect();
        let against_bias: f64 = truth.iter().map(|t| t * t).sum();
        let against_zero: f64 = v.iter().map(|s| s.target * s.target).sum();
        let (best_loss, best_len) = if against_bias < against_zero {
            (against_bias, 1)
        } else {
            (against_zero, 0)
        };
        info!(
            rmse = (best_loss / v.len() as f64).sqrt(),
            "Baseline validation loss"
        );
        (v, truth, vec![0.0; v.len()], best_loss, best_len)
    });
    let mut stale = 0u32;
    let tree_params = params.tree_params();

    loop {
        if trees.len() >= params.max_trees {
            debug!(trees = trees.len(), "Reached tree limit");
            break;
        }
        debug!(tree = trees.len(), "Training tree");
        let Some(tree) = train_tree(&tree_params, &residuals) else {
            info!(trees = trees.len(), "Stopping early, unable to split root node");
            break;
        };
        trees.push(tree);
        let tree = &trees[trees.len() - 1];

        let mut loss = 0.0;
        for (i, sample) in train.iter().enumerate() {
            predictions[i] = predictions[i] * params.l2_decay + tree.evaluate(sample.features);
            let delta = centered[i] - predictions[i];
            residuals[i].target = delta * params.learning_rate;
            loss += delta * delta;
        }
        let train_rmse = (loss / n).sqrt();
        info!(trees = trees.len(), rmse = train_rmse, "Training loss");

        let mut report = RoundReport {
            round: trees.len(),
            train_rmse,
            validation_rmse: None,
        };

        if let Some((samples, truth, preds, best_loss, best_len)) = validation_state.as_mut() {
            let mut loss = 0.0;
            for (i, sample) in samples.iter().enumerate() {
                preds[i] = preds[i] * params.l2_decay + tree.evaluate(sample.features);
                let delta = truth[i] - preds[i];
                loss += delta * delta;
            }
            let rmse = (loss / samples.len() as f64).sqrt();
            info!(trees = trees.len(), rmse, "Validation loss");
            report.validation_rmse = Some(rmse);
            outcome.history.push(report);

            if loss < *best_loss {
                stale = 0;
                *best_loss = loss;
                *best_len = trees.len();
            } else if stale > params.patience {
                info!(best = *best_len, "Early stopping");
                outcome.stopped_early = true;
                break;
            }
            stale += 1;
        } else {
            outcome.history.push(report);
        }
    }

    if let Some((_, _, _, _, best_len)) = validation_state {
        if best_len < trees.len() {
            debug!(from = trees.len(), to = best_len, "Rolling back to best round");
            trees.truncate(best_len);
        }
    }

    if params.l2_decay < 1.0 {
        apply_decay(&mut trees, params.l2_decay);
    }

    outcome.ensemble = Ensemble::new(trees);
    outcome
}

/// Fold the running-prediction decay into the stored trees.
///
/// The second-to-last tree is scaled by `decay`, the one before by
/// `decay^2` and so on down to tree 1. The bias tree and the last tree keep
/// their means.
fn apply_decay(trees: &mut [TreeNode], decay: f64) {
    if trees.len() < 3 {
        return;
    }
    let last = trees.len() - 1;
    let mut factor = decay;
    for tree in trees[1..last].iter_mut().rev() {
        tree.scale_means(factor);
        factor *= decay;
    }
}

/// Per-node average residual of a tree over a sample set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GradientTable {
    gradients: HashMap<NodeHandle, f64>,
}

impl GradientTable {
    pub fn get(&self, handle: NodeHandle) -> f64 {
        self.gradients.get(&handle).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.gradients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gradients.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeHandle, f64)> + '_ {
        self.gradients.iter().map(|(&h, &g)| (h, g))
    }
}

/// Accumulate `sum(target - node.mean) / N` per deciding node of `tree`.
pub fn leaf_gradients(tree: &TreeNode, samples: &[Sample<'_>]) -> GradientTable {
    let mut table = GradientTable::default();
    if samples.is_empty() {
        return table;
    }

    let mut means = Vec::with_capacity(tree.node_count());
    tree.visit(&mut |node| means.push(node.mean));

    for sample in samples {
        let handle = tree.leaf_for(sample.features);
        *table.gradients.entry(handle).or_insert(0.0) += sample.target - means[handle.0];
    }
    let n = samples.len() as f64;
    for g in table.gradients.values_mut() {
        *g /= n;
    }
    table
}
