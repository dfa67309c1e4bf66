//! Regression tree nodes and the recursive trainer.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::split::find_split_in;
use crate::{is_sorted_features, Sample};

/// Combined partition size above which the two subtrees train in parallel.
pub const PARALLEL_SPLIT_THRESHOLD: usize = 4096;

/// A regression tree node.
///
/// Queries with `feature` active descend left, others right. A missing child
/// means that branch ends here and yields `mean`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub feature: u16,
    pub mean: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<Box<TreeNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<Box<TreeNode>>,
}

/// Pre-order index of a node within its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(pub usize);

impl TreeNode {
    /// A constant tree.
    pub fn leaf(mean: f64) -> Self {
        Self {
            feature: 0,
            mean,
            left: None,
            right: None,
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    #[inline]
    fn branch(&self, present: bool) -> Option<&TreeNode> {
        if present {
            self.left.as_deref()
        } else {
            self.right.as_deref()
        }
    }

    /// Evaluate against a sorted sparse feature list.
    pub fn evaluate(&self, features: &[u16]) -> f64 {
        let mut node = self;
        loop {
            if node.is_leaf() {
                return node.mean;
            }
            match node.branch(features.binary_search(&node.feature).is_ok()) {
                Some(child) => node = child,
                None => return node.mean,
            }
        }
    }

    /// Evaluate against a dense feature mask.
    pub fn evaluate_mask(&self, mask: &[bool]) -> f64 {
        let mut node = self;
        loop {
            if node.is_leaf() {
                return node.mean;
            }
            let present = mask.get(node.feature as usize).copied().unwrap_or(false);
            match node.branch(present) {
                Some(child) => node = child,
                None => return node.mean,
            }
        }
    }

    /// Handle of the node whose `mean` decides the value for `features`.
    pub fn leaf_for(&self, features: &[u16]) -> NodeHandle {
        let mut node = self;
        let mut index = 0;
        loop {
            if node.is_leaf() {
                return NodeHandle(index);
            }
            let present = features.binary_search(&node.feature).is_ok();
            let skipped = if present {
                0
            } else {
                node.left.as_ref().map_or(0, |l| l.node_count())
            };
            match node.branch(present) {
                Some(child) => {
                    index += 1 + skipped;
                    node = child;
                }
                None => return NodeHandle(index),
            }
        }
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.visit(&mut |_| count += 1);
        count
    }

    /// Length of the longest root-to-leaf path, in edges.
    pub fn depth(&self) -> usize {
        let left = self.left.as_ref().map_or(0, |n| 1 + n.depth());
        let right = self.right.as_ref().map_or(0, |n| 1 + n.depth());
        left.max(right)
    }

    /// Pre-order visit.
    pub fn visit<F: FnMut(&TreeNode)>(&self, f: &mut F) {
        f(self);
        if let Some(left) = &self.left {
            left.visit(f);
        }
        if let Some(right) = &self.right {
            right.visit(f);
        }
    }

    /// Pre-order visit with mutable access.
    pub fn visit_mut<F: FnMut(&mut TreeNode)>(&mut self, f: &mut F) {
        f(self);
        if let Some(left) = &mut self.left {
            left.visit_mut(f);
        }
        if let Some(right) = &mut self.right {
            right.visit_mut(f);
        }
    }

    /// Multiply every node's mean by `factor`.
    pub fn scale_means(&mut self, factor: f64) {
        self.visit_mut(&mut |node| node.mean *= factor);
    }
}

/// Tree growth limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
    /// Exclusive upper bound on feature indices
    pub max_features: usize,
    /// A partition is split further only if it has more samples than this
    pub min_leaf_size: usize,
    /// Split levels below the root; 0 gives a single split with two leaves
    pub max_depth: u32,
}

/// Train one tree. Returns `None` if the root cannot be split.
pub fn train_tree(params: &TreeParams, samples: &[Sample<'_>]) -> Option<TreeNode> {
    debug_assert!(
        samples.iter().all(|s| is_sorted_features(s.features)),
        "sample features must be strictly ascending"
    );
    let indices: Vec<usize> = (0..samples.len()).collect();
    grow(params, samples, &indices, params.max_depth, 0)
}

fn grow(
    params: &TreeParams,
    samples: &[Sample<'_>],
    indices: &[usize],
    depth_left: u32,
    depth: u32,
) -> Option<TreeNode> {
    let split = find_split_in(params.max_features, indices.iter().map(|&i| samples[i]))?;
    debug!(depth, loss = split.residual_std_dev, feature = split.feature, "Split node");

    let mean = indices.iter().map(|&i| samples[i].target).sum::<f64>() / indices.len() as f64;
    let mut node = TreeNode {
        feature: split.feature,
        mean,
        left: None,
        right: None,
    };

    if depth_left == 0 {
        node.left = Some(Box::new(TreeNode::leaf(split.mean_present)));
        node.right = Some(Box::new(TreeNode::leaf(split.mean_absent)));
        return Some(node);
    }

    let (present, absent): (Vec<usize>, Vec<usize>) =
        indices.iter().partition(|&&i| samples[i].has(split.feature));
    debug_assert!(!present.is_empty() && !absent.is_empty());

    let recurse_left = present.len() > params.min_leaf_size;
    let recurse_right = absent.len() > params.min_leaf_size;
    let next = depth_left - 1;
    let train_side = |side: &[usize], recurse: bool| {
        if recurse {
            grow(params, samples, side, next, depth + 1)
        } else {
            None
        }
    };

    let (left, right) =
        if recurse_left && recurse_right && present.len() + absent.len() > PARALLEL_SPLIT_THRESHOLD {
            rayon::join(|| train_side(&present, true), || train_side(&absent, true))
        } else {
            (
                train_side(&present, recurse_left),
                train_side(&absent, recurse_right),
            )
        };

    node.left = Some(Box::new(
        left.unwrap_or_else(|| TreeNode::leaf(split.mean_present)),
    ));
    node.right = Some(Box::new(
        right.unwrap_or_else(|| TreeNode::leaf(split.mean_absent)),
    ));
    Some(node)
}
