//! Regression trees over sparse boolean features, and gradient boosting.
//!
//! Samples are ascending, duplicate-free lists of active feature indices
//! paired with a real-valued target. Every consumer relies on that ordering
//! (cursor scans and binary search), so callers must keep it.
//!
//! - [`find_split`]: best single-feature split by squared error
//! - [`train_tree`]: recursive tree growth, parallel on large partitions
//! - [`train_boosted`]: additive ensemble with learning rate, L2 decay and
//!   validation-based early stopping
//! - [`Ensemble`]: the trained model and its JSON persistence

pub mod boosting;
pub mod model;
pub mod split;
pub mod tree;

pub use boosting::{leaf_gradients, train_boosted, BoostingOutcome, BoostingParams, GradientTable, RoundReport};
pub use model::{Ensemble, ModelError};
pub use split::{find_split, Split};
pub use tree::{train_tree, NodeHandle, TreeNode, TreeParams, PARALLEL_SPLIT_THRESHOLD};

/// A training sample borrowing its feature list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample<'a> {
    /// Active features, strictly ascending
    pub features: &'a [u16],
    pub target: f64,
}

impl<'a> Sample<'a> {
    pub fn new(features: &'a [u16], target: f64) -> Self {
        Self { features, target }
    }

    /// Binary search for `feature` in the sorted feature list.
    #[inline]
    pub fn has(&self, feature: u16) -> bool {
        self.features.binary_search(&feature).is_ok()
    }
}

/// Owned counterpart of [`Sample`], for buffers that outlive a training call.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuf {
    pub features: Vec<u16>,
    pub target: f64,
}

impl SampleBuf {
    pub fn new(features: Vec<u16>, target: f64) -> Self {
        Self { features, target }
    }

    pub fn view(&self) -> Sample<'_> {
        Sample {
            features: &self.features,
            target: self.target,
        }
    }
}

/// Borrow a slice of owned samples.
pub fn views(samples: &[SampleBuf]) -> Vec<Sample<'_>> {
    samples.iter().map(SampleBuf::view).collect()
}

pub(crate) fn is_sorted_features(features: &[u16]) -> bool {
    features.windows(2).all(|w| w[0] < w[1])
}
