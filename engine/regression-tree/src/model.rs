//! Trained ensembles and their JSON persistence.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::tree::TreeNode;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid model JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// An additive ensemble of regression trees.
///
/// Serialized as a plain JSON array of tree nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ensemble {
    pub trees: Vec<TreeNode>,
}

impl Ensemble {
    pub fn new(trees: Vec<TreeNode>) -> Self {
        Self { trees }
    }

    /// Sum of all tree values for a sorted sparse feature list.
    pub fn predict(&self, features: &[u16]) -> f64 {
        self.trees.iter().map(|t| t.evaluate(features)).sum()
    }

    /// Sum of all tree values for a dense feature mask.
    pub fn predict_mask(&self, mask: &[bool]) -> f64 {
        self.trees.iter().map(|t| t.evaluate_mask(mask)).sum()
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Append the trees of a later training round.
    pub fn extend(&mut self, other: Ensemble) {
        self.trees.extend(other.trees);
    }

    pub fn node_count(&self) -> usize {
        self.trees.iter().map(TreeNode::node_count).sum()
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;
        debug!(path = %path.display(), trees = self.len(), "Saved ensemble");
        Ok(())
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        Ok(serde_json::from_reader(reader)?)
    }
}
