//! Trained ensemble as a search evaluator, and model file handling.
//!
//! The ensemble lives at `<data_dir>/models/latest.json`. Saves go through a
//! temp file and a rename so a crash never leaves a truncated model behind.

use anyhow::{Context, Result};
use engine_core::{FeatureCodec, Position};
use minimax::{Evaluator, StaticEvaluator, SumEvaluator};
use regression_tree::Ensemble;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const LATEST_MODEL: &str = "latest.json";

/// Scores positions with a tree ensemble over a feature codec.
#[derive(Debug, Clone)]
pub struct EnsembleEvaluator<C> {
    ensemble: Arc<Ensemble>,
    codec: C,
}

impl<C> EnsembleEvaluator<C> {
    pub fn new(ensemble: Arc<Ensemble>, codec: C) -> Self {
        Self { ensemble, codec }
    }
}

impl<P, C> Evaluator<P> for EnsembleEvaluator<C>
where
    P: Position,
    C: FeatureCodec<P>,
{
    fn evaluate(&self, position: &P) -> f64 {
        let features = self.codec.features(position);
        self.ensemble.predict(&features)
    }
}

/// Evaluator used by self-play: the ensemble alone, or blended with the
/// position's static balance.
#[derive(Debug, Clone)]
pub enum TrainedEvaluator<C> {
    Ensemble(EnsembleEvaluator<C>),
    Blended(SumEvaluator<EnsembleEvaluator<C>, StaticEvaluator>),
}

impl<C> TrainedEvaluator<C> {
    pub fn new(ensemble: Arc<Ensemble>, codec: C, blend_static: bool) -> Self {
        let evaluator = EnsembleEvaluator::new(ensemble, codec);
        if blend_static {
            TrainedEvaluator::Blended(SumEvaluator::new(evaluator, StaticEvaluator))
        } else {
            TrainedEvaluator::Ensemble(evaluator)
        }
    }
}

impl<P, C> Evaluator<P> for TrainedEvaluator<C>
where
    P: Position,
    C: FeatureCodec<P>,
{
    fn evaluate(&self, position: &P) -> f64 {
        match self {
            TrainedEvaluator::Ensemble(e) => e.evaluate(position),
            TrainedEvaluator::Blended(e) => e.evaluate(position),
        }
    }
}

/// Location of the persisted model.
#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            dir: data_dir.as_ref().join("models"),
        }
    }

    pub fn latest_path(&self) -> PathBuf {
        self.dir.join(LATEST_MODEL)
    }

    /// Load `latest.json` if it exists.
    pub fn try_load_existing(&self) -> Result<Option<Ensemble>> {
        let path = self.latest_path();
        if !path.exists() {
            return Ok(None);
        }
        let ensemble = Ensemble::load_json(&path)
            .with_context(|| format!("Failed to load model from {}", path.display()))?;
        info!(
            path = %path.display(),
            trees = ensemble.len(),
            nodes = ensemble.node_count(),
            "Loaded existing model"
        );
        Ok(Some(ensemble))
    }

    /// Write `ensemble` as the latest model.
    pub fn save(&self, ensemble: &Ensemble) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let path = self.latest_path();
        let temp_path = path.with_extension("json.tmp");
        ensemble
            .save_json(&temp_path)
            .with_context(|| format!("Failed to write {}", temp_path.display()))?;
        if let Err(e) = fs::rename(&temp_path, &path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e).with_context(|| format!("Failed to replace {}", path.display()));
        }

        debug!(path = %path.display(), trees = ensemble.len(), "Saved model");
        Ok(path)
    }
}
