use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

pub mod fallback;
pub mod forest;
pub mod linear;
pub mod model;

use fallback::FallbackFormula;
use forest::{ForestModel, ForestParams};
use linear::{LinearModel, LinearParams};
use model::{FEATURE_NAMES, FeatureVector, WaitModel};

// Model Factory
pub fn create_model(artifact: &ArtifactFile) -> Result<Box<dyn WaitModel>, ArtifactError> {
    if artifact.features != FEATURE_NAMES {
        return Err(ArtifactError::SchemaMismatch {
            expected: FEATURE_NAMES.join(","),
            found: artifact.features.join(","),
        });
    }

    let version = artifact.version.clone();
    match artifact.model.as_str() {
        "linear" => {
            let params: LinearParams = serde_json::from_value(artifact.params.clone())?;
            let model = LinearModel::new(params, version).map_err(ArtifactError::Invalid)?;
            Ok(Box::new(model))
        }
        "random_forest" => {
            let params: ForestParams = serde_json::from_value(artifact.params.clone())?;
            let model = ForestModel::new(params, version).map_err(ArtifactError::Invalid)?;
            info!(trees = model.tree_count(), "Random forest artifact parsed");
            Ok(Box::new(model))
        }
        other => Err(ArtifactError::Invalid(format!("unknown model: {other}"))),
    }
}

#[derive(Debug, Deserialize)]
pub struct ArtifactFile {
    pub model: String,
    pub version: String,
    pub features: Vec<String>,
    pub params: serde_json::Value,
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read artifact file: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse artifact file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("artifact feature schema mismatch: expected [{expected}], found [{found}]")]
    SchemaMismatch { expected: String, found: String },
    #[error("invalid artifact: {0}")]
    Invalid(String),
}

pub fn load_artifact_from_path(
    path: impl AsRef<Path>,
) -> Result<Box<dyn WaitModel>, ArtifactError> {
    let contents = std::fs::read_to_string(path)?;
    let artifact: ArtifactFile = serde_json::from_str(&contents)?;
    create_model(&artifact)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineSource {
    Artifact,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    pub minutes: f64,
    pub source: BaselineSource,
}

/// Raw wait estimate from the loaded artifact, or the closed-form formula when
/// the artifact is absent or fails on a given input.
#[derive(Debug, Clone)]
pub struct BaselineEstimator {
    primary: Option<Arc<dyn WaitModel>>,
    fallback: FallbackFormula,
}

impl BaselineEstimator {
    pub fn new(primary: Option<Arc<dyn WaitModel>>) -> Self {
        Self {
            primary,
            fallback: FallbackFormula::default(),
        }
    }

    pub fn fallback_only() -> Self {
        Self::new(None)
    }

    pub fn with_fallback(mut self, fallback: FallbackFormula) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn primary(&self) -> Option<&dyn WaitModel> {
        self.primary.as_deref()
    }

    pub fn fallback(&self) -> &FallbackFormula {
        &self.fallback
    }

    pub fn estimate(&self, features: &FeatureVector) -> Baseline {
        if let Some(model) = self.primary.as_ref() {
            match model.estimate(features) {
                Ok(minutes) => {
                    return Baseline {
                        minutes,
                        source: BaselineSource::Artifact,
                    };
                }
                Err(err) => {
                    warn!(
                        error = %err,
                        model = model.describe(),
                        "Artifact estimate failed, using fallback formula"
                    );
                }
            }
        }

        Baseline {
            minutes: self.fallback.compute(features),
            source: BaselineSource::Fallback,
        }
    }
}

/// Load the artifact at `path`, logging and returning `None` on any failure.
pub fn load_primary_model(path: Option<&Path>) -> Option<Arc<dyn WaitModel>> {
    let path = match path {
        Some(path) => path,
        None => {
            info!("No artifact path configured, using fallback formula");
            return None;
        }
    };

    match load_artifact_from_path(path) {
        Ok(model) => {
            info!(
                path = %path.display(),
                model = model.describe(),
                version = model.version().unwrap_or("unknown"),
                "Regression artifact loaded"
            );
            Some(Arc::from(model))
        }
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "Failed to load artifact, using fallback formula"
            );
            None
        }
    }
}
