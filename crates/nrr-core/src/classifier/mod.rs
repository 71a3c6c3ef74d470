//! # Match Classifier
//!
//! A small pre-trained MLP mapping a [`FeatureVector`] to a match probability.
//! Weights are fetched once, loaded with candle and never mutated; the
//! calibration means that shipped with them travel alongside so features are
//! always centered the way the weights expect.

pub mod artifact;
pub mod model;

use std::path::{Path, PathBuf};

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use tracing::{debug, info};

use crate::error::{NrrError, Result};
use crate::features::{FEATURE_DIM, FeatureCalibration, FeatureVector};

pub use artifact::ensure_artifact;
pub use model::MlpModel;

/// Default local path of the classifier weights.
pub const DEFAULT_WEIGHTS_PATH: &str = "nrr_mlp.pt";
/// Published location of the trained weights.
pub const DEFAULT_WEIGHTS_URL: &str =
    "https://github.com/t-a-bonnet/NRR/blob/main/nrr/nrr_mlp.pt?raw=true";

const CALIBRATION_SUFFIX: &str = ".calibration.json";

/// Where the classifier artifact lives and where to get it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    pub weights_path: PathBuf,
    pub weights_url: String,
    /// Explicit calibration file. When unset, a `<weights>.calibration.json`
    /// sidecar is used if present, otherwise the shipped means.
    pub calibration_path: Option<PathBuf>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            weights_path: PathBuf::from(DEFAULT_WEIGHTS_PATH),
            weights_url: DEFAULT_WEIGHTS_URL.to_string(),
            calibration_path: None,
        }
    }
}

impl ModelConfig {
    pub fn new(weights_path: impl Into<PathBuf>) -> Self {
        Self {
            weights_path: weights_path.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.weights_url = url.into();
        self
    }

    #[must_use]
    pub fn with_calibration_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.calibration_path = Some(path.into());
        self
    }

    /// The sidecar calibration path derived from the weights path.
    #[must_use]
    pub fn sidecar_calibration_path(&self) -> PathBuf {
        let mut path = self.weights_path.as_os_str().to_owned();
        path.push(CALIBRATION_SUFFIX);
        PathBuf::from(path)
    }

    fn resolve_calibration(&self) -> Result<FeatureCalibration> {
        if let Some(path) = &self.calibration_path {
            return FeatureCalibration::from_path(path);
        }
        let sidecar = self.sidecar_calibration_path();
        if sidecar.is_file() {
            debug!(path = %sidecar.display(), "using calibration sidecar");
            return FeatureCalibration::from_path(&sidecar);
        }
        Ok(FeatureCalibration::default())
    }
}

fn model_error(e: impl std::fmt::Display) -> NrrError {
    NrrError::ModelLoad(e.to_string())
}

fn inference_error(e: impl std::fmt::Display) -> NrrError {
    NrrError::Inference(e.to_string())
}

fn is_safetensors(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "safetensors")
}

/// Loaded classifier plus the feature centers it was trained with.
pub struct MatchClassifier {
    model: MlpModel,
    device: Device,
    calibration: FeatureCalibration,
}

impl MatchClassifier {
    /// Ensures the weights exist locally (downloading if absent) and loads them.
    ///
    /// # Errors
    ///
    /// Returns `NrrError::ModelLoad` if the artifact cannot be fetched, read,
    /// or does not have the 4 -> 64 -> 32 -> 1 layout.
    pub fn load(config: &ModelConfig) -> Result<Self> {
        let path = ensure_artifact(&config.weights_path, &config.weights_url)?;
        let device = Device::Cpu;

        let vb = if is_safetensors(&path) {
            unsafe { VarBuilder::from_mmaped_safetensors(&[&path], DType::F32, &device) }
                .map_err(model_error)?
        } else {
            VarBuilder::from_pth(&path, DType::F32, &device).map_err(model_error)?
        };

        let classifier = Self::from_var_builder(vb, config.resolve_calibration()?)?;
        info!(path = %path.display(), "match classifier loaded");
        Ok(classifier)
    }

    /// Builds the classifier from already-located parameters.
    ///
    /// # Errors
    ///
    /// Returns `NrrError::ModelLoad` on a missing or mis-shaped parameter.
    pub fn from_var_builder(vb: VarBuilder, calibration: FeatureCalibration) -> Result<Self> {
        let device = vb.device().clone();
        let model = MlpModel::load(vb).map_err(model_error)?;
        Ok(Self {
            model,
            device,
            calibration,
        })
    }

    /// Centers to feed [`FeatureCalibration::build`] for these weights.
    #[must_use]
    pub fn calibration(&self) -> &FeatureCalibration {
        &self.calibration
    }

    /// Raw logits, one per feature vector.
    ///
    /// # Errors
    ///
    /// Returns `NrrError::Inference` if the forward pass fails.
    pub fn logits(&self, features: &[FeatureVector]) -> Result<Vec<f32>> {
        if features.is_empty() {
            return Ok(Vec::new());
        }

        let flat: Vec<f32> = features.iter().flat_map(FeatureVector::as_array).collect();
        let input =
            Tensor::from_vec(flat, (features.len(), FEATURE_DIM), &self.device).map_err(inference_error)?;

        self.model
            .forward(&input)
            .and_then(|t| t.flatten_all())
            .and_then(|t| t.to_vec1::<f32>())
            .map_err(inference_error)
    }

    /// Match probabilities in `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns `NrrError::Inference` if the forward pass fails.
    pub fn probabilities(&self, features: &[FeatureVector]) -> Result<Vec<f32>> {
        Ok(self.logits(features)?.into_iter().map(sigmoid).collect())
    }

    /// Binary labels: 1 iff the probability is strictly above 0.5.
    ///
    /// Deterministic for identical input.
    ///
    /// # Errors
    ///
    /// Returns `NrrError::Inference` if the forward pass fails.
    pub fn predict(&self, features: &[FeatureVector]) -> Result<Vec<u8>> {
        Ok(self
            .probabilities(features)?
            .into_iter()
            .map(|p| u8::from(p > 0.5))
            .collect())
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
