use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::domain::graph_config::HandTrackingOptions;
use crate::shared::constants::{LANDMARK_MODEL_NAME, PALM_MODEL_NAME};
use crate::shared::model_resolver::{self, ModelResolveError, ProgressFn};

pub const ENV_PALM_MODEL: &str = "HANDTRACK_PALM_MODEL";
pub const ENV_LANDMARK_MODEL: &str = "HANDTRACK_LANDMARK_MODEL";
pub const ENV_MODEL_DIR: &str = "HANDTRACK_MODEL_DIR";
pub const ENV_MODEL_BASE_URL: &str = "HANDTRACK_MODEL_BASE_URL";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Model(#[from] ModelResolveError),
}

/// Where the ONNX tracker finds its models.
///
/// Loaded from `<config dir>/HandTrack/settings.json` when present, then
/// overridden field by field from `HANDTRACK_*` environment variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerSettings {
    /// Explicit palm detection model file.
    pub palm_model: Option<PathBuf>,
    /// Explicit hand landmark model file.
    pub landmark_model: Option<PathBuf>,
    /// Directory searched for models after the user cache.
    pub model_dir: Option<PathBuf>,
    /// Base URL models are downloaded from when not found locally.
    pub model_base_url: Option<String>,
    pub num_hands: Option<u32>,
    pub min_detection_confidence: Option<f32>,
    pub min_tracking_confidence: Option<f32>,
}

/// Model files ready to load.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPaths {
    pub palm_model: PathBuf,
    pub landmark_model: PathBuf,
}

impl TrackerSettings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("HandTrack").join("settings.json"))
    }

    /// Settings file (if any) with environment overrides applied.
    pub fn load() -> Result<Self, SettingsError> {
        let base = match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };
        Ok(base.with_overrides(|key| std::env::var(key).ok()))
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path).map_err(|e| SettingsError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&json).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Applies overrides from `lookup`, which maps variable names to values.
    /// Empty values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        if let Some(v) = get(ENV_PALM_MODEL) {
            self.palm_model = Some(PathBuf::from(v));
        }
        if let Some(v) = get(ENV_LANDMARK_MODEL) {
            self.landmark_model = Some(PathBuf::from(v));
        }
        if let Some(v) = get(ENV_MODEL_DIR) {
            self.model_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = get(ENV_MODEL_BASE_URL) {
            self.model_base_url = Some(v);
        }
        self
    }

    /// Tracking node options, defaults for unset fields.
    pub fn hand_tracking_options(&self) -> HandTrackingOptions {
        let defaults = HandTrackingOptions::default();
        HandTrackingOptions {
            num_hands: self.num_hands.unwrap_or(defaults.num_hands),
            min_detection_confidence: self
                .min_detection_confidence
                .unwrap_or(defaults.min_detection_confidence),
            min_tracking_confidence: self
                .min_tracking_confidence
                .unwrap_or(defaults.min_tracking_confidence),
        }
    }

    /// Resolves both model files. Explicit paths win; otherwise each model is
    /// looked up through [`model_resolver::resolve`].
    pub fn resolve_models(
        &self,
        progress: Option<fn(u64, u64)>,
    ) -> Result<ModelPaths, SettingsError> {
        let palm_model = self.resolve_one(&self.palm_model, PALM_MODEL_NAME, progress)?;
        let landmark_model =
            self.resolve_one(&self.landmark_model, LANDMARK_MODEL_NAME, progress)?;
        Ok(ModelPaths {
            palm_model,
            landmark_model,
        })
    }

    fn resolve_one(
        &self,
        explicit: &Option<PathBuf>,
        name: &str,
        progress: Option<fn(u64, u64)>,
    ) -> Result<PathBuf, SettingsError> {
        if let Some(path) = explicit {
            return Ok(path.clone());
        }
        let progress: Option<ProgressFn> = progress.map(|f| Box::new(f) as ProgressFn);
        Ok(model_resolver::resolve(
            name,
            self.model_base_url.as_deref(),
            self.model_dir.as_deref(),
            progress,
        )?)
    }
}
