use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::classification::domain::classifier::Classifier;
use crate::shared::constants::{
    SINGLE_HAND_FEATURES, SINGLE_HAND_MODEL_NAME, TWO_HANDS_MODEL_NAME, TWO_HAND_FEATURES,
};
use crate::shared::gesture::GestureLabel;

use super::onnx_classifier::OnnxClassifier;

#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("failed to read class vocabulary {path}: {source}")]
    ReadClasses {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid class vocabulary {path}: {source}")]
    ParseClasses {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("class vocabulary {0} is empty")]
    EmptyClasses(PathBuf),
    #[error("failed to load model {path}: {source}")]
    Session {
        path: PathBuf,
        #[source]
        source: ort::Error,
    },
    #[error("could not determine model directory")]
    NoModelDir,
}

/// Trained classifiers found at startup. Either may be absent.
#[derive(Default)]
pub struct LoadedModels {
    pub single_hand: Option<Box<dyn Classifier>>,
    pub two_hands: Option<Box<dyn Classifier>>,
}

/// Platform-specific default model directory, e.g.
/// `~/.local/share/GestureLink/models/` on Linux.
pub fn default_model_dir() -> Result<PathBuf, ModelLoadError> {
    dirs::data_dir()
        .map(|d| d.join("GestureLink").join("models"))
        .ok_or(ModelLoadError::NoModelDir)
}

/// Sidecar listing the class vocabulary: `model.onnx` → `model.classes.json`.
pub fn classes_path(model_path: &Path) -> PathBuf {
    model_path.with_extension("classes.json")
}

/// Reads a JSON array of class names.
pub fn read_classes(path: &Path) -> Result<Vec<GestureLabel>, ModelLoadError> {
    let json = fs::read_to_string(path).map_err(|e| ModelLoadError::ReadClasses {
        path: path.to_path_buf(),
        source: e,
    })?;
    let classes: Vec<GestureLabel> =
        serde_json::from_str(&json).map_err(|e| ModelLoadError::ParseClasses {
            path: path.to_path_buf(),
            source: e,
        })?;
    if classes.is_empty() {
        return Err(ModelLoadError::EmptyClasses(path.to_path_buf()));
    }
    Ok(classes)
}

/// Loads one model with its vocabulary.
pub fn load_classifier(
    model_path: &Path,
    expected_features: usize,
) -> Result<OnnxClassifier, ModelLoadError> {
    let classes = read_classes(&classes_path(model_path))?;
    OnnxClassifier::new(model_path, classes, expected_features).map_err(|e| {
        ModelLoadError::Session {
            path: model_path.to_path_buf(),
            source: e,
        }
    })
}

/// Loads the single-hand and two-hand models from `dir`.
///
/// Never fails: a missing or broken artifact is logged once and the
/// corresponding slot stays empty, which routes classification to the
/// rule-based fallback.
pub fn load_models(dir: &Path) -> LoadedModels {
    LoadedModels {
        single_hand: load_optional(
            &dir.join(SINGLE_HAND_MODEL_NAME),
            SINGLE_HAND_FEATURES,
            "single-hand",
        ),
        two_hands: load_optional(
            &dir.join(TWO_HANDS_MODEL_NAME),
            TWO_HAND_FEATURES,
            "two-hand",
        ),
    }
}

fn load_optional(
    path: &Path,
    expected_features: usize,
    kind: &str,
) -> Option<Box<dyn Classifier>> {
    if !path.exists() {
        log::warn!("No {kind} model at {}; using rule-based fallback", path.display());
        return None;
    }
    match load_classifier(path, expected_features) {
        Ok(classifier) => {
            let names: Vec<&str> = classifier.classes().iter().map(|c| c.as_str()).collect();
            log::info!("Loaded {kind} model {} with classes {names:?}", path.display());
            Some(Box::new(classifier))
        }
        Err(e) => {
            log::warn!("Ignoring {kind} model: {e}");
            None
        }
    }
}
