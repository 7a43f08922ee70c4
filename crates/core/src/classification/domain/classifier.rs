use thiserror::Error;

use crate::shared::gesture::GestureLabel;

/// Class probabilities aligned with the classifier's vocabulary.
pub type Probabilities = Vec<(GestureLabel, f64)>;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("expected {expected} features, got {actual}")]
    FeatureLength { expected: usize, actual: usize },
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("model output malformed: {0}")]
    MalformedOutput(String),
    #[error("predicted class index {index} outside vocabulary of {classes} classes")]
    ClassIndex { index: i64, classes: usize },
}

/// A label together with the probability the classifier assigned to it.
#[derive(Clone, Debug, PartialEq)]
pub struct Prediction {
    pub label: GestureLabel,
    pub confidence: f64,
}

/// Domain interface for gesture classification over a feature vector.
///
/// Inference backends may need exclusive access to their session while
/// running, hence `&mut self`; the model itself is never modified.
pub trait Classifier: Send {
    fn predict(&mut self, features: &[f32]) -> Result<GestureLabel, ClassifierError>;

    fn predict_probabilities(&mut self, features: &[f32]) -> Result<Probabilities, ClassifierError>;

    /// Label from `predict`, confidence as the max over `predict_probabilities`.
    ///
    /// Ties are left to `predict`; the label is never recomputed from the
    /// probabilities.
    fn classify(&mut self, features: &[f32]) -> Result<Prediction, ClassifierError> {
        let label = self.predict(features)?;
        let probabilities = self.predict_probabilities(features)?;
        Ok(Prediction {
            label,
            confidence: max_probability(&probabilities),
        })
    }
}

pub fn max_probability(probabilities: &Probabilities) -> f64 {
    probabilities
        .iter()
        .map(|(_, p)| *p)
        .fold(0.0, f64::max)
}
