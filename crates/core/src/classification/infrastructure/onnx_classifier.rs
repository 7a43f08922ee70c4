use std::path::Path;

use ndarray::Array2;

use crate::classification::domain::classifier::{
    Classifier, ClassifierError, Prediction, Probabilities,
};
use crate::shared::gesture::GestureLabel;

/// Trained gesture classifier backed by an ONNX Runtime session.
///
/// Expects a classifier exported without a zip-map: output 0 holds the
/// predicted class index (`int64`), output 1 the probability row (`float32`)
/// aligned with the class vocabulary loaded alongside the model.
pub struct OnnxClassifier {
    session: ort::session::Session,
    classes: Vec<GestureLabel>,
    feature_len: usize,
}

impl OnnxClassifier {
    /// Load a model and bind it to `classes`.
    ///
    /// The feature length is read from the model's input shape (`[N, F]`),
    /// falling back to `expected_features` when the dimension is dynamic.
    pub fn new(
        model_path: &Path,
        classes: Vec<GestureLabel>,
        expected_features: usize,
    ) -> Result<Self, ort::Error> {
        let session = ort::session::Session::builder()?.commit_from_file(model_path)?;

        let feature_len = session
            .inputs()
            .first()
            .and_then(|input| {
                if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                    if shape.len() == 2 && shape[1] > 0 {
                        Some(shape[1] as usize)
                    } else {
                        None
                    }
                } else {
                    None
                }
            })
            .unwrap_or(expected_features);

        Ok(Self {
            session,
            classes,
            feature_len,
        })
    }

    pub fn classes(&self) -> &[GestureLabel] {
        &self.classes
    }

    fn infer(&mut self, features: &[f32]) -> Result<(i64, Vec<f32>), ClassifierError> {
        if features.len() != self.feature_len {
            return Err(ClassifierError::FeatureLength {
                expected: self.feature_len,
                actual: features.len(),
            });
        }

        let input = Array2::from_shape_vec((1, features.len()), features.to_vec())
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;
        let input_value = ort::value::Tensor::from_array(input)
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;
        let outputs = self
            .session
            .run(ort::inputs![input_value])
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;
        if outputs.len() < 2 {
            return Err(ClassifierError::MalformedOutput(format!(
                "expected label and probability outputs, got {}",
                outputs.len()
            )));
        }

        let labels = outputs[0]
            .try_extract_array::<i64>()
            .map_err(|e| ClassifierError::MalformedOutput(e.to_string()))?;
        let index = labels
            .iter()
            .next()
            .copied()
            .ok_or_else(|| ClassifierError::MalformedOutput("empty label output".into()))?;
        let probabilities = outputs[1]
            .try_extract_array::<f32>()
            .map_err(|e| ClassifierError::MalformedOutput(e.to_string()))?;
        let row = probabilities.iter().copied().collect();

        Ok((index, row))
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&mut self, features: &[f32]) -> Result<GestureLabel, ClassifierError> {
        let (index, _) = self.infer(features)?;
        label_for_index(&self.classes, index)
    }

    fn predict_probabilities(&mut self, features: &[f32]) -> Result<Probabilities, ClassifierError> {
        let (_, row) = self.infer(features)?;
        align_probabilities(&self.classes, &row)
    }

    /// One inference pass for both label and confidence.
    fn classify(&mut self, features: &[f32]) -> Result<Prediction, ClassifierError> {
        let (index, row) = self.infer(features)?;
        let label = label_for_index(&self.classes, index)?;
        let confidence = row.iter().copied().fold(0.0f32, f32::max) as f64;
        Ok(Prediction { label, confidence })
    }
}

fn label_for_index(classes: &[GestureLabel], index: i64) -> Result<GestureLabel, ClassifierError> {
    usize::try_from(index)
        .ok()
        .and_then(|i| classes.get(i))
        .cloned()
        .ok_or(ClassifierError::ClassIndex {
            index,
            classes: classes.len(),
        })
}

fn align_probabilities(
    classes: &[GestureLabel],
    row: &[f32],
) -> Result<Probabilities, ClassifierError> {
    if row.len() != classes.len() {
        return Err(ClassifierError::MalformedOutput(format!(
            "{} probabilities for {} classes",
            row.len(),
            classes.len()
        )));
    }
    Ok(classes
        .iter()
        .cloned()
        .zip(row.iter().map(|&p| p as f64))
        .collect())
}
