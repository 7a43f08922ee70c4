use crate::shared::constants::{HAND_LANDMARK_COUNT, SINGLE_HAND_FEATURES, TWO_HAND_FEATURES};
use crate::shared::observation::FrameSize;

/// Projects pixel-space landmarks into classifier feature vectors.
///
/// Each landmark becomes `(x / W, y / H, 0.0)` where `W × H` is the model's
/// input resolution. The depth channel is always zero because the models
/// were trained without depth.
#[derive(Clone, Copy, Debug)]
pub struct FeatureProjector {
    model_input: FrameSize,
}

impl FeatureProjector {
    pub fn new(model_input: FrameSize) -> Self {
        Self { model_input }
    }

    /// 63 features, or `None` unless exactly 21 points are given.
    pub fn project(&self, points: &[(f64, f64)]) -> Option<Vec<f32>> {
        if points.len() != HAND_LANDMARK_COUNT {
            return None;
        }
        let (w, h) = (self.model_input.width as f64, self.model_input.height as f64);
        let mut features = Vec::with_capacity(SINGLE_HAND_FEATURES);
        for &(x, y) in points {
            features.extend([(x / w) as f32, (y / h) as f32, 0.0]);
        }
        Some(features)
    }

    /// 126 features: first hand then second, in detection order.
    pub fn project_pair(&self, first: &[(f64, f64)], second: &[(f64, f64)]) -> Option<Vec<f32>> {
        let mut features = self.project(first)?;
        features.reserve(TWO_HAND_FEATURES - SINGLE_HAND_FEATURES);
        features.extend(self.project(second)?);
        Some(features)
    }

    /// Inverse of [`FeatureProjector::project`] for the x/y channels.
    pub fn unproject(&self, features: &[f32]) -> Vec<(f64, f64)> {
        let (w, h) = (self.model_input.width as f64, self.model_input.height as f64);
        features
            .chunks_exact(3)
            .map(|c| (c[0] as f64 * w, c[1] as f64 * h))
            .collect()
    }
}
