//! Geometric fallback classifier over 21 pixel-space landmarks.
//!
//! A finger counts as raised when its tip is above the wrist (smaller y,
//! since image y grows downward). Always available, never fails.

use crate::classification::domain::classifier::{Classifier, ClassifierError, Probabilities};
use crate::classification::domain::feature_projector::FeatureProjector;
use crate::shared::constants::{
    HAND_LANDMARK_COUNT, INDEX_TIP, MIDDLE_TIP, PINKY_TIP, RING_TIP, THUMB_TIP, WRIST,
};
use crate::shared::gesture::GestureLabel;

/// Thumb-to-index tip distance, in pixels, below which the hand forms a circle.
pub const CIRCLE_DISTANCE_PX: f64 = 30.0;

pub const POINT: &str = "Point";
pub const PEACE: &str = "Peace";
pub const HAND: &str = "Hand";
pub const CIRCLE: &str = "Circle";

#[derive(Clone, Copy, Debug)]
pub struct RuleBasedClassifier {
    projector: FeatureProjector,
}

impl RuleBasedClassifier {
    /// `projector` decodes feature vectors back to pixels for the
    /// [`Classifier`] entry points.
    pub fn new(projector: FeatureProjector) -> Self {
        Self { projector }
    }

    /// Classifies pixel-space landmarks; fewer than 21 points yield `Unknown`.
    pub fn recognize(&self, points: &[(f64, f64)]) -> GestureLabel {
        if points.len() < HAND_LANDMARK_COUNT {
            return GestureLabel::unknown();
        }

        let wrist_y = points[WRIST].1;
        let is_up = |tip: usize| points[tip].1 < wrist_y;
        let index = is_up(INDEX_TIP);
        let middle = is_up(MIDDLE_TIP);
        let ring = is_up(RING_TIP);
        let pinky = is_up(PINKY_TIP);

        let name = match (index, middle, ring, pinky) {
            (true, false, false, false) => POINT,
            (true, true, false, false) => PEACE,
            (true, true, true, true) => HAND,
            _ if distance(points[THUMB_TIP], points[INDEX_TIP]) < CIRCLE_DISTANCE_PX => CIRCLE,
            _ => return GestureLabel::unknown(),
        };
        GestureLabel::from(name)
    }
}

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

impl Classifier for RuleBasedClassifier {
    fn predict(&mut self, features: &[f32]) -> Result<GestureLabel, ClassifierError> {
        Ok(self.recognize(&self.projector.unproject(features)))
    }

    /// The recognized label with certainty; rules carry no probability model.
    fn predict_probabilities(&mut self, features: &[f32]) -> Result<Probabilities, ClassifierError> {
        Ok(vec![(self.predict(features)?, 1.0)])
    }
}
