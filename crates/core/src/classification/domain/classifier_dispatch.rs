use crate::classification::domain::classifier::{Classifier, Prediction};
use crate::classification::domain::feature_projector::FeatureProjector;
use crate::classification::domain::rule_based_classifier::RuleBasedClassifier;
use crate::shared::constants::{CONFIDENCE_FLOOR, OVERFIT_CONFIDENCE};
use crate::shared::gesture::GestureLabel;
use crate::shared::observation::{FrameObservation, FrameSize, HandObservation};

/// Which classifier produced a [`Classification`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClassificationSource {
    /// No hand was classified.
    None,
    TwoHands,
    SingleHand { hand_index: usize },
    RuleBased { hand_index: usize },
}

/// Outcome of classifying one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Classification {
    pub label: GestureLabel,
    pub confidence: f64,
    /// Normalized centroid of the hand(s) the label was taken from.
    pub position: Option<(f64, f64)>,
    pub source: ClassificationSource,
}

impl Classification {
    pub fn unknown() -> Self {
        Self {
            label: GestureLabel::unknown(),
            confidence: 0.0,
            position: None,
            source: ClassificationSource::None,
        }
    }
}

/// Selects the classifier per frame, gates trained predictions on confidence,
/// and falls back to the rule-based classifier.
///
/// Trained classifiers are optional: a missing model is a normal
/// configuration, not an error.
pub struct ClassifierDispatch {
    single_hand: Option<Box<dyn Classifier>>,
    two_hands: Option<Box<dyn Classifier>>,
    fallback: RuleBasedClassifier,
    projector: FeatureProjector,
    frame_size: FrameSize,
    confidence_floor: f64,
}

impl ClassifierDispatch {
    /// `frame_size` is the capture resolution the landmarks are normalized
    /// to; `model_input` the resolution the trained models expect.
    pub fn new(
        single_hand: Option<Box<dyn Classifier>>,
        two_hands: Option<Box<dyn Classifier>>,
        frame_size: FrameSize,
        model_input: FrameSize,
    ) -> Self {
        let projector = FeatureProjector::new(model_input);
        Self {
            single_hand,
            two_hands,
            fallback: RuleBasedClassifier::new(projector),
            projector,
            frame_size,
            confidence_floor: CONFIDENCE_FLOOR,
        }
    }

    pub fn with_confidence_floor(mut self, floor: f64) -> Self {
        self.confidence_floor = floor;
        self
    }

    pub fn has_single_hand_model(&self) -> bool {
        self.single_hand.is_some()
    }

    pub fn has_two_hands_model(&self) -> bool {
        self.two_hands.is_some()
    }

    pub fn classify(&mut self, frame: &FrameObservation) -> Classification {
        match frame.hands.as_slice() {
            [] => Classification::unknown(),
            [hand] => self.classify_single(hand, 0),
            [first, second, ..] => self.classify_pair(first, second),
        }
    }

    /// Trained single-hand model first, rule-based fallback otherwise.
    /// The fallback is not gated and always yields a label.
    fn classify_single(&mut self, hand: &HandObservation, hand_index: usize) -> Classification {
        if !hand.is_complete() {
            log::debug!(
                "Hand {hand_index} has {} landmarks, expected 21",
                hand.landmarks.len()
            );
            return Classification::unknown();
        }
        if let Some(prediction) = self.gated_single(hand, hand_index) {
            return Classification {
                label: prediction.label,
                confidence: prediction.confidence,
                position: hand.centroid(),
                source: ClassificationSource::SingleHand { hand_index },
            };
        }
        self.rule_based(hand, hand_index)
    }

    fn classify_pair(&mut self, first: &HandObservation, second: &HandObservation) -> Classification {
        if let Some(prediction) = self.gated_two_hands(first, second) {
            return Classification {
                label: prediction.label,
                confidence: prediction.confidence,
                position: mean_position(first, second),
                source: ClassificationSource::TwoHands,
            };
        }

        for (hand_index, hand) in [first, second].into_iter().enumerate() {
            if !hand.is_complete() {
                continue;
            }
            if self.single_hand.is_some() {
                if let Some(prediction) = self.gated_single(hand, hand_index) {
                    return Classification {
                        label: prediction.label,
                        confidence: prediction.confidence,
                        position: hand.centroid(),
                        source: ClassificationSource::SingleHand { hand_index },
                    };
                }
            } else {
                let result = self.rule_based(hand, hand_index);
                if !result.label.is_unknown() {
                    return result;
                }
            }
        }
        Classification::unknown()
    }

    fn gated_single(&mut self, hand: &HandObservation, hand_index: usize) -> Option<Prediction> {
        let features = self.projector.project(&hand.pixel_points(self.frame_size))?;
        let classifier = self.single_hand.as_deref_mut()?;
        let prediction = run_gated(classifier, &features, self.confidence_floor, "single-hand")?;
        log::debug!(
            "Hand {hand_index}: single-hand gesture {} ({:.2})",
            prediction.label,
            prediction.confidence
        );
        Some(prediction)
    }

    fn gated_two_hands(
        &mut self,
        first: &HandObservation,
        second: &HandObservation,
    ) -> Option<Prediction> {
        let classifier = self.two_hands.as_deref_mut()?;
        let Some(features) = self.projector.project_pair(
            &first.pixel_points(self.frame_size),
            &second.pixel_points(self.frame_size),
        ) else {
            log::debug!(
                "Two-hand attempt skipped: {} and {} landmarks",
                first.landmarks.len(),
                second.landmarks.len()
            );
            return None;
        };

        if log::log_enabled!(log::Level::Debug) {
            if let Ok(probabilities) = classifier.predict_probabilities(&features) {
                for (label, p) in &probabilities {
                    log::debug!("  {label}: {p:.4}");
                }
            }
        }

        let prediction = run_gated(classifier, &features, self.confidence_floor, "two-hand")?;
        if prediction.confidence > OVERFIT_CONFIDENCE {
            log::warn!(
                "Two-hand confidence {:.3} for {} is suspiciously high; model may be over-fit",
                prediction.confidence,
                prediction.label
            );
        }
        Some(prediction)
    }

    fn rule_based(&self, hand: &HandObservation, hand_index: usize) -> Classification {
        let label = self.fallback.recognize(&hand.pixel_points(self.frame_size));
        let confidence = if label.is_unknown() { 0.0 } else { 1.0 };
        Classification {
            label,
            confidence,
            position: hand.centroid(),
            source: ClassificationSource::RuleBased { hand_index },
        }
    }
}

/// Runs `classifier` and discards predictions below `floor`.
/// Inference errors are logged and treated as no prediction.
fn run_gated(
    classifier: &mut dyn Classifier,
    features: &[f32],
    floor: f64,
    kind: &str,
) -> Option<Prediction> {
    match classifier.classify(features) {
        Ok(prediction) if prediction.confidence >= floor => Some(prediction),
        Ok(prediction) => {
            log::debug!(
                "{kind} confidence too low: {} ({:.2})",
                prediction.label,
                prediction.confidence
            );
            None
        }
        Err(e) => {
            log::warn!("{kind} classification failed: {e}");
            None
        }
    }
}

fn mean_position(first: &HandObservation, second: &HandObservation) -> Option<(f64, f64)> {
    match (first.centroid(), second.centroid()) {
        (Some(a), Some(b)) => Some(((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0)),
        (a, b) => a.or(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::domain::classifier::{ClassifierError, Probabilities};
    use crate::shared::constants::{HAND_LANDMARK_COUNT, INDEX_TIP, MIDDLE_TIP, THUMB_TIP};
    use crate::shared::observation::{Handedness, Landmark};
    use approx::assert_relative_eq;
    use std::sync::{Arc, Mutex};

    /// Returns fixed output and records the feature lengths it was called with.
    struct FakeClassifier {
        label: &'static str,
        probabilities: Vec<(&'static str, f64)>,
        calls: Arc<Mutex<Vec<usize>>>,
        fail: bool,
    }

    impl FakeClassifier {
        fn new(label: &'static str, probabilities: Vec<(&'static str, f64)>) -> Self {
            Self {
                label,
                probabilities,
                calls: Arc::new(Mutex::new(Vec::new())),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new("Fox", vec![("Fox", 1.0)])
            }
        }
    }

    impl Classifier for FakeClassifier {
        fn predict(&mut self, features: &[f32]) -> Result<GestureLabel, ClassifierError> {
            self.calls.lock().unwrap().push(features.len());
            if self.fail {
                return Err(ClassifierError::Inference("boom".into()));
            }
            Ok(GestureLabel::from(self.label))
        }

        fn predict_probabilities(
            &mut self,
            _features: &[f32],
        ) -> Result<Probabilities, ClassifierError> {
            Ok(self
                .probabilities
                .iter()
                .map(|&(l, p)| (GestureLabel::from(l), p))
                .collect())
        }
    }

    /// Normalized hand: wrist at (0.5, 0.6), other points at y=0.8, thumb far.
    fn hand_with(raised: &[usize]) -> HandObservation {
        let mut landmarks = vec![Landmark::new(0.5, 0.8, 0.0); HAND_LANDMARK_COUNT];
        landmarks[0] = Landmark::new(0.5, 0.6, 0.0);
        landmarks[THUMB_TIP] = Landmark::new(0.1, 0.8, 0.0);
        for &tip in raised {
            landmarks[tip].y = 0.2;
        }
        HandObservation::new(landmarks, Handedness::Right, 0.9)
    }

    fn short_hand() -> HandObservation {
        HandObservation::new(vec![Landmark::new(0.5, 0.5, 0.0); 10], Handedness::Left, 0.9)
    }

    fn dispatch(
        single: Option<FakeClassifier>,
        two: Option<FakeClassifier>,
    ) -> ClassifierDispatch {
        let size = FrameSize::new(640, 480);
        ClassifierDispatch::new(
            single.map(|c| Box::new(c) as Box<dyn Classifier>),
            two.map(|c| Box::new(c) as Box<dyn Classifier>),
            size,
            size,
        )
    }

    #[test]
    fn test_no_hands_is_unknown_without_classifying() {
        let single = FakeClassifier::new("Fox", vec![("Fox", 1.0)]);
        let calls = single.calls.clone();
        let mut d = dispatch(Some(single), None);

        let result = d.classify(&FrameObservation::new(vec![]));

        assert_eq!(result, Classification::unknown());
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_single_hand_confident_model_wins() {
        let single = FakeClassifier::new("Deer", vec![("Deer", 0.8), ("Fox", 0.2)]);
        let calls = single.calls.clone();
        let mut d = dispatch(Some(single), None);

        let result = d.classify(&FrameObservation::new(vec![hand_with(&[INDEX_TIP])]));

        assert_eq!(result.label.as_str(), "Deer");
        assert_relative_eq!(result.confidence, 0.8);
        assert_eq!(result.source, ClassificationSource::SingleHand { hand_index: 0 });
        assert_eq!(*calls.lock().unwrap(), vec![63]);
    }

    #[test]
    fn test_low_confidence_falls_back_to_rules() {
        let single = FakeClassifier::new("Fox", vec![("Fox", 0.55), ("Bird", 0.45)]);
        let mut d = dispatch(Some(single), None);

        let result = d.classify(&FrameObservation::new(vec![hand_with(&[INDEX_TIP])]));

        assert_eq!(result.label.as_str(), "Point");
        assert_eq!(result.source, ClassificationSource::RuleBased { hand_index: 0 });
    }

    #[test]
    fn test_low_confidence_with_unrecognizable_hand_is_unknown() {
        let single = FakeClassifier::new("Fox", vec![("Fox", 0.55), ("Bird", 0.45)]);
        let mut d = dispatch(Some(single), None);

        let result = d.classify(&FrameObservation::new(vec![hand_with(&[])]));

        assert!(result.label.is_unknown());
        assert_ne!(result.label.as_str(), "Fox");
    }

    #[test]
    fn test_confidence_exactly_at_floor_is_accepted() {
        let single = FakeClassifier::new("Fox", vec![("Fox", 0.6), ("Bird", 0.4)]);
        let mut d = dispatch(Some(single), None);

        let result = d.classify(&FrameObservation::new(vec![hand_with(&[])]));

        assert_eq!(result.label.as_str(), "Fox");
    }

    #[test]
    fn test_without_models_uses_rules() {
        let mut d = dispatch(None, None);
        let result = d.classify(&FrameObservation::new(vec![hand_with(&[INDEX_TIP, MIDDLE_TIP])]));
        assert_eq!(result.label.as_str(), "Peace");
        let (x, _) = result.position.unwrap();
        assert!(x > 0.0 && x < 1.0);
    }

    #[test]
    fn test_inference_error_falls_back_to_rules() {
        let mut d = dispatch(Some(FakeClassifier::failing()), None);
        let result = d.classify(&FrameObservation::new(vec![hand_with(&[INDEX_TIP])]));
        assert_eq!(result.label.as_str(), "Point");
    }

    #[test]
    fn test_incomplete_single_hand_is_unknown() {
        let single = FakeClassifier::new("Fox", vec![("Fox", 1.0)]);
        let calls = single.calls.clone();
        let mut d = dispatch(Some(single), None);

        let result = d.classify(&FrameObservation::new(vec![short_hand()]));

        assert!(result.label.is_unknown());
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_two_hands_confident_model_wins() {
        let two = FakeClassifier::new("Bird", vec![("Bird", 0.9), ("Wolf", 0.1)]);
        let calls = two.calls.clone();
        let mut d = dispatch(None, Some(two));

        let result = d.classify(&FrameObservation::new(vec![hand_with(&[]), hand_with(&[])]));

        assert_eq!(result.label.as_str(), "Bird");
        assert_eq!(result.source, ClassificationSource::TwoHands);
        assert_eq!(*calls.lock().unwrap(), vec![126]);
    }

    #[test]
    fn test_two_hand_model_not_used_for_one_hand() {
        let two = FakeClassifier::new("Bird", vec![("Bird", 1.0)]);
        let calls = two.calls.clone();
        let mut d = dispatch(None, Some(two));

        d.classify(&FrameObservation::new(vec![hand_with(&[INDEX_TIP])]));

        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_low_two_hand_confidence_falls_back_per_hand() {
        let two = FakeClassifier::new("Bird", vec![("Bird", 0.5), ("Wolf", 0.5)]);
        let single = FakeClassifier::new("Deer", vec![("Deer", 0.7), ("Fox", 0.3)]);
        let mut d = dispatch(Some(single), Some(two));

        let first = hand_with(&[]);
        let mut second = hand_with(&[]);
        for l in &mut second.landmarks {
            l.x = 0.9;
        }
        let result = d.classify(&FrameObservation::new(vec![first.clone(), second]));

        assert_eq!(result.label.as_str(), "Deer");
        assert_eq!(result.source, ClassificationSource::SingleHand { hand_index: 0 });
        assert_eq!(result.position, first.centroid());
    }

    #[test]
    fn test_per_hand_fallback_skips_incomplete_first_hand() {
        let single = FakeClassifier::new("Deer", vec![("Deer", 0.7), ("Fox", 0.3)]);
        let mut d = dispatch(Some(single), None);

        let result = d.classify(&FrameObservation::new(vec![short_hand(), hand_with(&[])]));

        assert_eq!(result.label.as_str(), "Deer");
        assert_eq!(result.source, ClassificationSource::SingleHand { hand_index: 1 });
    }

    #[test]
    fn test_two_hands_both_gated_out_is_unknown() {
        let two = FakeClassifier::new("Bird", vec![("Bird", 0.5), ("Wolf", 0.5)]);
        let single = FakeClassifier::new("Fox", vec![("Fox", 0.55), ("Bird", 0.45)]);
        let mut d = dispatch(Some(single), Some(two));

        // Rules would say Point, but per-hand attempts use the trained gate only.
        let result = d.classify(&FrameObservation::new(vec![
            hand_with(&[INDEX_TIP]),
            hand_with(&[INDEX_TIP]),
        ]));

        assert!(result.label.is_unknown());
        assert_eq!(result.source, ClassificationSource::None);
    }

    #[test]
    fn test_two_hands_without_models_uses_first_recognized_hand() {
        let mut d = dispatch(None, None);

        let result = d.classify(&FrameObservation::new(vec![
            hand_with(&[]),
            hand_with(&[INDEX_TIP, MIDDLE_TIP]),
        ]));

        assert_eq!(result.label.as_str(), "Peace");
        assert_eq!(result.source, ClassificationSource::RuleBased { hand_index: 1 });
    }

    #[test]
    fn test_two_hand_position_is_mean_of_centroids() {
        let two = FakeClassifier::new("Bird", vec![("Bird", 0.95), ("Wolf", 0.05)]);
        let mut d = dispatch(None, Some(two));

        let mut left = hand_with(&[]);
        let mut right = hand_with(&[]);
        for l in &mut left.landmarks {
            l.x = 0.2;
        }
        for l in &mut right.landmarks {
            l.x = 0.6;
        }
        let result = d.classify(&FrameObservation::new(vec![left, right]));

        let (x, _) = result.position.unwrap();
        assert_relative_eq!(x, 0.4, epsilon = 1e-9);
    }

    #[test]
    fn test_custom_confidence_floor() {
        let single = FakeClassifier::new("Fox", vec![("Fox", 0.55), ("Bird", 0.45)]);
        let mut d = dispatch(Some(single), None).with_confidence_floor(0.5);

        let result = d.classify(&FrameObservation::new(vec![hand_with(&[])]));

        assert_eq!(result.label.as_str(), "Fox");
    }
}
