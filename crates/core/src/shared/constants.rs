/// Landmarks per detected hand.
pub const HAND_LANDMARK_COUNT: usize = 21;

/// Feature vector length for one hand: 21 × (x, y, depth).
pub const SINGLE_HAND_FEATURES: usize = HAND_LANDMARK_COUNT * 3;

/// Feature vector length for the two-hand classifier.
pub const TWO_HAND_FEATURES: usize = SINGLE_HAND_FEATURES * 2;

pub const WRIST: usize = 0;
pub const THUMB_TIP: usize = 4;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_TIP: usize = 12;
pub const RING_TIP: usize = 16;
pub const PINKY_TIP: usize = 20;

/// Fixed probability floor below which a trained prediction is discarded.
pub const CONFIDENCE_FLOOR: f64 = 0.6;

/// Two-hand confidences above this are logged as a possible over-fit.
pub const OVERFIT_CONFIDENCE: f64 = 0.99;

pub const SINGLE_HAND_MODEL_NAME: &str = "gesture_model_single_hand.onnx";
pub const TWO_HANDS_MODEL_NAME: &str = "gesture_model_two_hands.onnx";

/// Capture and model-input resolution the classifiers were trained against.
pub const DEFAULT_FRAME_WIDTH: u32 = 640;
pub const DEFAULT_FRAME_HEIGHT: u32 = 480;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_GESTURE_PORT: u16 = 8000;
pub const DEFAULT_POSITION_PORT: u16 = 5000;

/// Hand index reported with the synthetic "no hand" position.
pub const NO_HAND_INDEX: i32 = -1;
