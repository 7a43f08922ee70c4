use serde::{Deserialize, Serialize};

use crate::shared::constants::{HAND_LANDMARK_COUNT, WRIST};

/// Pixel dimensions of the capture frame the landmarks were measured in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// One keypoint: x/y normalized to the frame in [0, 1], z a relative depth.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
}

/// All landmarks of one detected hand in one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HandObservation {
    pub landmarks: Vec<Landmark>,
    pub handedness: Handedness,
    #[serde(default = "full_confidence")]
    pub confidence: f64,
}

fn full_confidence() -> f64 {
    1.0
}

impl HandObservation {
    pub fn new(landmarks: Vec<Landmark>, handedness: Handedness, confidence: f64) -> Self {
        Self {
            landmarks,
            handedness,
            confidence,
        }
    }

    /// Only complete hands may be classified or projected.
    pub fn is_complete(&self) -> bool {
        self.landmarks.len() == HAND_LANDMARK_COUNT
    }

    /// Landmarks scaled to pixel coordinates of `size`.
    pub fn pixel_points(&self, size: FrameSize) -> Vec<(f64, f64)> {
        let (w, h) = (size.width as f64, size.height as f64);
        self.landmarks.iter().map(|l| (l.x * w, l.y * h)).collect()
    }

    /// Mean of all landmark positions, in normalized units.
    pub fn centroid(&self) -> Option<(f64, f64)> {
        if self.landmarks.is_empty() {
            return None;
        }
        let n = self.landmarks.len() as f64;
        let (sx, sy) = self
            .landmarks
            .iter()
            .fold((0.0, 0.0), |(sx, sy), l| (sx + l.x, sy + l.y));
        Some((sx / n, sy / n))
    }

    /// Depth of the wrist landmark, used as the hand's z coordinate.
    pub fn wrist_depth(&self) -> f64 {
        self.landmarks.get(WRIST).map_or(0.0, |l| l.z)
    }
}

/// Zero or more hands captured at one tick, in detection order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameObservation {
    /// Seconds since the stream started; the session clock is used when absent.
    #[serde(default)]
    pub timestamp: Option<f64>,
    #[serde(default)]
    pub hands: Vec<HandObservation>,
}

impl FrameObservation {
    pub fn new(hands: Vec<HandObservation>) -> Self {
        Self {
            timestamp: None,
            hands,
        }
    }

    pub fn with_timestamp(mut self, seconds: f64) -> Self {
        self.timestamp = Some(seconds);
        self
    }

    pub fn hand_count(&self) -> usize {
        self.hands.len()
    }
}
