use std::time::Duration;

pub const DEFAULT_LOST_THRESHOLD: Duration = Duration::from_millis(500);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LivenessEvent {
    /// A hand is visible again after a lost event (or for the first time).
    HandFound,
    /// No hand has been seen for longer than the threshold.
    HandLost,
}

/// Hysteresis on hand absence, decoupled from the gesture signal.
///
/// `HandLost` fires once absence exceeds `threshold`, then at most once per
/// `repeat_interval` while absence continues. Any observed hand resets the
/// cooldown.
pub struct LivenessTracker {
    threshold: Duration,
    repeat_interval: Duration,
    last_hand_seen: Option<Duration>,
    /// First frame of the session, the absence baseline until a hand is seen.
    first_frame: Option<Duration>,
    last_fired: Option<Duration>,
    hand_present: bool,
}

impl LivenessTracker {
    pub fn new(threshold: Duration, repeat_interval: Duration) -> Self {
        Self {
            threshold,
            repeat_interval,
            last_hand_seen: None,
            first_frame: None,
            last_fired: None,
            hand_present: false,
        }
    }

    pub fn last_hand_seen(&self) -> Option<Duration> {
        self.last_hand_seen
    }

    pub fn hand_present(&self) -> bool {
        self.hand_present
    }

    pub fn update(&mut self, hand_count: usize, now: Duration) -> Option<LivenessEvent> {
        let first_frame = *self.first_frame.get_or_insert(now);
        if hand_count > 0 {
            self.last_hand_seen = Some(now);
            self.last_fired = None;
            if !self.hand_present {
                self.hand_present = true;
                return Some(LivenessEvent::HandFound);
            }
            return None;
        }

        let seen = self.last_hand_seen.unwrap_or(first_frame);
        if now.saturating_sub(seen) <= self.threshold {
            return None;
        }
        let cooled = self
            .last_fired
            .map_or(true, |fired| now.saturating_sub(fired) >= self.repeat_interval);
        if !cooled {
            return None;
        }

        self.last_fired = Some(now);
        self.hand_present = false;
        Some(LivenessEvent::HandLost)
    }
}

impl Default for LivenessTracker {
    fn default() -> Self {
        Self::new(DEFAULT_LOST_THRESHOLD, DEFAULT_LOST_THRESHOLD)
    }
}
