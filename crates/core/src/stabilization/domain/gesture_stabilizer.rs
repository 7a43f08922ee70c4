use std::collections::VecDeque;
use std::time::Duration;

use crate::shared::gesture::GestureLabel;

pub const DEFAULT_TIME_WINDOW: Duration = Duration::from_secs(1);
pub const DEFAULT_THRESHOLD: f64 = 0.9;

/// Sliding-window majority filter over raw per-frame labels.
///
/// The stable label only changes when one label holds at least `threshold`
/// of the entries inside the trailing `time_window`. Split votes keep the
/// previous stable label.
pub struct GestureStabilizer {
    time_window: Duration,
    threshold: f64,
    history: VecDeque<(Duration, GestureLabel)>,
    current: GestureLabel,
}

impl GestureStabilizer {
    pub fn new(time_window: Duration, threshold: f64) -> Self {
        Self {
            time_window,
            threshold,
            history: VecDeque::new(),
            current: GestureLabel::unknown(),
        }
    }

    pub fn current(&self) -> &GestureLabel {
        &self.current
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Records `label` observed at `timestamp` and returns the stable label.
    pub fn add_gesture(&mut self, label: GestureLabel, timestamp: Duration) -> &GestureLabel {
        self.history.push_back((timestamp, label));

        let cutoff = timestamp.saturating_sub(self.time_window);
        self.history.retain(|(t, _)| *t >= cutoff);

        let total = self.history.len();
        if total == 0 {
            return &self.current;
        }

        // Counted in first-appearance order so the winner is deterministic.
        let mut counts: Vec<(&GestureLabel, usize)> = Vec::new();
        for (_, label) in &self.history {
            match counts.iter_mut().find(|(l, _)| *l == label) {
                Some((_, n)) => *n += 1,
                None => counts.push((label, 1)),
            }
        }

        let dominant = counts
            .into_iter()
            .find(|(_, n)| *n as f64 / total as f64 >= self.threshold);
        if let Some((label, count)) = dominant {
            if *label != self.current {
                log::info!("Gesture stabilized as {label} ({count}/{total})");
                self.current = label.clone();
            }
        }
        &self.current
    }
}

impl Default for GestureStabilizer {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_WINDOW, DEFAULT_THRESHOLD)
    }
}
