use std::collections::HashMap;
use std::time::Instant;

/// Per-stage timings and event counters for one tracking session.
///
/// The frame loop records into it; the summary is logged once the session
/// drains.
pub struct SessionStats {
    timings: HashMap<String, Vec<f64>>,
    start_time: Instant,
    frames: usize,
    frames_with_hands: usize,
    gesture_changes: usize,
    hands_lost: usize,
    datagrams_sent: usize,
    datagrams_dropped: usize,
}

impl SessionStats {
    pub fn new() -> Self {
        Self {
            timings: HashMap::new(),
            start_time: Instant::now(),
            frames: 0,
            frames_with_hands: 0,
            gesture_changes: 0,
            hands_lost: 0,
            datagrams_sent: 0,
            datagrams_dropped: 0,
        }
    }

    /// Record how long a named stage took for one frame.
    pub fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    pub fn record_frame(&mut self, hand_count: usize) {
        self.frames += 1;
        if hand_count > 0 {
            self.frames_with_hands += 1;
        }
    }

    pub fn record_gesture_change(&mut self) {
        self.gesture_changes += 1;
    }

    pub fn record_hand_lost(&mut self) {
        self.hands_lost += 1;
    }

    pub fn set_datagrams(&mut self, sent: usize, dropped: usize) {
        self.datagrams_sent = sent;
        self.datagrams_dropped = dropped;
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn gesture_changes(&self) -> usize {
        self.gesture_changes
    }

    pub fn hands_lost(&self) -> usize {
        self.hands_lost
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    /// Returns the formatted summary, or `None` if no frame was processed.
    pub fn summary_string(&self) -> Option<String> {
        if self.frames == 0 {
            return None;
        }

        let elapsed = self.start_time.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "Session summary ({} frames, {} with hands, {elapsed:.1}s):",
            self.frames, self.frames_with_hands
        )];

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = total_ms / durations.len().max(1) as f64;
            lines.push(format!(
                "  {stage:10}: avg {avg_ms:6.2}ms  total {total_ms:7.0}ms"
            ));
        }

        lines.push(format!("  Gesture changes: {}", self.gesture_changes));
        lines.push(format!("  Hand lost events: {}", self.hands_lost));
        lines.push(format!(
            "  Datagrams: {} sent, {} dropped",
            self.datagrams_sent, self.datagrams_dropped
        ));
        if elapsed > 0.0 {
            lines.push(format!(
                "  Throughput: {:.1} fps",
                self.frames as f64 / elapsed
            ));
        }

        Some(lines.join("\n"))
    }

    pub fn log_summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}
