use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::classification::domain::classifier_dispatch::{Classification, ClassifierDispatch};
use crate::shared::gesture::GestureLabel;
use crate::shared::observation::FrameObservation;
use crate::source::domain::keypoint_source::{KeypointSource, SourceError};
use crate::stabilization::domain::gesture_stabilizer::GestureStabilizer;
use crate::stabilization::domain::liveness_tracker::{LivenessEvent, LivenessTracker};
use crate::transport::domain::network_emitter::NetworkEmitter;

use super::session_stats::SessionStats;

/// What the frame loop decided for one frame.
#[derive(Clone, Debug)]
pub struct FrameReport {
    pub frame_index: usize,
    pub timestamp: Duration,
    pub hand_count: usize,
    pub classification: Classification,
    pub stable: GestureLabel,
    pub stable_changed: bool,
    pub liveness: Option<LivenessEvent>,
}

pub type FrameObserver = Box<dyn FnMut(&FrameReport) + Send>;

/// Runs the single-threaded frame loop: pull, classify, stabilize, emit.
///
/// The loop ends when the source is exhausted, the cancellation flag is
/// set, or the source fails. Components are dropped with the use case, which
/// closes the sockets and the source on every exit path.
pub struct TrackGesturesUseCase {
    source: Box<dyn KeypointSource>,
    dispatch: ClassifierDispatch,
    stabilizer: GestureStabilizer,
    liveness: LivenessTracker,
    emitter: NetworkEmitter,
    stats: SessionStats,
    on_frame: Option<FrameObserver>,
    cancelled: Arc<AtomicBool>,
    started: Instant,
    frame_index: usize,
}

impl TrackGesturesUseCase {
    pub fn new(
        source: Box<dyn KeypointSource>,
        dispatch: ClassifierDispatch,
        stabilizer: GestureStabilizer,
        liveness: LivenessTracker,
        emitter: NetworkEmitter,
        on_frame: Option<FrameObserver>,
        cancelled: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            source,
            dispatch,
            stabilizer,
            liveness,
            emitter,
            stats: SessionStats::new(),
            on_frame,
            cancelled: cancelled.unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
            started: Instant::now(),
            frame_index: 0,
        }
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn current_gesture(&self) -> &GestureLabel {
        self.stabilizer.current()
    }

    /// Handshakes, then processes frames until the source ends or the
    /// session is cancelled. A source failure stops the loop and is returned
    /// after the summary is logged.
    pub fn execute(&mut self) -> Result<(), SourceError> {
        self.started = Instant::now();
        self.emitter.handshake();

        let result = self.run_loop();

        self.stats
            .set_datagrams(self.emitter.sent(), self.emitter.dropped());
        self.stats.log_summary();
        if let Err(e) = &result {
            log::error!("Frame loop stopped: {e}");
        }
        result
    }

    fn run_loop(&mut self) -> Result<(), SourceError> {
        while !self.cancelled.load(Ordering::Relaxed) {
            let Some(frame) = self.source.next_frame()? else {
                log::info!("Keypoint stream ended");
                return Ok(());
            };
            let now = self.frame_time(&frame);
            self.process_frame(&frame, now);
        }
        log::info!("Tracking cancelled");
        Ok(())
    }

    /// Stream timestamp when present and valid, session clock otherwise.
    fn frame_time(&self, frame: &FrameObservation) -> Duration {
        frame
            .timestamp
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .unwrap_or_else(|| self.started.elapsed())
    }

    /// Runs one frame through dispatch, stabilization and emission.
    pub fn process_frame(&mut self, frame: &FrameObservation, now: Duration) -> FrameReport {
        let hand_count = frame.hand_count();

        let t = Instant::now();
        let classification = self.dispatch.classify(frame);
        self.stats.timing("dispatch", elapsed_ms(t));

        let t = Instant::now();
        let previous = self.stabilizer.current().clone();
        let stable = self
            .stabilizer
            .add_gesture(classification.label.clone(), now)
            .clone();
        let stable_changed = stable != previous;
        if stable_changed {
            self.stats.record_gesture_change();
        }
        let liveness = self.liveness.update(hand_count, now);
        if liveness == Some(LivenessEvent::HandLost) {
            self.stats.record_hand_lost();
        }
        self.stats.timing("stabilize", elapsed_ms(t));

        let t = Instant::now();
        self.emitter.emit_gesture(&stable, &classification);
        self.emitter.emit_positions(&frame.hands, now);
        if let Some(event) = liveness {
            self.emitter.emit_liveness(event);
        }
        self.stats.timing("emit", elapsed_ms(t));

        self.stats.record_frame(hand_count);
        let report = FrameReport {
            frame_index: self.frame_index,
            timestamp: now,
            hand_count,
            classification,
            stable,
            stable_changed,
            liveness,
        };
        self.frame_index += 1;

        if let Some(on_frame) = self.on_frame.as_mut() {
            on_frame(&report);
        }
        report
    }
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}
