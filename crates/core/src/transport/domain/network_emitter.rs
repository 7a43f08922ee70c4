use std::collections::HashMap;
use std::time::Duration;

use crate::classification::domain::classifier_dispatch::Classification;
use crate::shared::gesture::GestureLabel;
use crate::shared::observation::HandObservation;
use crate::stabilization::domain::liveness_tracker::LivenessEvent;
use crate::transport::domain::datagram_sink::DatagramSink;
use crate::transport::domain::wire_message::WireMessage;

pub const DEFAULT_POSITION_INTERVAL: Duration = Duration::from_millis(30);
pub const DEFAULT_POSITION_EPSILON: f64 = 0.01;

/// Rate and idempotence policy for each message class.
#[derive(Clone, Debug)]
pub struct EmitterConfig {
    /// Maximum age of a hand's last reported position.
    pub position_interval: Duration,
    /// Centroid movement, in normalized units, that triggers a report.
    pub position_epsilon: f64,
    /// Also send `<Label>|<x>|<y>|<confidence>` on every gesture change.
    pub emit_combined: bool,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            position_interval: DEFAULT_POSITION_INTERVAL,
            position_epsilon: DEFAULT_POSITION_EPSILON,
            emit_combined: false,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct ReportedPosition {
    x: f64,
    y: f64,
    sent_at: Duration,
}

/// Serializes pipeline decisions into datagrams on two channels.
///
/// The gesture channel carries gesture, combined and liveness messages; the
/// position channel carries hand positions. Send failures are logged and
/// swallowed.
pub struct NetworkEmitter {
    gesture_sink: Box<dyn DatagramSink>,
    position_sink: Box<dyn DatagramSink>,
    config: EmitterConfig,
    last_sent_gesture: Option<GestureLabel>,
    positions: HashMap<usize, ReportedPosition>,
    sent: usize,
    dropped: usize,
}

impl NetworkEmitter {
    pub fn new(
        gesture_sink: Box<dyn DatagramSink>,
        position_sink: Box<dyn DatagramSink>,
        config: EmitterConfig,
    ) -> Self {
        Self {
            gesture_sink,
            position_sink,
            config,
            last_sent_gesture: None,
            positions: HashMap::new(),
            sent: 0,
            dropped: 0,
        }
    }

    /// Sends one throwaway datagram per channel so unreachable hosts surface early.
    pub fn handshake(&mut self) {
        let gesture_ok = send(
            self.gesture_sink.as_mut(),
            &WireMessage::Handshake(GestureLabel::unknown()),
        );
        let position_ok = send(
            self.position_sink.as_mut(),
            &WireMessage::default_position(),
        );
        self.count(gesture_ok);
        self.count(position_ok);
        if gesture_ok && position_ok {
            log::info!(
                "Connected: gestures to {}, positions to {}",
                self.gesture_sink.destination(),
                self.position_sink.destination()
            );
        }
    }

    /// Sends `gesture|<label>` when `stable` differs from the last label
    /// actually delivered. Returns whether a datagram was sent.
    ///
    /// A failed send leaves the previous label in place so the transition is
    /// retried on the next frame.
    pub fn emit_gesture(&mut self, stable: &GestureLabel, latest: &Classification) -> bool {
        if self.last_sent_gesture.as_ref() == Some(stable) {
            return false;
        }

        let ok = send(
            self.gesture_sink.as_mut(),
            &WireMessage::Gesture(stable.clone()),
        );
        self.count(ok);
        if !ok {
            return false;
        }
        self.last_sent_gesture = Some(stable.clone());

        if self.config.emit_combined {
            let (x, y) = latest.position.unwrap_or((0.5, 0.5));
            let confidence = if latest.label == *stable {
                latest.confidence
            } else {
                0.0
            };
            let combined = WireMessage::Combined {
                label: stable.clone(),
                x,
                y,
                confidence,
            };
            let ok = send(self.gesture_sink.as_mut(), &combined);
            self.count(ok);
        }
        true
    }

    /// Reports each hand whose centroid moved beyond epsilon, whose last
    /// report is older than the position interval, or which is new.
    /// Returns the number of position datagrams sent.
    pub fn emit_positions(&mut self, hands: &[HandObservation], now: Duration) -> usize {
        let mut reported = 0;
        for (index, hand) in hands.iter().enumerate() {
            let Some((x, y)) = hand.centroid() else {
                continue;
            };
            let due = match self.positions.get(&index) {
                None => true,
                Some(last) => {
                    let moved = ((x - last.x).powi(2) + (y - last.y).powi(2)).sqrt();
                    moved > self.config.position_epsilon
                        || now.saturating_sub(last.sent_at) >= self.config.position_interval
                }
            };
            if !due {
                continue;
            }

            let message = WireMessage::Position {
                hand_index: index as i32,
                x,
                y,
                z: hand.wrist_depth(),
            };
            let ok = send(self.position_sink.as_mut(), &message);
            self.count(ok);
            if ok {
                self.positions.insert(index, ReportedPosition { x, y, sent_at: now });
                reported += 1;
            }
        }
        reported
    }

    /// `HandLost` sends absence status plus the default position;
    /// `HandFound` sends presence status.
    pub fn emit_liveness(&mut self, event: LivenessEvent) {
        match event {
            LivenessEvent::HandFound => {
                let ok = send(
                    self.gesture_sink.as_mut(),
                    &WireMessage::HandDetectionStatus(true),
                );
                self.count(ok);
            }
            LivenessEvent::HandLost => {
                self.positions.clear();
                let status_ok = send(
                    self.gesture_sink.as_mut(),
                    &WireMessage::HandDetectionStatus(false),
                );
                let position_ok = send(
                    self.position_sink.as_mut(),
                    &WireMessage::default_position(),
                );
                self.count(status_ok);
                self.count(position_ok);
            }
        }
    }

    pub fn sent(&self) -> usize {
        self.sent
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    fn count(&mut self, ok: bool) {
        if ok {
            self.sent += 1;
        } else {
            self.dropped += 1;
        }
    }
}

impl Drop for NetworkEmitter {
    fn drop(&mut self) {
        log::info!(
            "Disconnected from {} and {} ({} datagrams sent, {} dropped)",
            self.gesture_sink.destination(),
            self.position_sink.destination(),
            self.sent,
            self.dropped
        );
    }
}

fn send(sink: &mut dyn DatagramSink, message: &WireMessage) -> bool {
    match sink.send(&message.to_bytes()) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Failed to send {message:?} to {}: {e}", sink.destination());
            false
        }
    }
}
