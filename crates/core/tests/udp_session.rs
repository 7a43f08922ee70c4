use std::io::Cursor;
use std::net::UdpSocket;
use std::time::Duration;

use gesture_link_core::classification::domain::classifier_dispatch::ClassifierDispatch;
use gesture_link_core::pipeline::track_gestures_use_case::TrackGesturesUseCase;
use gesture_link_core::shared::observation::{
    FrameObservation, FrameSize, HandObservation, Handedness, Landmark,
};
use gesture_link_core::source::infrastructure::json_lines_source::JsonLinesSource;
use gesture_link_core::stabilization::domain::gesture_stabilizer::GestureStabilizer;
use gesture_link_core::stabilization::domain::liveness_tracker::LivenessTracker;
use gesture_link_core::transport::domain::network_emitter::{EmitterConfig, NetworkEmitter};
use gesture_link_core::transport::domain::wire_message::WireMessage;
use gesture_link_core::transport::infrastructure::udp_sink::UdpSink;

/// Index finger raised above the wrist, all other tips below it.
fn pointing_hand() -> HandObservation {
    let mut landmarks = vec![Landmark::new(0.5, 0.8, 0.0); 21];
    landmarks[0] = Landmark::new(0.5, 0.6, -0.1);
    landmarks[4] = Landmark::new(0.1, 0.8, 0.0);
    landmarks[8] = Landmark::new(0.5, 0.2, 0.0);
    HandObservation::new(landmarks, Handedness::Left, 0.97)
}

fn keypoint_stream() -> String {
    let mut lines = Vec::new();
    for i in 0..10 {
        let frame = FrameObservation::new(vec![pointing_hand()]).with_timestamp(i as f64 * 0.05);
        lines.push(serde_json::to_string(&frame).unwrap());
    }
    for i in 10..30 {
        let frame = FrameObservation::new(vec![]).with_timestamp(i as f64 * 0.05);
        lines.push(serde_json::to_string(&frame).unwrap());
    }
    lines.join("\n")
}

fn receiver() -> UdpSocket {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket
        .set_read_timeout(Some(Duration::from_millis(500)))
        .unwrap();
    socket
}

fn drain(socket: &UdpSocket) -> Vec<WireMessage> {
    let mut buf = [0u8; 512];
    let mut messages = Vec::new();
    while let Ok((len, _)) = socket.recv_from(&mut buf) {
        let text = std::str::from_utf8(&buf[..len]).unwrap();
        messages.push(WireMessage::parse(text).unwrap());
    }
    messages
}

#[test]
fn test_session_over_loopback() {
    let gestures = receiver();
    let positions = receiver();
    let size = FrameSize::new(640, 480);

    let emitter = NetworkEmitter::new(
        Box::new(UdpSink::connect("127.0.0.1", gestures.local_addr().unwrap().port()).unwrap()),
        Box::new(UdpSink::connect("127.0.0.1", positions.local_addr().unwrap().port()).unwrap()),
        EmitterConfig::default(),
    );
    let source = JsonLinesSource::new(Cursor::new(keypoint_stream().into_bytes()));

    let mut use_case = TrackGesturesUseCase::new(
        Box::new(source),
        ClassifierDispatch::new(None, None, size, size),
        GestureStabilizer::default(),
        LivenessTracker::default(),
        emitter,
        None,
        None,
    );
    use_case.execute().unwrap();
    assert_eq!(use_case.stats().frames(), 30);
    drop(use_case);

    let gesture_messages = drain(&gestures);
    let labels: Vec<String> = gesture_messages
        .iter()
        .filter_map(|m| match m {
            WireMessage::Gesture(label) => Some(label.to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(labels, ["Point", "Unknown"]);
    assert!(gesture_messages.contains(&WireMessage::HandDetectionStatus(true)));
    assert!(gesture_messages.contains(&WireMessage::HandDetectionStatus(false)));

    let position_messages = drain(&positions);
    assert_eq!(position_messages[0], WireMessage::default_position());
    match &position_messages[1] {
        WireMessage::Position { hand_index, z, .. } => {
            assert_eq!(*hand_index, 0);
            assert!((z + 0.1).abs() < 1e-4);
        }
        other => panic!("expected a hand position, got {other:?}"),
    }
    assert_eq!(
        position_messages.last().unwrap(),
        &WireMessage::default_position()
    );
}
