//! Pipe-delimited UTF-8 text datagrams understood by the downstream consumer.
//!
//! No framing, checksum or sequence number: each datagram is one message and
//! receivers must tolerate loss, duplication and reordering.

use std::fmt;

use thiserror::Error;

use crate::shared::constants::NO_HAND_INDEX;
use crate::shared::gesture::GestureLabel;

pub const DELIMITER: char = '|';

const GESTURE_TAG: &str = "gesture";
const POSITION_TAG: &str = "position";
const STATUS_TAG: &str = "HandDetectionStatus";
const HANDSHAKE_TAG: &str = "test_gesture";

const RESERVED_TAGS: [&str; 4] = [GESTURE_TAG, POSITION_TAG, STATUS_TAG, HANDSHAKE_TAG];

#[derive(Error, Debug, PartialEq)]
pub enum WireError {
    #[error("empty datagram")]
    Empty,
    #[error("invalid {field} in {message:?}")]
    InvalidField { field: &'static str, message: String },
    #[error("unrecognized message {0:?}")]
    Unrecognized(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum WireMessage {
    /// `gesture|<Label>`
    Gesture(GestureLabel),
    /// `<Label>|<x>|<y>|<confidence>`
    Combined {
        label: GestureLabel,
        x: f64,
        y: f64,
        confidence: f64,
    },
    /// `position|<hand_index>|<x>|<y>|<z>`; index -1 is the no-hand default.
    Position { hand_index: i32, x: f64, y: f64, z: f64 },
    /// `HandDetectionStatus|True` / `HandDetectionStatus|False`
    HandDetectionStatus(bool),
    /// `test_gesture|<Label>`, sent once when the gesture channel opens.
    Handshake(GestureLabel),
}

impl WireMessage {
    /// Synthetic position reported while no hand is visible.
    pub fn default_position() -> Self {
        WireMessage::Position {
            hand_index: NO_HAND_INDEX,
            x: 0.5,
            y: 0.5,
            z: 0.0,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    pub fn parse(datagram: &str) -> Result<Self, WireError> {
        let datagram = datagram.trim();
        if datagram.is_empty() {
            return Err(WireError::Empty);
        }
        let parts: Vec<&str> = datagram.split(DELIMITER).collect();
        match parts.as_slice() {
            [GESTURE_TAG, label] => Ok(WireMessage::Gesture(GestureLabel::from(*label))),
            [HANDSHAKE_TAG, label] => Ok(WireMessage::Handshake(GestureLabel::from(*label))),
            [STATUS_TAG, status] => match *status {
                "True" => Ok(WireMessage::HandDetectionStatus(true)),
                "False" => Ok(WireMessage::HandDetectionStatus(false)),
                _ => Err(invalid("status", datagram)),
            },
            [POSITION_TAG, index, x, y, z] => Ok(WireMessage::Position {
                hand_index: index.parse().map_err(|_| invalid("hand_index", datagram))?,
                x: number(x, "x", datagram)?,
                y: number(y, "y", datagram)?,
                z: number(z, "z", datagram)?,
            }),
            [label, x, y, confidence] if !label.is_empty() && !RESERVED_TAGS.contains(label) => {
                Ok(WireMessage::Combined {
                    label: GestureLabel::from(*label),
                    x: number(x, "x", datagram)?,
                    y: number(y, "y", datagram)?,
                    confidence: number(confidence, "confidence", datagram)?,
                })
            }
            _ => Err(WireError::Unrecognized(datagram.to_string())),
        }
    }

    /// Gesture label carried by this message, if any.
    pub fn gesture(&self) -> Option<&GestureLabel> {
        match self {
            WireMessage::Gesture(label)
            | WireMessage::Handshake(label)
            | WireMessage::Combined { label, .. } => Some(label),
            _ => None,
        }
    }
}

fn invalid(field: &'static str, datagram: &str) -> WireError {
    WireError::InvalidField {
        field,
        message: datagram.to_string(),
    }
}

fn number(text: &str, field: &'static str, datagram: &str) -> Result<f64, WireError> {
    text.parse().map_err(|_| invalid(field, datagram))
}

impl fmt::Display for WireMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireMessage::Gesture(label) => write!(f, "{GESTURE_TAG}|{label}"),
            WireMessage::Combined {
                label,
                x,
                y,
                confidence,
            } => write!(f, "{label}|{x:.4}|{y:.4}|{confidence:.2}"),
            WireMessage::Position { hand_index, x, y, z } => {
                write!(f, "{POSITION_TAG}|{hand_index}|{x:.4}|{y:.4}|{z:.4}")
            }
            WireMessage::HandDetectionStatus(present) => {
                let value = if *present { "True" } else { "False" };
                write!(f, "{STATUS_TAG}|{value}")
            }
            WireMessage::Handshake(label) => write!(f, "{HANDSHAKE_TAG}|{label}"),
        }
    }
}
