use thiserror::Error;

use crate::shared::observation::FrameObservation;

/// Failure to acquire a frame. Ends the frame loop.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to read keypoints: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed keypoint record on line {line}: {source}")]
    Malformed {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Blocking pull of hand keypoints, one frame at a time.
///
/// `Ok(None)` means the stream ended and the session should drain.
pub trait KeypointSource: Send {
    fn next_frame(&mut self) -> Result<Option<FrameObservation>, SourceError>;
}
