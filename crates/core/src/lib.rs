//! Turns a stream of hand keypoints into a stable gesture signal and sends
//! it, with hand positions and liveness, to a downstream consumer over UDP.

pub mod classification;
pub mod pipeline;
pub mod shared;
pub mod source;
pub mod stabilization;
pub mod transport;
