pub mod gesture_stabilizer;
pub mod liveness_tracker;
