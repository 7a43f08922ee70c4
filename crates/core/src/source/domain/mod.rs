pub mod keypoint_source;
