pub mod session_stats;
pub mod track_gestures_use_case;
