pub mod classifier;
pub mod classifier_dispatch;
pub mod feature_projector;
pub mod rule_based_classifier;
