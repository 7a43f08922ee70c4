use std::fmt;

use serde::{Deserialize, Serialize};

pub const UNKNOWN: &str = "Unknown";

/// A gesture label from an open vocabulary.
///
/// Trained classifiers define their class names at load time, so labels are
/// strings rather than a closed enum. `Unknown` is the only label the
/// pipeline itself relies on.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GestureLabel(String);

impl GestureLabel {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn unknown() -> Self {
        Self(UNKNOWN.to_string())
    }

    pub fn is_unknown(&self) -> bool {
        self.0 == UNKNOWN
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for GestureLabel {
    fn default() -> Self {
        Self::unknown()
    }
}

impl fmt::Display for GestureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GestureLabel {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for GestureLabel {
    fn from(name: String) -> Self {
        Self(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unknown() {
        assert!(GestureLabel::default().is_unknown());
        assert_eq!(GestureLabel::default().as_str(), "Unknown");
    }

    #[test]
    fn test_labels_outside_builtin_set_are_accepted() {
        let label = GestureLabel::from("Wolf");
        assert!(!label.is_unknown());
        assert_eq!(label.to_string(), "Wolf");
    }

    #[test]
    fn test_unknown_is_case_sensitive() {
        assert!(!GestureLabel::from("unknown").is_unknown());
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let json = serde_json::to_string(&GestureLabel::from("Bird")).unwrap();
        assert_eq!(json, "\"Bird\"");
        let back: GestureLabel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, GestureLabel::from("Bird"));
    }
}
