//! Classification outcome types.
//!
//! A classification call has three caller-visible cases: a detected class, a
//! normal "nothing detected" result, and an error. The first two are modeled
//! here as [`ClassifyOutcome`]; errors travel separately as
//! [`crate::core::ClassifyError`], so callers never have to guess whether an
//! absent result means "no detection" or "something broke".

use serde::{Deserialize, Serialize};

/// Top-1 prediction for a single image.
///
/// Immutable once produced; either all fields are present or no
/// classification exists at all (see [`ClassifyOutcome::NoDetection`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Index of the predicted class in the model's output distribution.
    pub class_id: usize,
    /// Human-readable label for the predicted class.
    pub label: String,
    /// Confidence score in [0, 1].
    pub confidence: f32,
}

impl Classification {
    /// Creates a new classification result.
    pub fn new(class_id: usize, label: impl Into<String>, confidence: f32) -> Self {
        Self {
            class_id,
            label: label.into(),
            confidence,
        }
    }
}

impl std::fmt::Display for Classification {
    /// Renders the label with a two-decimal percent confidence, e.g.
    /// `daffodil (93.00%)`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({:.2}%)", self.label, self.confidence * 100.0)
    }
}

/// Outcome of a single classification call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClassifyOutcome {
    /// The model produced a ranked output; this is its top entry.
    Detected(Classification),
    /// The model produced no output. A normal result, not an error.
    NoDetection,
}

impl ClassifyOutcome {
    /// Returns the classification if one was detected.
    pub fn detected(&self) -> Option<&Classification> {
        match self {
            ClassifyOutcome::Detected(result) => Some(result),
            ClassifyOutcome::NoDetection => None,
        }
    }
}

impl std::fmt::Display for ClassifyOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassifyOutcome::Detected(result) => result.fmt(f),
            ClassifyOutcome::NoDetection => write!(f, "Unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detected_display_format() {
        let outcome = ClassifyOutcome::Detected(Classification::new(41, "daffodil", 0.93));
        assert_eq!(outcome.to_string(), "daffodil (93.00%)");
    }

    #[test]
    fn test_no_detection_displays_unknown() {
        assert_eq!(ClassifyOutcome::NoDetection.to_string(), "Unknown");
    }

    #[test]
    fn test_detected_accessor() {
        let outcome = ClassifyOutcome::Detected(Classification::new(0, "rose", 0.5));
        assert_eq!(outcome.detected().unwrap().label, "rose");
        assert!(ClassifyOutcome::NoDetection.detected().is_none());
    }

    #[test]
    fn test_outcome_json_round_trip() {
        let outcome = ClassifyOutcome::Detected(Classification::new(73, "rose", 0.87));
        let json = serde_json::to_string(&outcome).unwrap();
        let parsed: ClassifyOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, outcome);
    }
}
