//! Error types for landmark validation and gesture-table configuration.

use thiserror::Error;

/// A hand's landmark set violated the estimator contract.
///
/// Classification never runs on a hand that fails validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LandmarkError {
    #[error("expected {expected} landmarks, got {actual}")]
    WrongCount { expected: usize, actual: usize },

    #[error("landmark {index} has a non-finite coordinate")]
    NonFinite { index: usize },

    #[error("landmark {index} at ({x}, {y}) is outside the normalized [0, 1] range")]
    OutOfRange { index: usize, x: f32, y: f32 },
}

/// Gesture-table configuration could not be turned into a table.
#[derive(Error, Debug)]
pub enum TableError {
    #[error("invalid finger pattern {0:?}: expected five '0'/'1' characters, thumb first")]
    BadFingers(String),

    #[error("unknown action {0:?}: expected a single printable character, \"space\", \"backspace\" or \"enter\"")]
    UnknownAction(String),

    #[error("finger pattern {fingers} is assigned twice ({first:?} and {second:?})")]
    Duplicate { fingers: String, first: String, second: String },

    #[error("gesture table JSON: {0}")]
    Json(#[from] serde_json::Error),
}
