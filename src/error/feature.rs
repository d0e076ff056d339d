// Feature extraction error types and constants

use crate::analysis::FeatureFamily;
use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Feature extraction error code constants
///
/// Error code range: 2001-2003
pub struct FeatureErrorCodes {}

impl FeatureErrorCodes {
    /// Extraction parameters are unusable for the family
    pub const INVALID_PARAMETERS: i32 = 2001;

    /// Family produced NaN or infinite values
    pub const NON_FINITE: i32 = 2002;

    /// Family row count disagrees with the alignment target
    pub const SHAPE_MISMATCH: i32 = 2003;
}

/// Log a feature extraction error with structured context
pub fn log_feature_error(err: &FeatureExtractionError, context: &str) {
    error!(
        "Feature error in {}: code={}, family={}, message={}",
        context,
        err.code(),
        err.family(),
        err.message()
    );
}

/// Errors raised while computing a feature family
///
/// Every variant names the family that failed so a caller can tell which
/// part of the feature matrix could not be produced.
///
/// Error code range: 2001-2003
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureExtractionError {
    /// Window, hop, sample rate or band count rejected
    InvalidParameters {
        family: FeatureFamily,
        reason: String,
    },

    /// A NaN or infinity appeared in the family output
    NonFinite { family: FeatureFamily, frame: usize },

    /// Row count differs from the alignment target
    ShapeMismatch {
        family: FeatureFamily,
        expected: usize,
        actual: usize,
    },
}

impl FeatureExtractionError {
    /// Family the failure belongs to
    pub fn family(&self) -> FeatureFamily {
        match self {
            FeatureExtractionError::InvalidParameters { family, .. }
            | FeatureExtractionError::NonFinite { family, .. }
            | FeatureExtractionError::ShapeMismatch { family, .. } => *family,
        }
    }

    pub(crate) fn invalid(family: FeatureFamily, reason: impl Into<String>) -> Self {
        FeatureExtractionError::InvalidParameters {
            family,
            reason: reason.into(),
        }
    }
}

impl ErrorCode for FeatureExtractionError {
    fn code(&self) -> i32 {
        match self {
            FeatureExtractionError::InvalidParameters { .. } => {
                FeatureErrorCodes::INVALID_PARAMETERS
            }
            FeatureExtractionError::NonFinite { .. } => FeatureErrorCodes::NON_FINITE,
            FeatureExtractionError::ShapeMismatch { .. } => FeatureErrorCodes::SHAPE_MISMATCH,
        }
    }

    fn message(&self) -> String {
        match self {
            FeatureExtractionError::InvalidParameters { family, reason } => {
                format!("Invalid parameters for {}: {}", family, reason)
            }
            FeatureExtractionError::NonFinite { family, frame } => {
                format!("{} produced a non-finite value at frame {}", family, frame)
            }
            FeatureExtractionError::ShapeMismatch {
                family,
                expected,
                actual,
            } => format!(
                "{} has {} frames, expected {} after alignment",
                family, actual, expected
            ),
        }
    }
}

impl fmt::Display for FeatureExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FeatureExtractionError (code {}): {}",
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for FeatureExtractionError {}
