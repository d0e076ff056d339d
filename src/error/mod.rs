// Error types for the speech feature pipeline
//
// The preprocessor and the feature extractor follow opposite failure policies:
// audio errors are absorbed (they become the reason attached to a synthetic
// fallback), feature errors are surfaced to the caller. Both carry stable
// numeric codes so calling layers can report them without string matching.

mod audio;
mod feature;

pub use audio::{log_audio_error, AudioError, AudioErrorCodes};
pub use feature::{log_feature_error, FeatureErrorCodes, FeatureExtractionError};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent reporting in the CLI
/// and in any service wrapping the pipeline.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::FeatureFamily;

    #[test]
    fn test_error_code_trait_objects() {
        let audio_err: &dyn ErrorCode = &AudioError::EmptySignal;
        assert_eq!(audio_err.code(), AudioErrorCodes::EMPTY_SIGNAL);

        let feature_err: &dyn ErrorCode = &FeatureExtractionError::NonFinite {
            family: FeatureFamily::PitchClass,
            frame: 3,
        };
        assert_eq!(feature_err.code(), FeatureErrorCodes::NON_FINITE);
    }

    #[test]
    fn test_code_ranges_do_not_overlap() {
        let audio_codes = [
            AudioErrorCodes::SOURCE_UNAVAILABLE,
            AudioErrorCodes::DECODE_FAILED,
            AudioErrorCodes::NO_AUDIO_TRACK,
            AudioErrorCodes::UNSUPPORTED_SAMPLE_RATE,
            AudioErrorCodes::RESAMPLE_FAILED,
            AudioErrorCodes::EMPTY_SIGNAL,
            AudioErrorCodes::SILENT_SIGNAL,
            AudioErrorCodes::TRANSFORM_FAILED,
        ];
        let feature_codes = [
            FeatureErrorCodes::INVALID_PARAMETERS,
            FeatureErrorCodes::NON_FINITE,
            FeatureErrorCodes::SHAPE_MISMATCH,
        ];

        assert!(audio_codes.iter().all(|c| (1001..2000).contains(c)));
        assert!(feature_codes.iter().all(|c| (2001..3000).contains(c)));
    }
}
