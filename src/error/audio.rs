// Audio error types and constants

use crate::error::ErrorCode;
use log::warn;
use std::fmt;

/// Audio error code constants
///
/// Error code range: 1001-1008
pub struct AudioErrorCodes {}

impl AudioErrorCodes {
    /// Audio file missing or unreadable
    pub const SOURCE_UNAVAILABLE: i32 = 1001;

    /// Container or codec could not be decoded
    pub const DECODE_FAILED: i32 = 1002;

    /// Container holds no decodable audio track
    pub const NO_AUDIO_TRACK: i32 = 1003;

    /// Sample rate is zero or otherwise unusable
    pub const UNSUPPORTED_SAMPLE_RATE: i32 = 1004;

    /// Sample rate conversion failed
    pub const RESAMPLE_FAILED: i32 = 1005;

    /// Decoded signal contains no samples
    pub const EMPTY_SIGNAL: i32 = 1006;

    /// Decoded signal contains only zeros
    pub const SILENT_SIGNAL: i32 = 1007;

    /// Short-time transform or framing failed
    pub const TRANSFORM_FAILED: i32 = 1008;
}

/// Log an audio error with structured context
///
/// Audio errors never reach the caller of the preprocessor, so this is the
/// only trace they leave. Logged at warn level since the pipeline recovers.
pub fn log_audio_error(err: &AudioError, context: &str) {
    warn!(
        "Audio error in {}: code={}, component=Preprocessor, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Audio-related errors
///
/// These errors cover source lookup, decoding, resampling and the
/// best-effort cleanup transforms of the preprocessor.
///
/// Error code range: 1001-1008
#[derive(Debug, Clone, PartialEq)]
pub enum AudioError {
    /// File does not exist or could not be read
    SourceUnavailable { path: String, reason: String },

    /// Container probing or packet decoding failed
    DecodeFailed { reason: String },

    /// No track with a known codec was found
    NoAudioTrack,

    /// Sample rate is zero or missing from the stream
    UnsupportedSampleRate { rate: u32 },

    /// Resampler construction or processing failed
    ResampleFailed { reason: String },

    /// Signal has zero samples
    EmptySignal,

    /// Signal is entirely zero-valued
    SilentSignal,

    /// STFT/ISTFT or framing failed
    TransformFailed { reason: String },
}

impl ErrorCode for AudioError {
    fn code(&self) -> i32 {
        match self {
            AudioError::SourceUnavailable { .. } => AudioErrorCodes::SOURCE_UNAVAILABLE,
            AudioError::DecodeFailed { .. } => AudioErrorCodes::DECODE_FAILED,
            AudioError::NoAudioTrack => AudioErrorCodes::NO_AUDIO_TRACK,
            AudioError::UnsupportedSampleRate { .. } => AudioErrorCodes::UNSUPPORTED_SAMPLE_RATE,
            AudioError::ResampleFailed { .. } => AudioErrorCodes::RESAMPLE_FAILED,
            AudioError::EmptySignal => AudioErrorCodes::EMPTY_SIGNAL,
            AudioError::SilentSignal => AudioErrorCodes::SILENT_SIGNAL,
            AudioError::TransformFailed { .. } => AudioErrorCodes::TRANSFORM_FAILED,
        }
    }

    fn message(&self) -> String {
        match self {
            AudioError::SourceUnavailable { path, reason } => {
                format!("Audio source {} unavailable: {}", path, reason)
            }
            AudioError::DecodeFailed { reason } => format!("Could not decode audio: {}", reason),
            AudioError::NoAudioTrack => "No supported audio track found".to_string(),
            AudioError::UnsupportedSampleRate { rate } => {
                format!("Unsupported sample rate: {} Hz", rate)
            }
            AudioError::ResampleFailed { reason } => format!("Resampling failed: {}", reason),
            AudioError::EmptySignal => "Audio signal is empty".to_string(),
            AudioError::SilentSignal => "Audio signal is silent (all zeros)".to_string(),
            AudioError::TransformFailed { reason } => {
                format!("Short-time transform failed: {}", reason)
            }
        }
    }
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AudioError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for AudioError {}

impl From<std::io::Error> for AudioError {
    fn from(err: std::io::Error) -> Self {
        AudioError::DecodeFailed {
            reason: err.to_string(),
        }
    }
}

impl From<symphonia::core::errors::Error> for AudioError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        AudioError::DecodeFailed {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_error_codes() {
        assert_eq!(
            AudioError::SourceUnavailable {
                path: "a.wav".to_string(),
                reason: "missing".to_string()
            }
            .code(),
            1001
        );
        assert_eq!(
            AudioError::DecodeFailed {
                reason: "test".to_string()
            }
            .code(),
            1002
        );
        assert_eq!(AudioError::NoAudioTrack.code(), 1003);
        assert_eq!(AudioError::UnsupportedSampleRate { rate: 0 }.code(), 1004);
        assert_eq!(
            AudioError::ResampleFailed {
                reason: "test".to_string()
            }
            .code(),
            1005
        );
        assert_eq!(AudioError::EmptySignal.code(), 1006);
        assert_eq!(AudioError::SilentSignal.code(), 1007);
        assert_eq!(
            AudioError::TransformFailed {
                reason: "test".to_string()
            }
            .code(),
            1008
        );
    }

    #[test]
    fn test_audio_error_messages() {
        let err = AudioError::SourceUnavailable {
            path: "clip.wav".to_string(),
            reason: "not found".to_string(),
        };
        assert_eq!(err.message(), "Audio source clip.wav unavailable: not found");

        let err = AudioError::UnsupportedSampleRate { rate: 0 };
        assert_eq!(err.message(), "Unsupported sample rate: 0 Hz");

        assert!(AudioError::SilentSignal.message().contains("silent"));
    }

    #[test]
    fn test_audio_error_display() {
        let err = AudioError::EmptySignal;
        let display = format!("{}", err);
        assert!(display.contains("AudioError"));
        assert!(display.contains(&err.code().to_string()));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::other("truncated header");
        let audio_err: AudioError = io_err.into();
        match audio_err {
            AudioError::DecodeFailed { reason } => assert!(reason.contains("truncated header")),
            _ => panic!("Expected DecodeFailed"),
        }
    }
}
