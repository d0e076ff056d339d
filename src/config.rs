//! Configuration for the preprocessing and feature-extraction pipeline
//!
//! Defaults reproduce the fixed contract of the pipeline (22050 Hz, 3 s
//! clips, 2048/512 framing, 13 cepstral + 12 pitch-class channels). A JSON
//! file can override any subset of fields for experiments; missing fields
//! keep their defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::analysis::stft::PadMode;

/// Canonical sample rate of the pipeline in Hz
pub const DEFAULT_SAMPLE_RATE: u32 = 22_050;

/// Canonical clip duration in seconds
pub const DEFAULT_DURATION_SECONDS: f32 = 3.0;

/// Complete pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub preprocess: PreprocessConfig,
    pub features: FeatureConfig,
}

/// Preprocessor parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Target sample rate in Hz
    pub sample_rate: u32,
    /// Target duration in seconds; `None` disables duration fitting
    pub duration_seconds: Option<f32>,
    /// Frames quieter than this many dB below the loudest frame are trimmed
    pub trim_top_db: f32,
    /// RMS frame length for silence trimming
    pub trim_frame_length: usize,
    /// RMS hop length for silence trimming
    pub trim_hop_length: usize,
    /// STFT bins below this frequency are zeroed
    pub noise_cutoff_hz: f32,
    /// STFT window for noise suppression
    pub noise_window_size: usize,
    /// STFT hop for noise suppression
    pub noise_hop_size: usize,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            duration_seconds: Some(DEFAULT_DURATION_SECONDS),
            trim_top_db: 20.0,
            trim_frame_length: 2048,
            trim_hop_length: 512,
            noise_cutoff_hz: 70.0,
            noise_window_size: 2048,
            noise_hop_size: 512,
        }
    }
}

/// Feature extractor parameters
///
/// Every spectral family shares `window_size`, `hop_size` and `pad_mode`
/// so their native frame counts match the cepstral frame count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Cepstral coefficients per frame
    pub n_cepstral: usize,
    /// Mel bands feeding the cepstral transform
    pub n_mels: usize,
    /// STFT window size in samples
    pub window_size: usize,
    /// STFT hop size in samples
    pub hop_size: usize,
    /// Centre-padding mode for the STFT
    pub pad_mode: PadMode,
    /// Dynamic range floor of the log-mel spectrum in dB; `None` disables it
    pub top_db: Option<f32>,
    /// Fraction of frame magnitude below the rolloff frequency
    pub rolloff_percent: f32,
    /// Frame length for zero-crossing counting
    pub zcr_frame_length: usize,
    /// Pitch-class bins per octave
    pub n_pitch_bins: usize,
    /// Shift the chroma filterbank by the estimated tuning deviation
    pub estimate_tuning: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            n_cepstral: 13,
            n_mels: 128,
            window_size: 2048,
            hop_size: 512,
            pad_mode: PadMode::Constant,
            top_db: Some(80.0),
            rolloff_percent: 0.85,
            zcr_frame_length: 2048,
            n_pitch_bins: 12,
            estimate_tuning: true,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or the defaults if the file is missing or
    /// its JSON is invalid.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    tracing::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                tracing::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.preprocess.sample_rate, 22_050);
        assert_eq!(config.preprocess.duration_seconds, Some(3.0));
        assert_eq!(config.preprocess.noise_cutoff_hz, 70.0);
        assert_eq!(config.features.n_cepstral, 13);
        assert_eq!(config.features.window_size, 2048);
        assert_eq!(config.features.hop_size, 512);
        assert_eq!(config.features.n_pitch_bins, 12);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = PipelineConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let parsed: PipelineConfig =
            serde_json::from_str(r#"{"features": {"n_cepstral": 20}}"#).unwrap();
        assert_eq!(parsed.features.n_cepstral, 20);
        assert_eq!(parsed.features.hop_size, 512);
        assert_eq!(parsed.preprocess, PreprocessConfig::default());
    }

    #[test]
    fn test_null_duration_disables_fitting() {
        let parsed: PipelineConfig =
            serde_json::from_str(r#"{"preprocess": {"duration_seconds": null}}"#).unwrap();
        assert_eq!(parsed.preprocess.duration_seconds, None);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = PipelineConfig::load_from_file("/nonexistent/pipeline.json");
        assert_eq!(config, PipelineConfig::default());
    }
}
