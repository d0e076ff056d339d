// FeatureExtractor - Frame-level acoustic features for speech clips
//
// This module turns a preprocessed waveform into the fixed-layout tensor a
// classifier consumes. Four feature families are computed independently over
// the same centered framing, aligned to the cepstral frame count and joined
// along the channel axis.
//
// Module organization:
// - types: FeatureFamily, FeatureLayout, FeatureMatrix, ModelInput
// - cepstral: Mel filterbank, log compression, DCT (MFCC)
// - spectral: Centroid, bandwidth, rolloff
// - temporal: Zero-crossing rate
// - chroma: Pitch-class profile with tuning estimation
// - align: Standardization, alignment, concatenation, batching
// - mod.rs: Coordinator (FeatureExtractor)
//
// Column layout (defaults):
// [0:13) cepstral, [13:16) centroid/bandwidth/rolloff, [16:17) ZCR,
// [17:29) pitch classes

mod align;
mod cepstral;
mod chroma;
mod spectral;
mod temporal;
mod types;

pub use align::{align_to, batch, combine, standardize_columns, STANDARDIZE_EPSILON};
pub use cepstral::{cepstral_coefficients, dct_matrix, hz_to_mel, mel_filterbank, mel_to_hz, power_to_db};
pub use chroma::{chroma_filterbank, estimate_tuning, pitch_class_profile, pitch_tuning};
pub use spectral::{spectral_shape, SpectralFeatures};
pub use temporal::{zero_crossing_rate, TemporalFeatures};
pub use types::{
    FeatureFamily, FeatureLayout, FeatureMatrix, ModelInput, SPECTRAL_SHAPE_CHANNELS,
    ZERO_CROSSING_CHANNELS,
};

use crate::audio::Waveform;
use crate::config::FeatureConfig;
use crate::error::FeatureExtractionError;

/// FeatureExtractor coordinates the four feature families
///
/// Holds only configuration, so one extractor can be shared across threads
/// and reused for any number of clips.
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    config: FeatureConfig,
}

impl FeatureExtractor {
    /// Create a FeatureExtractor
    ///
    /// # Arguments
    /// * `config` - Framing and per-family parameters
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Column layout of the matrices this extractor produces
    pub fn layout(&self) -> FeatureLayout {
        FeatureLayout::new(self.config.n_cepstral, self.config.n_pitch_bins)
    }

    /// Z-scored cepstral coefficients, shape `(frames, n_cepstral)`
    pub fn cepstral_coefficients(
        &self,
        waveform: &Waveform,
    ) -> Result<ndarray::Array2<f32>, FeatureExtractionError> {
        cepstral_coefficients(&waveform.samples, waveform.sample_rate, &self.config)
    }

    /// Z-scored centroid, bandwidth and rolloff, shape `(frames, 3)`
    pub fn spectral_shape(
        &self,
        waveform: &Waveform,
    ) -> Result<ndarray::Array2<f32>, FeatureExtractionError> {
        spectral_shape(&waveform.samples, waveform.sample_rate, &self.config)
    }

    /// Raw zero-crossing rate, shape `(frames, 1)`
    pub fn zero_crossing_rate(
        &self,
        waveform: &Waveform,
    ) -> Result<ndarray::Array2<f32>, FeatureExtractionError> {
        zero_crossing_rate(&waveform.samples, &self.config)
    }

    /// Peak-scaled pitch-class energy, shape `(frames, n_pitch_bins)`
    pub fn pitch_class_profile(
        &self,
        waveform: &Waveform,
    ) -> Result<ndarray::Array2<f32>, FeatureExtractionError> {
        pitch_class_profile(&waveform.samples, waveform.sample_rate, &self.config)
    }

    /// Compute every family and join them into one FeatureMatrix
    ///
    /// This method coordinates the entire feature extraction pipeline:
    /// 1. Cepstral coefficients (defines the number of time steps)
    /// 2. Spectral shape, zero-crossing rate and pitch-class profile
    /// 3. Each family padded or truncated to the cepstral frame count
    /// 4. Concatenation in fixed column order
    ///
    /// # Errors
    /// The first family that fails aborts extraction; nothing is substituted.
    pub fn feature_matrix(&self, waveform: &Waveform) -> Result<FeatureMatrix, FeatureExtractionError> {
        let cepstral = self.cepstral_coefficients(waveform)?;
        let target = cepstral.nrows();

        let spectral = self.spectral_shape(waveform)?;
        let zero_crossing = self.zero_crossing_rate(waveform)?;
        let pitch_class = self.pitch_class_profile(waveform)?;

        for (family, frames) in [
            (FeatureFamily::SpectralShape, spectral.nrows()),
            (FeatureFamily::ZeroCrossing, zero_crossing.nrows()),
            (FeatureFamily::PitchClass, pitch_class.nrows()),
        ] {
            if frames != target {
                tracing::debug!(
                    "Aligning {} from {} to {} frames",
                    family,
                    frames,
                    target
                );
            }
        }

        combine(
            cepstral.view(),
            align_to(spectral.view(), target).view(),
            align_to(zero_crossing.view(), target).view(),
            align_to(pitch_class.view(), target).view(),
        )
    }

    /// Extract the batched model input, shape `(1, frames, channels)`
    pub fn extract(&self, waveform: &Waveform) -> Result<ModelInput, FeatureExtractionError> {
        let matrix = self.feature_matrix(waveform)?;
        let input = batch(matrix);
        let (_, time_steps, channels) = input.shape();
        tracing::info!(
            "Extracted features: {} time steps x {} channels",
            time_steps,
            channels
        );
        Ok(input)
    }
}
