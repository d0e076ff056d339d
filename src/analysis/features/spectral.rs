// Spectral module - Frequency-domain shape descriptors
//
// This module computes per-frame spectral centroid, bandwidth and rolloff
// from the magnitude spectrogram. Sums are accumulated in f64 because a
// 1025-bin frame of small magnitudes loses precision in f32.
//
// References:
// - Peeters, G. (2004). A large set of audio features for sound description
// - Lerch, A. (2012). An Introduction to Audio Content Analysis

use ndarray::{Array2, ArrayView1};

use super::align::{ensure_finite, standardize_columns};
use super::types::{FeatureFamily, SPECTRAL_SHAPE_CHANNELS};
use crate::analysis::stft::Stft;
use crate::config::FeatureConfig;
use crate::error::FeatureExtractionError;

/// Frames with less total magnitude than this are treated as silent
const SILENT_FRAME_MAGNITUDE: f64 = f32::MIN_POSITIVE as f64;

/// Per-frame spectral shape computation
pub struct SpectralFeatures {
    bin_frequencies: Vec<f64>,
    rolloff_percent: f64,
}

impl SpectralFeatures {
    /// Create a spectral shape processor
    ///
    /// # Arguments
    /// * `sample_rate` - Audio sample rate in Hz
    /// * `fft_size` - STFT window size
    /// * `rolloff_percent` - Magnitude fraction for the rolloff frequency
    pub fn new(sample_rate: u32, fft_size: usize, rolloff_percent: f32) -> Self {
        let bin_width = sample_rate as f64 / fft_size as f64;
        Self {
            bin_frequencies: (0..=fft_size / 2).map(|k| k as f64 * bin_width).collect(),
            rolloff_percent: rolloff_percent as f64,
        }
    }

    /// Compute spectral centroid (magnitude-weighted mean frequency)
    ///
    /// Formula: centroid = Σ(f_i × |X[i]|) / Σ|X[i]|
    ///
    /// # Returns
    /// Centroid in Hz, 0.0 for a silent frame
    pub fn compute_centroid(&self, spectrum: ArrayView1<'_, f32>) -> f64 {
        let total: f64 = spectrum.iter().map(|&m| m as f64).sum();
        if total <= SILENT_FRAME_MAGNITUDE {
            return 0.0;
        }

        let weighted: f64 = spectrum
            .iter()
            .zip(&self.bin_frequencies)
            .map(|(&m, &f)| f * m as f64)
            .sum();
        weighted / total
    }

    /// Compute spectral bandwidth around a given centroid
    ///
    /// Formula: bandwidth = sqrt(Σ (|X[i]| / Σ|X|) × (f_i - centroid)²)
    ///
    /// # Returns
    /// Bandwidth in Hz, 0.0 for a silent frame
    pub fn compute_bandwidth(&self, spectrum: ArrayView1<'_, f32>, centroid: f64) -> f64 {
        let total: f64 = spectrum.iter().map(|&m| m as f64).sum();
        if total <= SILENT_FRAME_MAGNITUDE {
            return 0.0;
        }

        spectrum
            .iter()
            .zip(&self.bin_frequencies)
            .map(|(&m, &f)| (m as f64 / total) * (f - centroid).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    /// Compute spectral rolloff
    ///
    /// Frequency of the first bin at which the cumulative magnitude reaches
    /// `rolloff_percent` of the frame total. A silent frame rolls off at 0 Hz.
    pub fn compute_rolloff(&self, spectrum: ArrayView1<'_, f32>) -> f64 {
        let total: f64 = spectrum.iter().map(|&m| m as f64).sum();
        let threshold = self.rolloff_percent * total;

        let mut cumulative = 0.0f64;
        for (&m, &f) in spectrum.iter().zip(&self.bin_frequencies) {
            cumulative += m as f64;
            if cumulative >= threshold {
                return f;
            }
        }
        self.bin_frequencies.last().copied().unwrap_or(0.0)
    }

    /// Centroid, bandwidth and rolloff for every frame of a magnitude spectrogram
    pub fn compute_frames(&self, magnitude: &Array2<f32>) -> Array2<f32> {
        let mut shape = Array2::<f32>::zeros((magnitude.nrows(), SPECTRAL_SHAPE_CHANNELS));
        for (frame, mut out) in magnitude.rows().into_iter().zip(shape.rows_mut()) {
            let centroid = self.compute_centroid(frame);
            out[0] = centroid as f32;
            out[1] = self.compute_bandwidth(frame, centroid) as f32;
            out[2] = self.compute_rolloff(frame) as f32;
        }
        shape
    }
}

/// Z-scored spectral shape tracks, shape `(frames, 3)`
///
/// Columns are centroid, bandwidth, rolloff; each is standardized on its own.
pub fn spectral_shape(
    samples: &[f32],
    sample_rate: u32,
    config: &FeatureConfig,
) -> Result<Array2<f32>, FeatureExtractionError> {
    let family = FeatureFamily::SpectralShape;
    if sample_rate == 0 {
        return Err(FeatureExtractionError::invalid(family, "sample rate is zero"));
    }
    if !(config.rolloff_percent > 0.0 && config.rolloff_percent < 1.0) {
        return Err(FeatureExtractionError::invalid(
            family,
            format!(
                "rolloff_percent must be in (0, 1), got {}",
                config.rolloff_percent
            ),
        ));
    }

    let stft = Stft::new(config.window_size, config.hop_size, config.pad_mode)
        .map_err(|err| FeatureExtractionError::invalid(family, err.to_string()))?;
    let magnitude = stft
        .magnitude(samples)
        .map_err(|err| FeatureExtractionError::invalid(family, err.to_string()))?;

    let processor = SpectralFeatures::new(sample_rate, config.window_size, config.rolloff_percent);
    let mut shape = processor.compute_frames(&magnitude);
    ensure_finite(family, &shape)?;
    standardize_columns(&mut shape);
    Ok(shape)
}
