// Temporal module - Time-domain feature extraction
//
// Zero-crossing rate computed frame by frame on the raw waveform. Framing is
// centered with edge padding so the frame count follows the same
// `1 + len / hop` rule as the spectral families.
//
// References:
// - Peeters, G. (2004). A large set of audio features for sound description

use ndarray::Array2;

use super::align::ensure_finite;
use super::types::{FeatureFamily, ZERO_CROSSING_CHANNELS};
use crate::analysis::stft::{center_pad, frames, PadMode};
use crate::config::FeatureConfig;
use crate::error::FeatureExtractionError;

/// Samples with magnitude at or below this count as exactly zero
const ZERO_THRESHOLD: f32 = 1e-10;

/// Zero-crossing computation on fixed-length frames
pub struct TemporalFeatures {
    frame_length: usize,
}

impl TemporalFeatures {
    /// # Arguments
    /// * `frame_length` - Samples per frame (also the ZCR denominator)
    pub fn new(frame_length: usize) -> Self {
        Self { frame_length }
    }

    /// Compute zero-crossing rate of one frame
    ///
    /// Near-zero samples are clamped to 0 and 0 counts as positive, so a
    /// crossing is any change of sign bit between neighbours. The count is
    /// divided by the frame length, not by the number of sample pairs.
    ///
    /// # Returns
    /// Zero-crossing rate in [0.0, 1.0), or NaN if the frame holds a
    /// non-finite sample
    pub fn compute_zcr(&self, frame: &[f32]) -> f32 {
        if frame.iter().any(|x| !x.is_finite()) {
            return f32::NAN;
        }
        if frame.len() < 2 || self.frame_length == 0 {
            return 0.0;
        }

        let negative = |x: f32| x < -ZERO_THRESHOLD;
        let crossings = frame
            .windows(2)
            .filter(|pair| negative(pair[0]) != negative(pair[1]))
            .count();

        crossings as f32 / self.frame_length as f32
    }
}

/// Per-frame zero-crossing rate, shape `(frames, 1)`, not standardized
///
/// Frames are `zcr_frame_length` samples wide and spaced `hop_size` apart.
pub fn zero_crossing_rate(
    samples: &[f32],
    config: &FeatureConfig,
) -> Result<Array2<f32>, FeatureExtractionError> {
    let family = FeatureFamily::ZeroCrossing;
    let frame_length = config.zcr_frame_length;
    let hop = config.hop_size;
    if frame_length == 0 || hop == 0 {
        return Err(FeatureExtractionError::invalid(
            family,
            format!("frame length ({}) and hop ({}) must be > 0", frame_length, hop),
        ));
    }

    let padded = center_pad(samples, frame_length / 2, PadMode::Edge);
    let processor = TemporalFeatures::new(frame_length);
    let rates: Vec<f32> = frames(&padded, frame_length, hop)
        .map(|frame| processor.compute_zcr(frame))
        .collect();

    let n_frames = rates.len();
    let zcr = Array2::from_shape_vec((n_frames, ZERO_CROSSING_CHANNELS), rates)
        .map_err(|err| FeatureExtractionError::invalid(family, err.to_string()))?;
    ensure_finite(family, &zcr)?;
    Ok(zcr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::stft::centered_frame_count;

    #[test]
    fn test_zcr_alternating_signal() {
        let processor = TemporalFeatures::new(8);
        let frame = [1.0, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0];
        // 7 crossings over a frame length of 8
        assert!((processor.compute_zcr(&frame) - 7.0 / 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_zcr_constant_and_silent() {
        let processor = TemporalFeatures::new(16);
        assert_eq!(processor.compute_zcr(&[0.5; 16]), 0.0);
        assert_eq!(processor.compute_zcr(&[0.0; 16]), 0.0);
        assert_eq!(processor.compute_zcr(&[0.3]), 0.0);
    }

    #[test]
    fn test_zcr_tiny_values_count_as_zero() {
        let processor = TemporalFeatures::new(4);
        // -1e-12 is clamped to 0, which is non-negative: no crossing
        assert_eq!(processor.compute_zcr(&[0.5, -1e-12, 0.5, 0.2]), 0.0);
        // 0 to negative is a crossing
        assert_eq!(processor.compute_zcr(&[0.0, -0.5, -0.5, -0.5]), 0.25);
    }

    #[test]
    fn test_zero_crossing_rate_frame_count_and_value() {
        let sample_rate = 22_050.0f32;
        let signal: Vec<f32> = (0..22_050)
            .map(|i| (2.0 * std::f32::consts::PI * 1000.0 * i as f32 / sample_rate).sin())
            .collect();

        let config = FeatureConfig::default();
        let zcr = zero_crossing_rate(&signal, &config).unwrap();
        assert_eq!(zcr.dim(), (centered_frame_count(signal.len(), 2048, 512), 1));

        // 1 kHz tone crosses zero 2000 times per second
        let expected = 2000.0 / sample_rate;
        let middle = zcr[[zcr.nrows() / 2, 0]];
        assert!((middle - expected).abs() < 0.01, "zcr {}", middle);
    }

    #[test]
    fn test_zero_crossing_rate_rejects_zero_hop() {
        let config = FeatureConfig {
            hop_size: 0,
            ..FeatureConfig::default()
        };
        assert!(zero_crossing_rate(&[0.0; 1024], &config).is_err());
    }

    #[test]
    fn test_zcr_nan_frame_is_not_finite() {
        let processor = TemporalFeatures::new(4);
        assert!(processor.compute_zcr(&[0.5, f32::NAN, 0.5, -0.5]).is_nan());
    }

    #[test]
    fn test_zero_crossing_rate_rejects_nan_sample() {
        let mut signal: Vec<f32> = (0..22_050)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 22_050.0).sin())
            .collect();
        signal[10_000] = f32::NAN;

        let err = zero_crossing_rate(&signal, &FeatureConfig::default()).unwrap_err();
        assert_eq!(
            err,
            FeatureExtractionError::NonFinite {
                family: FeatureFamily::ZeroCrossing,
                frame: 18,
            }
        );
    }
}
