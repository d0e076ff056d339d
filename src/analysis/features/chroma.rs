// Chroma module - Pitch-class energy profile
//
// The power spectrogram is folded onto `n_pitch_bins` pitch classes with a
// Gaussian-weighted chroma filterbank (Ellis 2007), optionally shifted by the
// estimated tuning deviation of the recording. Each frame is then scaled so
// its strongest pitch class is 1.0.
//
// References:
// - Ellis, D. (2007). Chroma feature analysis and synthesis
// - Smith, J.O. & Serra, X. (1987). PARSHL: quadratic interpolation of peaks

use ndarray::{Array2, ArrayView1};

use super::align::ensure_finite;
use super::types::FeatureFamily;
use crate::analysis::stft::Stft;
use crate::config::FeatureConfig;
use crate::error::FeatureExtractionError;

/// Lowest frequency considered by the tuning estimator
const TUNING_FMIN_HZ: f64 = 150.0;

/// Upper bound (exclusive) of the tuning estimator
const TUNING_FMAX_HZ: f64 = 4000.0;

/// Peaks below this fraction of the frame maximum are ignored
const PEAK_THRESHOLD: f64 = 0.1;

/// Tuning histogram resolution in fractions of a bin
const TUNING_RESOLUTION: f64 = 0.01;

/// Centre of the octave weighting, in octaves above C0-ish reference
const CENTER_OCTAVE: f64 = 5.0;

/// Gaussian half-width of the octave weighting, in octaves
const OCTAVE_WIDTH: f64 = 2.0;

/// Below this, a norm or denominator is treated as zero
const TINY: f64 = f32::MIN_POSITIVE as f64;

/// Octave number of a frequency relative to A440 / 16, shifted by `tuning`
/// fractions of a bin
pub fn hz_to_octs(hz: f64, tuning: f64, bins_per_octave: usize) -> f64 {
    let a440 = 440.0 * 2f64.powf(tuning / bins_per_octave as f64);
    (hz / (a440 / 16.0)).log2()
}

/// Chroma filterbank, shape `(n_chroma, n_fft / 2 + 1)`, rows starting at C
pub fn chroma_filterbank(sample_rate: u32, n_fft: usize, tuning: f64, n_chroma: usize) -> Array2<f32> {
    let n_bins = n_fft / 2 + 1;
    let n_chroma_f = n_chroma as f64;

    // Fractional chroma bin of every FFT bin; bin 0 (DC) is placed 1.5
    // octaves below bin 1
    let mut frqbins = vec![0.0f64; n_fft];
    for (j, slot) in frqbins.iter_mut().enumerate().skip(1) {
        let hz = j as f64 * sample_rate as f64 / n_fft as f64;
        *slot = n_chroma_f * hz_to_octs(hz, tuning, n_chroma);
    }
    if n_fft > 1 {
        frqbins[0] = frqbins[1] - 1.5 * n_chroma_f;
    }

    let binwidth: Vec<f64> = (0..n_fft)
        .map(|j| {
            if j + 1 < n_fft {
                (frqbins[j + 1] - frqbins[j]).max(1.0)
            } else {
                1.0
            }
        })
        .collect();

    let half = (n_chroma_f / 2.0).round_ties_even();
    let mut weights = Array2::<f64>::zeros((n_chroma, n_fft));
    for c in 0..n_chroma {
        for j in 0..n_fft {
            let d = (frqbins[j] - c as f64 + half + 10.0 * n_chroma_f).rem_euclid(n_chroma_f) - half;
            weights[[c, j]] = (-0.5 * (2.0 * d / binwidth[j]).powi(2)).exp();
        }
    }

    // Unit L2 norm per FFT bin, then emphasize the middle octaves
    for j in 0..n_fft {
        let norm = weights.column(j).iter().map(|w| w * w).sum::<f64>().sqrt();
        let octave_weight =
            (-0.5 * ((frqbins[j] / n_chroma_f - CENTER_OCTAVE) / OCTAVE_WIDTH).powi(2)).exp();
        let scale = if norm < TINY { 1.0 } else { 1.0 / norm };
        weights.column_mut(j).mapv_inplace(|w| w * scale * octave_weight);
    }

    // Rows above are indexed from A; rotate so row 0 is C
    let shift = 3 * (n_chroma / 12);
    Array2::from_shape_fn((n_chroma, n_bins), |(c, j)| {
        weights[[(c + shift) % n_chroma, j]] as f32
    })
}

/// Quadratically interpolated spectral peaks of one frame
///
/// Returns `(frequency_hz, magnitude)` for every local maximum inside
/// [150 Hz, 4 kHz) that exceeds 10% of the frame maximum.
fn frame_peaks(frame: ArrayView1<'_, f32>, sample_rate: u32, n_fft: usize) -> Vec<(f64, f64)> {
    let spectrum: Vec<f64> = frame.iter().map(|&v| v as f64).collect();
    let n = spectrum.len();
    if n < 3 {
        return Vec::new();
    }

    let fmax = TUNING_FMAX_HZ.min(sample_rate as f64 / 2.0);
    let bin_hz = sample_rate as f64 / n_fft as f64;
    let floor = PEAK_THRESHOLD * spectrum.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let gated: Vec<f64> = spectrum
        .iter()
        .map(|&s| if s > floor { s } else { 0.0 })
        .collect();

    let mut peaks = Vec::new();
    for k in 1..n {
        let freq = k as f64 * bin_hz;
        if freq < TUNING_FMIN_HZ || freq >= fmax {
            continue;
        }
        let next = if k + 1 < n { gated[k + 1] } else { gated[k] };
        if !(gated[k] > gated[k - 1] && gated[k] >= next) {
            continue;
        }

        // Parabolic interpolation; edge bins have no neighbours to fit
        let (avg, shift) = if k + 1 < n {
            let avg = 0.5 * (spectrum[k + 1] - spectrum[k - 1]);
            let curvature = 2.0 * spectrum[k] - spectrum[k + 1] - spectrum[k - 1];
            let denom = curvature + if curvature.abs() < TINY { 1.0 } else { 0.0 };
            (avg, avg / denom)
        } else {
            (0.0, 0.0)
        };

        let pitch = (k as f64 + shift) * bin_hz;
        let magnitude = spectrum[k] + 0.5 * avg * shift;
        peaks.push((pitch, magnitude));
    }
    peaks
}

fn median(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        0.5 * (values[mid - 1] + values[mid])
    } else {
        values[mid]
    }
}

/// Most common deviation of `frequencies` from the equal-tempered grid
///
/// # Returns
/// Tuning offset in fractions of a bin, in [-0.5, 0.5); 0.0 when there are
/// no positive frequencies
pub fn pitch_tuning(frequencies: &[f64], bins_per_octave: usize) -> f64 {
    let n_hist = (1.0 / TUNING_RESOLUTION).ceil() as usize;
    let mut counts = vec![0usize; n_hist];
    let mut any = false;

    for &hz in frequencies.iter().filter(|&&f| f > 0.0) {
        let mut residual = (bins_per_octave as f64 * hz_to_octs(hz, 0.0, bins_per_octave)).rem_euclid(1.0);
        if residual >= 0.5 {
            residual -= 1.0;
        }
        let idx = (((residual + 0.5) / TUNING_RESOLUTION).floor() as usize).min(n_hist - 1);
        counts[idx] += 1;
        any = true;
    }

    if !any {
        tracing::debug!("No pitched content for tuning estimation; assuming 0.0");
        return 0.0;
    }

    let best = counts
        .iter()
        .enumerate()
        .fold((0, 0), |acc, (i, &c)| if c > acc.1 { (i, c) } else { acc })
        .0;
    -0.5 + best as f64 * TUNING_RESOLUTION
}

/// Estimate the tuning deviation of a power spectrogram `(frames, bins)`
///
/// Peaks weaker than the median peak magnitude are discarded before the
/// histogram vote.
pub fn estimate_tuning(power: &Array2<f32>, sample_rate: u32, n_fft: usize, bins_per_octave: usize) -> f64 {
    let peaks: Vec<(f64, f64)> = power
        .rows()
        .into_iter()
        .flat_map(|frame| frame_peaks(frame, sample_rate, n_fft))
        .filter(|(pitch, _)| *pitch > 0.0)
        .collect();

    if peaks.is_empty() {
        return 0.0;
    }

    let mut magnitudes: Vec<f64> = peaks.iter().map(|(_, m)| *m).collect();
    let threshold = median(&mut magnitudes);
    let pitches: Vec<f64> = peaks
        .iter()
        .filter(|(_, m)| *m >= threshold)
        .map(|(p, _)| *p)
        .collect();

    pitch_tuning(&pitches, bins_per_octave)
}

/// Per-frame pitch-class energy, shape `(frames, n_pitch_bins)`
///
/// Each frame is divided by its maximum; silent frames stay zero. Not
/// z-score normalized.
pub fn pitch_class_profile(
    samples: &[f32],
    sample_rate: u32,
    config: &FeatureConfig,
) -> Result<Array2<f32>, FeatureExtractionError> {
    let family = FeatureFamily::PitchClass;
    if sample_rate == 0 {
        return Err(FeatureExtractionError::invalid(family, "sample rate is zero"));
    }
    if config.n_pitch_bins == 0 {
        return Err(FeatureExtractionError::invalid(family, "n_pitch_bins must be > 0"));
    }

    let stft = Stft::new(config.window_size, config.hop_size, config.pad_mode)
        .map_err(|err| FeatureExtractionError::invalid(family, err.to_string()))?;
    let power = stft
        .power(samples)
        .map_err(|err| FeatureExtractionError::invalid(family, err.to_string()))?;
    ensure_finite(family, &power)?;

    let tuning = if config.estimate_tuning {
        estimate_tuning(&power, sample_rate, config.window_size, config.n_pitch_bins)
    } else {
        0.0
    };
    tracing::debug!("Chroma tuning offset: {:.2} bins", tuning);

    let filterbank = chroma_filterbank(sample_rate, config.window_size, tuning, config.n_pitch_bins);
    let mut chroma = power.dot(&filterbank.t());

    for mut frame in chroma.rows_mut() {
        let peak = frame.iter().fold(0.0f32, |acc, v| acc.max(v.abs()));
        if (peak as f64) > TINY {
            frame.mapv_inplace(|v| v / peak);
        }
    }

    ensure_finite(family, &chroma)?;
    Ok(chroma)
}
