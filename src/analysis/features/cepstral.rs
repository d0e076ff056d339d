// Cepstral module - Mel-frequency cepstral coefficients
//
// Pipeline per frame:
// 1. Power spectrum from the shared centered STFT
// 2. Slaney-scale triangular mel filterbank with area normalization
// 3. Power to dB with a dynamic range floor
// 4. Orthonormal DCT-II, keeping the first n_cepstral coefficients
// 5. Each coefficient track z-scored across frames
//
// References:
// - Slaney, M. (1998). Auditory Toolbox, Technical Report #1998-010
// - Davis, S. & Mermelstein, P. (1980). Comparison of parametric representations
//   for monosyllabic word recognition

use ndarray::Array2;

use super::align::{ensure_finite, standardize_columns};
use super::types::FeatureFamily;
use crate::analysis::stft::Stft;
use crate::config::FeatureConfig;
use crate::error::FeatureExtractionError;

/// Power floor before taking the logarithm
const AMIN: f32 = 1e-10;

/// Linear region slope of the Slaney mel scale (Hz per mel)
const MEL_F_SP: f64 = 200.0 / 3.0;

/// Start of the logarithmic region of the Slaney mel scale
const MEL_MIN_LOG_HZ: f64 = 1000.0;

/// Convert Hz to Slaney mels (linear below 1 kHz, logarithmic above)
pub fn hz_to_mel(hz: f64) -> f64 {
    let min_log_mel = MEL_MIN_LOG_HZ / MEL_F_SP;
    let logstep = 6.4f64.ln() / 27.0;
    if hz >= MEL_MIN_LOG_HZ {
        min_log_mel + (hz / MEL_MIN_LOG_HZ).ln() / logstep
    } else {
        hz / MEL_F_SP
    }
}

/// Convert Slaney mels to Hz
pub fn mel_to_hz(mel: f64) -> f64 {
    let min_log_mel = MEL_MIN_LOG_HZ / MEL_F_SP;
    let logstep = 6.4f64.ln() / 27.0;
    if mel >= min_log_mel {
        MEL_MIN_LOG_HZ * (logstep * (mel - min_log_mel)).exp()
    } else {
        MEL_F_SP * mel
    }
}

/// Triangular mel filterbank, shape `(n_mels, n_fft / 2 + 1)`
///
/// Band edges are spaced evenly in mels between `fmin` and `fmax`; each
/// triangle is scaled by `2 / (upper_hz - lower_hz)` so bands have equal area.
pub fn mel_filterbank(
    sample_rate: u32,
    n_fft: usize,
    n_mels: usize,
    fmin: f64,
    fmax: f64,
) -> Array2<f32> {
    let n_bins = n_fft / 2 + 1;
    let fft_freqs: Vec<f64> = (0..n_bins)
        .map(|k| k as f64 * sample_rate as f64 / n_fft as f64)
        .collect();

    let mel_min = hz_to_mel(fmin);
    let mel_max = hz_to_mel(fmax);
    let mel_f: Vec<f64> = (0..n_mels + 2)
        .map(|i| mel_to_hz(mel_min + (mel_max - mel_min) * i as f64 / (n_mels + 1) as f64))
        .collect();

    let mut weights = Array2::<f32>::zeros((n_mels, n_bins));
    for m in 0..n_mels {
        let (lower, center, upper) = (mel_f[m], mel_f[m + 1], mel_f[m + 2]);
        let enorm = 2.0 / (upper - lower);
        for (k, &f) in fft_freqs.iter().enumerate() {
            let rising = (f - lower) / (center - lower);
            let falling = (upper - f) / (upper - center);
            let w = rising.min(falling).max(0.0);
            weights[[m, k]] = (w * enorm) as f32;
        }
    }
    weights
}

/// Convert a power spectrogram to dB (reference power 1.0)
///
/// With `top_db`, values are floored at `max - top_db`.
pub fn power_to_db(power: &Array2<f32>, top_db: Option<f32>) -> Array2<f32> {
    let mut db = power.mapv(|p| 10.0 * p.max(AMIN).log10());
    if let Some(range) = top_db {
        let peak = db.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let floor = peak - range;
        db.mapv_inplace(|v| v.max(floor));
    }
    db
}

/// Orthonormal DCT-II basis, shape `(n_out, n_in)`
pub fn dct_matrix(n_out: usize, n_in: usize) -> Array2<f32> {
    let n = n_in as f64;
    Array2::from_shape_fn((n_out, n_in), |(k, i)| {
        let scale = if k == 0 {
            (1.0 / n).sqrt()
        } else {
            (2.0 / n).sqrt()
        };
        let angle = std::f64::consts::PI * k as f64 * (2 * i + 1) as f64 / (2.0 * n);
        (scale * angle.cos()) as f32
    })
}

/// Z-scored cepstral coefficients, shape `(frames, n_cepstral)`
///
/// The frame count is the alignment target for every other family.
pub fn cepstral_coefficients(
    samples: &[f32],
    sample_rate: u32,
    config: &FeatureConfig,
) -> Result<Array2<f32>, FeatureExtractionError> {
    let family = FeatureFamily::Cepstral;
    if sample_rate == 0 {
        return Err(FeatureExtractionError::invalid(family, "sample rate is zero"));
    }
    if config.n_mels == 0 || config.n_cepstral == 0 {
        return Err(FeatureExtractionError::invalid(
            family,
            "n_mels and n_cepstral must be > 0",
        ));
    }
    if config.n_cepstral > config.n_mels {
        return Err(FeatureExtractionError::invalid(
            family,
            format!(
                "n_cepstral ({}) exceeds n_mels ({})",
                config.n_cepstral, config.n_mels
            ),
        ));
    }

    let stft = Stft::new(config.window_size, config.hop_size, config.pad_mode)
        .map_err(|err| FeatureExtractionError::invalid(family, err.to_string()))?;
    let power = stft
        .power(samples)
        .map_err(|err| FeatureExtractionError::invalid(family, err.to_string()))?;
    // dB flooring would hide NaN power, so check before it
    ensure_finite(family, &power)?;

    let filterbank = mel_filterbank(
        sample_rate,
        config.window_size,
        config.n_mels,
        0.0,
        sample_rate as f64 / 2.0,
    );
    let mel = power.dot(&filterbank.t());
    let log_mel = power_to_db(&mel, config.top_db);

    let basis = dct_matrix(config.n_cepstral, config.n_mels);
    let mut coefficients = log_mel.dot(&basis.t());
    ensure_finite(family, &coefficients)?;

    standardize_columns(&mut coefficients);
    tracing::debug!(
        "Cepstral coefficients: {} frames x {} coefficients",
        coefficients.nrows(),
        coefficients.ncols()
    );
    Ok(coefficients)
}
