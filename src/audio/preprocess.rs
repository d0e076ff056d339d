// Preprocessor - raw audio source to a clean fixed-duration mono waveform
//
// Pipeline (fixed order):
// 1. Load: decode, mix to mono, resample; synthesize a fallback on failure
// 2. Fit duration: truncate or zero-pad to rate * duration samples
// 3. Trim silence: drop leading/trailing frames quieter than top_db
// 4. Suppress noise: zero STFT bins below the cutoff, resynthesize
// 5. Normalize: scale to unit peak
//
// The preprocessor never fails. Source errors become a LoadOutcome::Fallback
// and the cleanup stages degrade to identity when they cannot run.

use super::decoder::{decode_bytes, decode_file};
use super::resample::resample;
use super::source::AudioSource;
use super::synth::{synthesize_fallback, target_length};
use super::Waveform;
use crate::analysis::stft::{center_pad, fft_frequencies, frames, PadMode, Stft};
use crate::config::{PreprocessConfig, DEFAULT_DURATION_SECONDS, DEFAULT_SAMPLE_RATE};
use crate::error::{log_audio_error, AudioError};

/// Power floor for the silence detector's dB conversion
const TRIM_AMIN: f64 = 1e-10;

/// Whether a waveform came from the source or was synthesized
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Decoded,
    Fallback,
}

/// Result of loading a source at the target rate
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// Source decoded to a non-silent waveform
    Decoded(Waveform),
    /// Source unusable; `waveform` is the synthetic two-tone signal
    Fallback { waveform: Waveform, reason: AudioError },
}

impl LoadOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            LoadOutcome::Decoded(_) => OutcomeKind::Decoded,
            LoadOutcome::Fallback { .. } => OutcomeKind::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, LoadOutcome::Fallback { .. })
    }

    pub fn waveform(&self) -> &Waveform {
        match self {
            LoadOutcome::Decoded(waveform) | LoadOutcome::Fallback { waveform, .. } => waveform,
        }
    }

    /// Why the fallback was used, if it was
    pub fn reason(&self) -> Option<&AudioError> {
        match self {
            LoadOutcome::Decoded(_) => None,
            LoadOutcome::Fallback { reason, .. } => Some(reason),
        }
    }

    pub fn into_waveform(self) -> Waveform {
        match self {
            LoadOutcome::Decoded(waveform) | LoadOutcome::Fallback { waveform, .. } => waveform,
        }
    }
}

/// Output of the full preprocessing pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct Preprocessed {
    pub waveform: Waveform,
    pub outcome: OutcomeKind,
    /// Set when `outcome` is `Fallback`
    pub fallback_reason: Option<AudioError>,
}

impl Preprocessed {
    pub fn is_fallback(&self) -> bool {
        self.outcome == OutcomeKind::Fallback
    }
}

/// Decode `source` to mono at `target_rate`, or synthesize a fallback
///
/// Empty and all-zero results are treated like decode failures. The fallback
/// lasts `fallback_duration` seconds at `target_rate`.
pub fn load(source: &AudioSource, target_rate: u32, fallback_duration: f32) -> LoadOutcome {
    match decode_source(source, target_rate) {
        Ok(waveform) => LoadOutcome::Decoded(waveform),
        Err(reason) => {
            log_audio_error(
                &reason,
                &format!("load of {}, using synthetic fallback", source.describe()),
            );
            let samples = synthesize_fallback(target_rate, fallback_duration);
            LoadOutcome::Fallback {
                waveform: Waveform::new(samples, target_rate),
                reason,
            }
        }
    }
}

fn decode_source(source: &AudioSource, target_rate: u32) -> Result<Waveform, AudioError> {
    let native = match source {
        AudioSource::Path(path) => decode_file(path)?,
        AudioSource::Bytes {
            data,
            extension_hint,
        } => decode_bytes(data.clone(), extension_hint.as_deref())?,
        AudioSource::Samples {
            samples,
            sample_rate,
        } => {
            if *sample_rate == 0 {
                return Err(AudioError::UnsupportedSampleRate { rate: 0 });
            }
            Waveform::new(samples.clone(), *sample_rate)
        }
    };

    if native.is_empty() {
        return Err(AudioError::EmptySignal);
    }
    if native.samples.iter().any(|s| !s.is_finite()) {
        return Err(AudioError::DecodeFailed {
            reason: "source contains non-finite samples".to_string(),
        });
    }
    if native.is_silent() {
        return Err(AudioError::SilentSignal);
    }

    let samples = resample(&native.samples, native.sample_rate, target_rate)?;
    if samples.is_empty() {
        return Err(AudioError::EmptySignal);
    }
    Ok(Waveform::new(samples, target_rate))
}

/// Truncate or right-pad with zeros to exactly `floor(sample_rate * duration_seconds)` samples
pub fn fit_duration(samples: &[f32], sample_rate: u32, duration_seconds: f32) -> Vec<f32> {
    let target = target_length(sample_rate, duration_seconds);
    let mut fitted: Vec<f32> = samples.iter().take(target).copied().collect();
    fitted.resize(target, 0.0);
    fitted
}

/// Copy of the non-silent region, `samples[first * hop .. min(len, (last + 1) * hop)]`
///
/// Frame RMS is measured with centered, zero-padded framing and compared in
/// dB against the loudest frame. Frames above `-top_db` are kept.
pub fn try_trim_silence(
    samples: &[f32],
    top_db: f32,
    frame_length: usize,
    hop_length: usize,
) -> Result<Vec<f32>, AudioError> {
    if samples.is_empty() {
        return Err(AudioError::EmptySignal);
    }
    if frame_length == 0 || hop_length == 0 {
        return Err(AudioError::TransformFailed {
            reason: format!(
                "trim frame length ({}) and hop ({}) must be > 0",
                frame_length, hop_length
            ),
        });
    }

    let padded = center_pad(samples, frame_length / 2, PadMode::Constant);
    let mean_square: Vec<f64> = frames(&padded, frame_length, hop_length)
        .map(|frame| frame.iter().map(|&s| (s as f64).powi(2)).sum::<f64>() / frame_length as f64)
        .collect();
    if mean_square.is_empty() {
        return Err(AudioError::TransformFailed {
            reason: "no frames for silence detection".to_string(),
        });
    }

    let loudest = mean_square.iter().copied().fold(0.0f64, f64::max);
    let reference_db = 10.0 * loudest.max(TRIM_AMIN).log10();
    let threshold = -(top_db as f64);
    let is_loud = |ms: f64| 10.0 * ms.max(TRIM_AMIN).log10() - reference_db > threshold;

    let first = mean_square.iter().position(|&ms| is_loud(ms));
    let last = mean_square.iter().rposition(|&ms| is_loud(ms));
    let (first, last) = match (first, last) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(AudioError::SilentSignal),
    };

    let start = (first * hop_length).min(samples.len());
    let end = ((last + 1) * hop_length).min(samples.len());
    if start >= end {
        return Err(AudioError::SilentSignal);
    }
    Ok(samples[start..end].to_vec())
}

/// Best-effort silence trimming with 2048/512 framing
///
/// Returns the input unchanged if trimming cannot run or would leave nothing.
pub fn trim_silence(samples: &[f32], top_db: f32) -> Vec<f32> {
    let defaults = PreprocessConfig::default();
    best_effort(
        "trim_silence",
        samples,
        try_trim_silence(
            samples,
            top_db,
            defaults.trim_frame_length,
            defaults.trim_hop_length,
        ),
    )
}

/// High-pass the signal in the STFT domain
///
/// Every bin below `cutoff_hz` is zeroed and the signal is rebuilt by
/// weighted overlap-add at its original length.
pub fn try_suppress_noise(
    samples: &[f32],
    sample_rate: u32,
    cutoff_hz: f32,
    window_size: usize,
    hop_size: usize,
) -> Result<Vec<f32>, AudioError> {
    if sample_rate == 0 {
        return Err(AudioError::UnsupportedSampleRate { rate: 0 });
    }
    if samples.is_empty() {
        return Err(AudioError::EmptySignal);
    }

    let transform_failed = |reason: String| AudioError::TransformFailed { reason };
    let stft = Stft::new(window_size, hop_size, PadMode::Constant)
        .map_err(|err| transform_failed(err.to_string()))?;
    let mut spectrum = stft
        .forward(samples)
        .map_err(|err| transform_failed(err.to_string()))?;

    let stop_bins = fft_frequencies(sample_rate, window_size)
        .iter()
        .take_while(|&&f| f < cutoff_hz)
        .count();
    spectrum
        .slice_mut(ndarray::s![.., ..stop_bins])
        .fill(rustfft::num_complex::Complex::new(0.0, 0.0));

    let restored = stft.inverse(&spectrum, samples.len());
    if restored.iter().any(|s| !s.is_finite()) {
        return Err(transform_failed("inverse transform produced non-finite samples".to_string()));
    }
    Ok(restored)
}

/// Best-effort 70 Hz high-pass with 2048/512 framing
pub fn suppress_noise(samples: &[f32], sample_rate: u32) -> Vec<f32> {
    let defaults = PreprocessConfig::default();
    best_effort(
        "suppress_noise",
        samples,
        try_suppress_noise(
            samples,
            sample_rate,
            defaults.noise_cutoff_hz,
            defaults.noise_window_size,
            defaults.noise_hop_size,
        ),
    )
}

/// Scale to unit peak
///
/// An all-zero signal is returned unchanged and logged as a warning.
pub fn normalize(samples: &[f32]) -> Vec<f32> {
    let peak = samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    if !(peak > 0.0) || !peak.is_finite() {
        tracing::warn!(
            "[Preprocessor] Skipping normalization: signal peak is {} over {} samples",
            peak,
            samples.len()
        );
        return samples.to_vec();
    }
    samples.iter().map(|&s| s / peak).collect()
}

fn best_effort(stage: &str, input: &[f32], result: Result<Vec<f32>, AudioError>) -> Vec<f32> {
    match result {
        Ok(output) => output,
        Err(err) => {
            log_audio_error(&err, &format!("{}, stage skipped", stage));
            input.to_vec()
        }
    }
}

/// Preprocessor - produces the waveform fed to feature extraction
#[derive(Debug, Clone)]
pub struct Preprocessor {
    config: PreprocessConfig,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(PreprocessConfig::default())
    }
}

impl Preprocessor {
    /// Create a Preprocessor
    ///
    /// A zero sample rate or a non-positive duration is replaced by the
    /// contract default with a warning.
    pub fn new(mut config: PreprocessConfig) -> Self {
        if config.sample_rate == 0 {
            tracing::warn!(
                "[Preprocessor] Sample rate 0 is unusable, using {} Hz",
                DEFAULT_SAMPLE_RATE
            );
            config.sample_rate = DEFAULT_SAMPLE_RATE;
        }
        if let Some(duration) = config.duration_seconds {
            if !(duration.is_finite() && duration > 0.0) {
                tracing::warn!(
                    "[Preprocessor] Duration {} s is unusable, using {} s",
                    duration,
                    DEFAULT_DURATION_SECONDS
                );
                config.duration_seconds = Some(DEFAULT_DURATION_SECONDS);
            }
        }
        Self { config }
    }

    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    /// Load a source at the configured rate
    pub fn load(&self, source: &AudioSource) -> LoadOutcome {
        let fallback_duration = self
            .config
            .duration_seconds
            .unwrap_or(DEFAULT_DURATION_SECONDS);
        load(source, self.config.sample_rate, fallback_duration)
    }

    /// Silence trimming with the configured threshold and framing
    pub fn trim_silence(&self, samples: &[f32]) -> Vec<f32> {
        best_effort(
            "trim_silence",
            samples,
            try_trim_silence(
                samples,
                self.config.trim_top_db,
                self.config.trim_frame_length,
                self.config.trim_hop_length,
            ),
        )
    }

    /// Low-frequency suppression with the configured cutoff and framing
    pub fn suppress_noise(&self, samples: &[f32]) -> Vec<f32> {
        best_effort(
            "suppress_noise",
            samples,
            try_suppress_noise(
                samples,
                self.config.sample_rate,
                self.config.noise_cutoff_hz,
                self.config.noise_window_size,
                self.config.noise_hop_size,
            ),
        )
    }

    /// Run the full pipeline on one source
    pub fn process(&self, source: &AudioSource) -> Preprocessed {
        let outcome = self.load(source);
        let kind = outcome.kind();
        let fallback_reason = outcome.reason().cloned();
        let rate = self.config.sample_rate;

        let mut samples = outcome.into_waveform().samples;
        if let Some(duration) = self.config.duration_seconds {
            samples = fit_duration(&samples, rate, duration);
        }
        samples = self.trim_silence(&samples);
        samples = self.suppress_noise(&samples);
        samples = normalize(&samples);

        tracing::info!(
            "[Preprocessor] {} -> {} samples at {} Hz ({:?})",
            source.describe(),
            samples.len(),
            rate,
            kind
        );
        Preprocessed {
            waveform: Waveform::new(samples, rate),
            outcome: kind,
            fallback_reason,
        }
    }
}
