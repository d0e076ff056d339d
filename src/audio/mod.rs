// Audio module - decoding, resampling and cleanup of speech clips

pub mod decoder;
pub mod preprocess;
pub mod resample;
pub mod source;
pub mod synth;

// Re-export commonly used types for convenience
pub use preprocess::{
    fit_duration, normalize, suppress_noise, trim_silence, try_suppress_noise, try_trim_silence,
    LoadOutcome, OutcomeKind, Preprocessed, Preprocessor,
};
pub use source::{is_supported_extension, AudioSource, SUPPORTED_EXTENSIONS};
pub use synth::{synthesize_fallback, target_length};

/// Mono audio samples at a known sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds; 0.0 when the sample rate is unknown
    pub fn duration_seconds(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Largest absolute sample value
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }

    /// True when every sample is exactly zero (or there are none)
    pub fn is_silent(&self) -> bool {
        self.samples.iter().all(|&s| s == 0.0)
    }
}
