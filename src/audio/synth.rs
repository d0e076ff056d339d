//! Deterministic fallback signal
//!
//! When no usable audio is available the preprocessor substitutes a two-tone
//! signal so feature extraction always sees non-degenerate input.

use std::f64::consts::PI;

/// Fundamental of the fallback signal in Hz
pub const FALLBACK_FUNDAMENTAL_HZ: f64 = 440.0;

/// Second tone of the fallback signal in Hz
pub const FALLBACK_OVERTONE_HZ: f64 = 880.0;

const FUNDAMENTAL_AMPLITUDE: f64 = 0.5;
const OVERTONE_AMPLITUDE: f64 = 0.1;

/// Sample count for `duration_seconds` at `sample_rate`: `floor(rate * duration)`
///
/// Negative or non-finite durations give 0.
pub fn target_length(sample_rate: u32, duration_seconds: f32) -> usize {
    let samples = (sample_rate as f64 * duration_seconds as f64).floor();
    if samples.is_finite() && samples > 0.0 {
        samples as usize
    } else {
        0
    }
}

/// Generate `0.5·sin(2π·440·t) + 0.1·sin(2π·880·t)` with `t = i / sample_rate`
///
/// Computed in f64 from the sample index alone, so identical arguments always
/// give bit-identical output.
///
/// # Arguments
/// * `sample_rate` - Sample rate in Hz
/// * `duration_seconds` - Signal length in seconds
pub fn synthesize_fallback(sample_rate: u32, duration_seconds: f32) -> Vec<f32> {
    let len = target_length(sample_rate, duration_seconds);
    let rate = sample_rate as f64;
    (0..len)
        .map(|i| {
            let t = i as f64 / rate;
            let value = FUNDAMENTAL_AMPLITUDE * (2.0 * PI * FALLBACK_FUNDAMENTAL_HZ * t).sin()
                + OVERTONE_AMPLITUDE * (2.0 * PI * FALLBACK_OVERTONE_HZ * t).sin();
            value as f32
        })
        .collect()
}
