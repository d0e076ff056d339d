//! Sample-rate conversion
//!
//! Synchronous FFT resampling with rubato. Input is fed in fixed chunks, the
//! last one zero-padded, and extra silent chunks are pushed until the
//! resampler's output delay has been flushed. The result is trimmed to
//! `round(len * to / from)` samples.

use rubato::{FftFixedInOut, Resampler};

use crate::error::AudioError;

/// Input chunk size requested from the resampler
const CHUNK_SIZE: usize = 1024;

/// Convert mono `samples` from `from_rate` to `to_rate`
///
/// # Errors
/// `UnsupportedSampleRate` for a zero rate, `ResampleFailed` if rubato
/// rejects the ratio or a chunk.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, AudioError> {
    if from_rate == 0 || to_rate == 0 {
        return Err(AudioError::UnsupportedSampleRate {
            rate: from_rate.min(to_rate),
        });
    }
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let mut resampler =
        FftFixedInOut::<f32>::new(from_rate as usize, to_rate as usize, CHUNK_SIZE, 1).map_err(
            |err| AudioError::ResampleFailed {
                reason: format!("resampler init failed: {}", err),
            },
        )?;

    let expected_len = (samples.len() as f64 * to_rate as f64 / from_rate as f64).round() as usize;
    let delay = resampler.output_delay();
    let chunk_size = resampler.input_frames_max();

    let mut output = Vec::with_capacity(expected_len + delay + chunk_size);
    let mut chunks = samples.chunks(chunk_size);
    while output.len() < expected_len + delay {
        let mut padded = chunks.next().map(|chunk| chunk.to_vec()).unwrap_or_default();
        padded.resize(chunk_size, 0.0);

        let result = resampler
            .process(&[padded], None)
            .map_err(|err| AudioError::ResampleFailed {
                reason: err.to_string(),
            })?;
        output.extend_from_slice(&result[0]);
    }

    let mut resampled: Vec<f32> = output.into_iter().skip(delay).take(expected_len).collect();
    resampled.resize(expected_len, 0.0);
    tracing::debug!(
        "Resampled {} samples {} Hz -> {} samples {} Hz",
        samples.len(),
        from_rate,
        resampled.len(),
        to_rate
    );
    Ok(resampled)
}
