// STFT module - Centered short-time Fourier analysis and synthesis
//
// Every frame-based computation in the crate goes through this module so that
// all feature families agree on one frame-count formula. Framing is centered:
// the signal is padded by `n_fft / 2` samples on each side before it is cut
// into windows, so frame `k` is centred on sample `k * hop` and a signal of
// `len` samples yields `1 + len / hop` frames.

use ndarray::Array2;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::fmt;
use std::sync::Arc;

/// How the signal is extended by `n_fft / 2` samples on each side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PadMode {
    /// Zeros
    #[default]
    Constant,
    /// Repeat the first/last sample
    Edge,
    /// Mirror around the first/last sample (without repeating it)
    Reflect,
}

/// Framing parameters that cannot produce a single frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramingError {
    ZeroWindow,
    ZeroHop,
    /// Padded signal is shorter than one window
    SignalTooShort { window: usize, padded: usize },
}

impl fmt::Display for FramingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FramingError::ZeroWindow => write!(f, "window length must be > 0"),
            FramingError::ZeroHop => write!(f, "hop length must be > 0"),
            FramingError::SignalTooShort { window, padded } => write!(
                f,
                "padded signal has {} samples, window needs {}",
                padded, window
            ),
        }
    }
}

impl std::error::Error for FramingError {}

/// Periodic Hann window (the DFT-even variant used for spectral analysis)
pub fn hann_window(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| 0.5 - 0.5 * ((2.0 * PI * i as f32) / len as f32).cos())
        .collect()
}

/// Centre frequency in Hz of each of the `n_fft / 2 + 1` real-FFT bins
pub fn fft_frequencies(sample_rate: u32, n_fft: usize) -> Vec<f32> {
    let bin_width = sample_rate as f32 / n_fft as f32;
    (0..=n_fft / 2).map(|k| k as f32 * bin_width).collect()
}

/// Number of centered frames for a signal of `len` samples
///
/// Equivalent to `1 + (len + 2 * (window / 2) - window) / hop`, which is
/// `1 + len / hop` for even windows.
pub fn centered_frame_count(len: usize, window: usize, hop: usize) -> usize {
    let padded = len + 2 * (window / 2);
    if hop == 0 || padded < window {
        return 0;
    }
    1 + (padded - window) / hop
}

/// Extend `signal` by `pad` samples on both sides
pub fn center_pad(signal: &[f32], pad: usize, mode: PadMode) -> Vec<f32> {
    let n = signal.len();
    let mut padded = Vec::with_capacity(n + 2 * pad);

    let sample_at = |offset: isize| -> f32 {
        if n == 0 {
            return 0.0;
        }
        if (0..n as isize).contains(&offset) {
            return signal[offset as usize];
        }
        match mode {
            PadMode::Constant => 0.0,
            PadMode::Edge => {
                if offset < 0 {
                    signal[0]
                } else {
                    signal[n - 1]
                }
            }
            PadMode::Reflect => {
                if n == 1 {
                    return signal[0];
                }
                let period = 2 * (n as isize - 1);
                let mut idx = offset.rem_euclid(period);
                if idx >= n as isize {
                    idx = period - idx;
                }
                signal[idx as usize]
            }
        }
    };

    for i in 0..(n + 2 * pad) {
        padded.push(sample_at(i as isize - pad as isize));
    }
    padded
}

/// Cut a signal into `window`-sample frames spaced `hop` apart
///
/// The signal is expected to be padded already; trailing samples that do not
/// fill a whole frame are dropped.
pub fn frames(signal: &[f32], window: usize, hop: usize) -> impl Iterator<Item = &[f32]> {
    let count = if hop == 0 || window == 0 || signal.len() < window {
        0
    } else {
        1 + (signal.len() - window) / hop
    };
    (0..count).map(move |i| &signal[i * hop..i * hop + window])
}

/// Short-time Fourier transform with a periodic Hann window
///
/// Spectrograms are laid out time-major: `(n_frames, n_fft / 2 + 1)`.
#[derive(Clone)]
pub struct Stft {
    n_fft: usize,
    hop: usize,
    pad_mode: PadMode,
    window: Vec<f32>,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
}

impl fmt::Debug for Stft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stft")
            .field("n_fft", &self.n_fft)
            .field("hop", &self.hop)
            .field("pad_mode", &self.pad_mode)
            .finish()
    }
}

impl Stft {
    /// Plan forward and inverse transforms for `n_fft`-point frames
    pub fn new(n_fft: usize, hop: usize, pad_mode: PadMode) -> Result<Self, FramingError> {
        if n_fft == 0 {
            return Err(FramingError::ZeroWindow);
        }
        if hop == 0 {
            return Err(FramingError::ZeroHop);
        }

        let mut planner = FftPlanner::new();
        Ok(Self {
            n_fft,
            hop,
            pad_mode,
            window: hann_window(n_fft),
            forward: planner.plan_fft_forward(n_fft),
            inverse: planner.plan_fft_inverse(n_fft),
        })
    }

    pub fn n_fft(&self) -> usize {
        self.n_fft
    }

    pub fn hop(&self) -> usize {
        self.hop
    }

    pub fn n_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Frame count this transform yields for a signal of `len` samples
    pub fn frame_count(&self, len: usize) -> usize {
        centered_frame_count(len, self.n_fft, self.hop)
    }

    /// Complex spectrogram, shape `(n_frames, n_bins)`
    pub fn forward(&self, signal: &[f32]) -> Result<Array2<Complex<f32>>, FramingError> {
        let padded = center_pad(signal, self.n_fft / 2, self.pad_mode);
        if padded.len() < self.n_fft {
            return Err(FramingError::SignalTooShort {
                window: self.n_fft,
                padded: padded.len(),
            });
        }

        let n_frames = 1 + (padded.len() - self.n_fft) / self.hop;
        let n_bins = self.n_bins();
        let mut spectrum = Array2::<Complex<f32>>::zeros((n_frames, n_bins));

        let mut scratch = vec![Complex::new(0.0, 0.0); self.forward.get_inplace_scratch_len()];
        let mut buffer = vec![Complex::new(0.0, 0.0); self.n_fft];

        for (frame_idx, frame) in frames(&padded, self.n_fft, self.hop).enumerate() {
            for ((slot, &sample), &w) in buffer.iter_mut().zip(frame).zip(&self.window) {
                *slot = Complex::new(sample * w, 0.0);
            }
            self.forward.process_with_scratch(&mut buffer, &mut scratch);
            for (k, value) in buffer.iter().take(n_bins).enumerate() {
                spectrum[[frame_idx, k]] = *value;
            }
        }

        Ok(spectrum)
    }

    /// Magnitude spectrogram `|X|`, shape `(n_frames, n_bins)`
    pub fn magnitude(&self, signal: &[f32]) -> Result<Array2<f32>, FramingError> {
        Ok(self.forward(signal)?.mapv(|c| c.norm()))
    }

    /// Power spectrogram `|X|^2`, shape `(n_frames, n_bins)`
    pub fn power(&self, signal: &[f32]) -> Result<Array2<f32>, FramingError> {
        Ok(self.forward(signal)?.mapv(|c| c.norm_sqr()))
    }

    /// Weighted overlap-add reconstruction of a spectrogram from [`Stft::forward`]
    ///
    /// The centre padding is removed and the result is cut or zero-filled to
    /// exactly `length` samples.
    pub fn inverse(&self, spectrum: &Array2<Complex<f32>>, length: usize) -> Vec<f32> {
        let (n_frames, n_bins) = spectrum.dim();
        let n_fft = self.n_fft;
        let expected_len = n_fft + self.hop * n_frames.saturating_sub(1);

        let mut signal = vec![0.0f32; expected_len];
        let mut window_sum = vec![0.0f32; expected_len];
        let mut scratch = vec![Complex::new(0.0, 0.0); self.inverse.get_inplace_scratch_len()];
        let mut buffer = vec![Complex::new(0.0, 0.0); n_fft];
        let scale = 1.0 / n_fft as f32;

        for frame_idx in 0..n_frames {
            // Rebuild the Hermitian-symmetric full spectrum
            buffer.fill(Complex::new(0.0, 0.0));
            for k in 0..n_bins.min(n_fft / 2 + 1) {
                let mut value = spectrum[[frame_idx, k]];
                if k == 0 || (n_fft % 2 == 0 && k == n_fft / 2) {
                    value.im = 0.0;
                }
                buffer[k] = value;
                if k > 0 && k < n_fft - k {
                    buffer[n_fft - k] = value.conj();
                }
            }
            self.inverse.process_with_scratch(&mut buffer, &mut scratch);

            let offset = frame_idx * self.hop;
            for (i, (value, &w)) in buffer.iter().zip(&self.window).enumerate() {
                signal[offset + i] += value.re * scale * w;
                window_sum[offset + i] += w * w;
            }
        }

        for (sample, &norm) in signal.iter_mut().zip(&window_sum) {
            if norm > f32::MIN_POSITIVE {
                *sample /= norm;
            }
        }

        let start = n_fft / 2;
        let mut output: Vec<f32> = signal.into_iter().skip(start).take(length).collect();
        output.resize(length, 0.0);
        output
    }
}
