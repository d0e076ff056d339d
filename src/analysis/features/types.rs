// Types module - Data structures for extracted features
//
// A feature family is computed as a time-major `(frames, channels)` array.
// Families are aligned to the cepstral frame count and concatenated into a
// FeatureMatrix, which is then batched into the ModelInput handed to a
// classifier.

use ndarray::{Array2, Array3, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Number of spectral-shape channels (centroid, bandwidth, rolloff)
pub const SPECTRAL_SHAPE_CHANNELS: usize = 3;

/// Number of zero-crossing channels
pub const ZERO_CROSSING_CHANNELS: usize = 1;

/// The four feature families, in column order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureFamily {
    /// Mel-frequency cepstral coefficients
    Cepstral,
    /// Spectral centroid, bandwidth and rolloff
    SpectralShape,
    /// Zero-crossing rate
    ZeroCrossing,
    /// Chroma / pitch-class energy
    PitchClass,
}

impl FeatureFamily {
    /// All families in the order their columns appear in a FeatureMatrix
    pub const ALL: [FeatureFamily; 4] = [
        FeatureFamily::Cepstral,
        FeatureFamily::SpectralShape,
        FeatureFamily::ZeroCrossing,
        FeatureFamily::PitchClass,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FeatureFamily::Cepstral => "cepstral",
            FeatureFamily::SpectralShape => "spectral_shape",
            FeatureFamily::ZeroCrossing => "zero_crossing",
            FeatureFamily::PitchClass => "pitch_class",
        }
    }

    /// Whether the family is z-score normalized across time
    ///
    /// Zero-crossing rate and pitch-class energy stay in native units.
    pub fn is_standardized(&self) -> bool {
        matches!(self, FeatureFamily::Cepstral | FeatureFamily::SpectralShape)
    }
}

impl fmt::Display for FeatureFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Column layout of a FeatureMatrix
///
/// `[cepstral][centroid, bandwidth, rolloff][zcr][pitch classes]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureLayout {
    pub n_cepstral: usize,
    pub n_pitch_class: usize,
}

impl FeatureLayout {
    pub fn new(n_cepstral: usize, n_pitch_class: usize) -> Self {
        Self {
            n_cepstral,
            n_pitch_class,
        }
    }

    /// Number of channels contributed by `family`
    pub fn width(&self, family: FeatureFamily) -> usize {
        match family {
            FeatureFamily::Cepstral => self.n_cepstral,
            FeatureFamily::SpectralShape => SPECTRAL_SHAPE_CHANNELS,
            FeatureFamily::ZeroCrossing => ZERO_CROSSING_CHANNELS,
            FeatureFamily::PitchClass => self.n_pitch_class,
        }
    }

    /// Column range occupied by `family`
    pub fn columns(&self, family: FeatureFamily) -> Range<usize> {
        let start: usize = FeatureFamily::ALL
            .iter()
            .take_while(|f| **f != family)
            .map(|f| self.width(*f))
            .sum();
        start..start + self.width(family)
    }

    /// Total channel count
    pub fn n_channels(&self) -> usize {
        FeatureFamily::ALL.iter().map(|f| self.width(*f)).sum()
    }
}

/// Time-major feature matrix, shape `(time_steps, channels)`
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    data: Array2<f32>,
    layout: FeatureLayout,
}

impl FeatureMatrix {
    pub(crate) fn from_parts(data: Array2<f32>, layout: FeatureLayout) -> Self {
        debug_assert_eq!(data.ncols(), layout.n_channels());
        Self { data, layout }
    }

    pub fn time_steps(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_channels(&self) -> usize {
        self.data.ncols()
    }

    pub fn layout(&self) -> FeatureLayout {
        self.layout
    }

    pub fn view(&self) -> ArrayView2<'_, f32> {
        self.data.view()
    }

    /// Columns belonging to one family
    pub fn family(&self, family: FeatureFamily) -> ArrayView2<'_, f32> {
        let cols = self.layout.columns(family);
        self.data.slice(ndarray::s![.., cols])
    }

    pub fn into_inner(self) -> Array2<f32> {
        self.data
    }
}

/// FeatureMatrix with a leading batch axis, shape `(1, time_steps, channels)`
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInput {
    data: Array3<f32>,
    layout: FeatureLayout,
}

impl ModelInput {
    pub(crate) fn from_parts(data: Array3<f32>, layout: FeatureLayout) -> Self {
        debug_assert_eq!(data.dim().0, 1);
        Self { data, layout }
    }

    /// `(batch, time_steps, channels)`
    pub fn shape(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    pub fn layout(&self) -> FeatureLayout {
        self.layout
    }

    pub fn tensor(&self) -> &Array3<f32> {
        &self.data
    }

    /// The single matrix inside the batch
    pub fn matrix(&self) -> ArrayView2<'_, f32> {
        self.data.index_axis(ndarray::Axis(0), 0)
    }

    pub fn into_inner(self) -> Array3<f32> {
        self.data
    }
}
