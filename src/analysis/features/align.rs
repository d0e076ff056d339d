// Align module - Per-family normalization, frame alignment and concatenation
//
// Feature families do not always agree on their native frame count (window
// and hop parity, different padding), so each one is padded or truncated to
// the cepstral frame count before the columns are joined.

use ndarray::{concatenate, s, Array2, ArrayView2, Axis};

use super::types::{FeatureFamily, FeatureLayout, FeatureMatrix, ModelInput};
use crate::error::FeatureExtractionError;

/// Added to every standard deviation before dividing
pub const STANDARDIZE_EPSILON: f64 = 1e-8;

/// Z-score every column using population mean and standard deviation
///
/// `x' = (x - mean) / (std + 1e-8)`; a constant column becomes all zeros.
pub fn standardize_columns(values: &mut Array2<f32>) {
    for mut column in values.axis_iter_mut(Axis(1)) {
        let n = column.len();
        if n == 0 {
            continue;
        }
        let mean = column.iter().map(|&v| v as f64).sum::<f64>() / n as f64;
        let variance = column
            .iter()
            .map(|&v| {
                let d = v as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / n as f64;
        let denom = variance.sqrt() + STANDARDIZE_EPSILON;
        column.mapv_inplace(|v| ((v as f64 - mean) / denom) as f32);
    }
}

/// Fail with the first frame containing a NaN or infinity
pub fn ensure_finite(
    family: FeatureFamily,
    values: &Array2<f32>,
) -> Result<(), FeatureExtractionError> {
    match values
        .axis_iter(Axis(0))
        .position(|row| row.iter().any(|v| !v.is_finite()))
    {
        Some(frame) => Err(FeatureExtractionError::NonFinite { family, frame }),
        None => Ok(()),
    }
}

/// Right-pad with zero frames or truncate to exactly `target_length` frames
pub fn align_to(values: ArrayView2<'_, f32>, target_length: usize) -> Array2<f32> {
    let (frames, channels) = values.dim();
    if frames >= target_length {
        return values.slice(s![..target_length, ..]).to_owned();
    }

    let mut aligned = Array2::<f32>::zeros((target_length, channels));
    aligned.slice_mut(s![..frames, ..]).assign(&values);
    aligned
}

/// Join the four families along the channel axis in fixed column order
///
/// Every family must already have the cepstral frame count.
pub fn combine<'a>(
    cepstral: ArrayView2<'a, f32>,
    spectral: ArrayView2<'a, f32>,
    zero_crossing: ArrayView2<'a, f32>,
    pitch_class: ArrayView2<'a, f32>,
) -> Result<FeatureMatrix, FeatureExtractionError> {
    let expected = cepstral.nrows();
    let layout = FeatureLayout::new(cepstral.ncols(), pitch_class.ncols());

    for (family, view) in [
        (FeatureFamily::SpectralShape, &spectral),
        (FeatureFamily::ZeroCrossing, &zero_crossing),
        (FeatureFamily::PitchClass, &pitch_class),
    ] {
        if view.nrows() != expected {
            return Err(FeatureExtractionError::ShapeMismatch {
                family,
                expected,
                actual: view.nrows(),
            });
        }
        if view.ncols() != layout.width(family) {
            return Err(FeatureExtractionError::invalid(
                family,
                format!(
                    "expected {} channels, got {}",
                    layout.width(family),
                    view.ncols()
                ),
            ));
        }
    }

    let data = concatenate(
        Axis(1),
        &[cepstral, spectral, zero_crossing, pitch_class],
    )
    .map_err(|err| FeatureExtractionError::invalid(FeatureFamily::Cepstral, err.to_string()))?;

    Ok(FeatureMatrix::from_parts(data, layout))
}

/// Prepend the singleton batch axis
pub fn batch(matrix: FeatureMatrix) -> ModelInput {
    let layout = matrix.layout();
    let data = matrix.into_inner().insert_axis(Axis(0));
    ModelInput::from_parts(data, layout)
}
