// Classifier - seam between feature extraction and a trained model
//
// The crate produces ModelInput tensors; scoring them is left to an external
// model. Anything that maps a `(1, T, C)` tensor to labelled confidences can
// implement `Classifier`.

use crate::analysis::features::ModelInput;
use serde::{Deserialize, Serialize};

/// Label and per-class confidence for one clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Highest-scoring label
    pub label: String,
    /// `(label, confidence)` for every class, confidences summing to 1.0
    pub confidences: Vec<(String, f32)>,
}

impl Prediction {
    /// Build a prediction from raw non-negative class scores
    ///
    /// Scores are divided by their sum. Returns `None` when there are no
    /// labels, the lengths differ, or every score is zero.
    pub fn from_scores<S: AsRef<str>>(labels: &[S], scores: &[f32]) -> Option<Self> {
        if labels.is_empty() || labels.len() != scores.len() {
            return None;
        }
        let total: f32 = scores.iter().map(|s| s.max(0.0)).sum();
        if !(total > 0.0) {
            return None;
        }

        let confidences: Vec<(String, f32)> = labels
            .iter()
            .zip(scores)
            .map(|(label, score)| (label.as_ref().to_string(), score.max(0.0) / total))
            .collect();
        let label = confidences
            .iter()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(label, _)| label.clone())?;

        Some(Self { label, confidences })
    }

    /// Confidence of the winning label
    pub fn confidence(&self) -> f32 {
        self.confidences
            .iter()
            .find(|(label, _)| *label == self.label)
            .map(|(_, c)| *c)
            .unwrap_or(0.0)
    }
}

/// A model that scores extracted features
pub trait Classifier {
    fn classify(&self, input: &ModelInput) -> Prediction;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::features::{FeatureExtractor, FeatureFamily};
    use crate::audio::Waveform;

    /// Calls a clip "noisy" when its mean zero-crossing rate is high
    struct ZcrThreshold {
        threshold: f32,
    }

    impl Classifier for ZcrThreshold {
        fn classify(&self, input: &ModelInput) -> Prediction {
            let layout = input.layout();
            let matrix = input.matrix();
            let zcr = matrix.slice(ndarray::s![.., layout.columns(FeatureFamily::ZeroCrossing)]);
            let mean = zcr.mean().unwrap_or(0.0);
            let noisy = (mean / self.threshold).min(1.0);
            Prediction::from_scores(&["tonal", "noisy"], &[1.0 - noisy, noisy])
                .unwrap_or(Prediction {
                    label: "tonal".to_string(),
                    confidences: vec![("tonal".to_string(), 1.0), ("noisy".to_string(), 0.0)],
                })
        }
    }

    #[test]
    fn test_from_scores_normalizes() {
        let prediction = Prediction::from_scores(&["angry", "calm", "happy"], &[1.0, 2.0, 1.0])
            .unwrap();
        assert_eq!(prediction.label, "calm");
        assert!((prediction.confidence() - 0.5).abs() < 1e-6);
        let total: f32 = prediction.confidences.iter().map(|(_, c)| c).sum();
        assert!((total - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_from_scores_rejects_degenerate_input() {
        assert!(Prediction::from_scores::<&str>(&[], &[]).is_none());
        assert!(Prediction::from_scores(&["a", "b"], &[1.0]).is_none());
        assert!(Prediction::from_scores(&["a", "b"], &[0.0, 0.0]).is_none());
    }

    #[test]
    fn test_classifier_trait_consumes_model_input() {
        let extractor = FeatureExtractor::default();
        let tone: Vec<f32> = (0..22_050)
            .map(|i| (2.0 * std::f32::consts::PI * 220.0 * i as f32 / 22_050.0).sin())
            .collect();
        let input = extractor.extract(&Waveform::new(tone, 22_050)).unwrap();

        let classifier: Box<dyn Classifier> = Box::new(ZcrThreshold { threshold: 0.2 });
        let prediction = classifier.classify(&input);
        assert_eq!(prediction.label, "tonal");
        assert_eq!(prediction.confidences.len(), 2);
    }
}
