// Analysis module - framing, feature families and the classifier seam
//
// Architecture:
// - stft: Centered framing and the shared short-time Fourier transform
// - features: Four feature families merged into a ModelInput tensor
// - classifier: Trait for whatever model consumes that tensor
//
// Pipeline: Waveform → FeatureExtractor → ModelInput → Classifier

pub mod classifier;
pub mod features;
pub mod stft;

pub use classifier::{Classifier, Prediction};
pub use features::{
    FeatureExtractor, FeatureFamily, FeatureLayout, FeatureMatrix, ModelInput,
};
pub use stft::{PadMode, Stft};
