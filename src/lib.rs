// Speech Features Core - audio preprocessing and feature extraction
// Raw clip → clean fixed-duration waveform → (1, T, C) feature tensor

// Module declarations
pub mod analysis;
pub mod audio;
pub mod config;
pub mod error;

// Re-exports for convenience
pub use analysis::{
    Classifier, FeatureExtractor, FeatureFamily, FeatureLayout, FeatureMatrix, ModelInput,
    PadMode, Prediction,
};
pub use audio::{AudioSource, LoadOutcome, OutcomeKind, Preprocessed, Preprocessor, Waveform};
pub use config::{FeatureConfig, PipelineConfig, PreprocessConfig};
pub use error::{AudioError, ErrorCode, FeatureExtractionError};

/// Everything one request produces
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub preprocessed: Preprocessed,
    pub input: ModelInput,
}

/// Preprocess one source and extract its model input
///
/// Source problems never fail the call (they produce a fallback waveform,
/// visible in `preprocessed.outcome`); feature extraction errors do.
pub fn run_pipeline(
    source: &AudioSource,
    config: &PipelineConfig,
) -> Result<PipelineOutput, FeatureExtractionError> {
    let preprocessor = Preprocessor::new(config.preprocess.clone());
    let extractor = FeatureExtractor::new(config.features.clone());

    let preprocessed = preprocessor.process(source);
    let input = extractor.extract(&preprocessed.waveform).map_err(|err| {
        error::log_feature_error(&err, "run_pipeline");
        err
    })?;

    Ok(PipelineOutput {
        preprocessed,
        input,
    })
}
