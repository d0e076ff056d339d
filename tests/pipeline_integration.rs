// Integration tests for the preprocess → extract pipeline through the public API

use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use speech_features::analysis::features::{align_to, cepstral_coefficients};
use speech_features::audio::{fit_duration, normalize, synthesize_fallback};
use speech_features::config::{DEFAULT_DURATION_SECONDS, DEFAULT_SAMPLE_RATE};
use speech_features::{
    run_pipeline, AudioError, AudioSource, FeatureConfig, FeatureExtractor, FeatureFamily,
    OutcomeKind, PipelineConfig, Preprocessor, Waveform,
};

const CLIP_LEN: usize = 66_150;

fn sine(sample_rate: u32, frequency: f32, len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| (2.0 * std::f32::consts::PI * frequency * i as f32 / sample_rate as f32).sin())
        .collect()
}

fn wav_bytes(samples: &[f32], sample_rate: u32) -> Vec<u8> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec).expect("wav writer");
        for &s in samples {
            writer
                .write_sample((s.clamp(-1.0, 1.0) * 32767.0) as i16)
                .expect("write sample");
        }
        writer.finalize().expect("finalize wav");
    }
    cursor.into_inner()
}

fn expected_frames(len: usize) -> usize {
    1 + len / 512
}

#[test]
fn silent_clip_becomes_two_tone_fallback() {
    let source = AudioSource::Samples {
        samples: vec![0.0; CLIP_LEN],
        sample_rate: DEFAULT_SAMPLE_RATE,
    };
    let result = Preprocessor::default().process(&source);

    assert_eq!(result.outcome, OutcomeKind::Fallback);
    assert_eq!(result.fallback_reason, Some(AudioError::SilentSignal));
    assert_eq!(result.waveform.len(), CLIP_LEN);
    assert_eq!(result.waveform.sample_rate, DEFAULT_SAMPLE_RATE);
    assert!(result.waveform.samples.iter().all(|s| s.is_finite()));
    assert!((result.waveform.peak() - 1.0).abs() < 1e-6);
}

#[test]
fn padded_tone_produces_default_tensor() {
    let mut samples = sine(DEFAULT_SAMPLE_RATE, 440.0, DEFAULT_SAMPLE_RATE as usize);
    samples.resize(CLIP_LEN, 0.0);
    let source = AudioSource::Bytes {
        data: wav_bytes(&samples, DEFAULT_SAMPLE_RATE),
        extension_hint: Some("wav".to_string()),
    };

    let output = run_pipeline(&source, &PipelineConfig::default()).expect("pipeline");
    assert_eq!(output.preprocessed.outcome, OutcomeKind::Decoded);

    // Trailing silence is trimmed, so T follows the trimmed length
    let len = output.preprocessed.waveform.len();
    assert!(len < CLIP_LEN);
    assert_eq!(output.input.shape(), (1, expected_frames(len), 29));
    assert!(output.input.tensor().iter().all(|v| v.is_finite()));
}

#[test]
fn undecodable_bytes_fall_back_without_error() {
    let source = AudioSource::from_upload(b"RIFF....not really a wav".to_vec(), "clip.wav");
    let output = run_pipeline(&source, &PipelineConfig::default()).expect("pipeline");

    assert!(output.preprocessed.is_fallback());
    assert!(matches!(
        output.preprocessed.fallback_reason,
        Some(AudioError::DecodeFailed { .. }) | Some(AudioError::NoAudioTrack)
    ));
    assert_eq!(output.preprocessed.waveform.len(), CLIP_LEN);
    assert_eq!(output.input.shape(), (1, expected_frames(CLIP_LEN), 29));
}

#[test]
fn missing_file_falls_back_without_error() {
    let source = AudioSource::from_path("/nonexistent/speech/clip.mp3");
    let output = run_pipeline(&source, &PipelineConfig::default()).expect("pipeline");
    assert!(matches!(
        output.preprocessed.fallback_reason,
        Some(AudioError::SourceUnavailable { .. })
    ));
}

#[test]
fn identical_input_gives_identical_tensor() {
    let mut rng = StdRng::seed_from_u64(11);
    let samples: Vec<f32> = (0..40_000).map(|_| rng.gen_range(-0.5..0.5)).collect();
    let source = AudioSource::Samples {
        samples,
        sample_rate: 16_000,
    };

    let config = PipelineConfig::default();
    let first = run_pipeline(&source, &config).expect("first run");
    let second = run_pipeline(&source, &config).expect("second run");
    assert_eq!(first, second);
}

#[test]
fn fallback_synthesis_is_bit_identical() {
    let a = synthesize_fallback(DEFAULT_SAMPLE_RATE, DEFAULT_DURATION_SECONDS);
    let b = synthesize_fallback(DEFAULT_SAMPLE_RATE, DEFAULT_DURATION_SECONDS);
    assert_eq!(a.len(), CLIP_LEN);
    assert!(a.iter().zip(&b).all(|(x, y)| x.to_bits() == y.to_bits()));
}

#[test]
fn fit_duration_always_reaches_target() {
    for len in [0, 1, CLIP_LEN - 1, CLIP_LEN, CLIP_LEN + 1, 2 * CLIP_LEN] {
        let fitted = fit_duration(&vec![0.25; len], DEFAULT_SAMPLE_RATE, 3.0);
        assert_eq!(fitted.len(), CLIP_LEN, "input length {}", len);
    }
}

#[test]
fn normalize_never_produces_nan() {
    let zeros = normalize(&[0.0; 512]);
    assert!(zeros.iter().all(|&v| v == 0.0));
}

#[test]
fn every_family_aligns_to_cepstral_rows() {
    let extractor = FeatureExtractor::default();
    let wave = Waveform::new(sine(DEFAULT_SAMPLE_RATE, 523.25, CLIP_LEN), DEFAULT_SAMPLE_RATE);
    let target = extractor.cepstral_coefficients(&wave).expect("cepstral").nrows();
    assert_eq!(target, expected_frames(CLIP_LEN));

    let chroma = extractor.pitch_class_profile(&wave).expect("chroma");
    for rows in [target - 1, target, target + 1] {
        let family = chroma.slice(ndarray::s![..rows.min(chroma.nrows()), ..]);
        assert_eq!(align_to(family, target).nrows(), target);
    }
    let longer = ndarray::Array2::<f32>::ones((target + 1, 12));
    assert_eq!(align_to(longer.view(), target).nrows(), target);
}

#[test]
fn default_column_layout() {
    let extractor = FeatureExtractor::default();
    let wave = Waveform::new(sine(DEFAULT_SAMPLE_RATE, 440.0, 30_000), DEFAULT_SAMPLE_RATE);
    let matrix = extractor.feature_matrix(&wave).expect("matrix");
    let layout = matrix.layout();

    assert_eq!(layout.columns(FeatureFamily::Cepstral), 0..13);
    assert_eq!(layout.columns(FeatureFamily::SpectralShape), 13..16);
    assert_eq!(layout.columns(FeatureFamily::ZeroCrossing), 16..17);
    assert_eq!(layout.columns(FeatureFamily::PitchClass), 17..29);

    // Cepstral block matches the standalone family output
    let cepstral = cepstral_coefficients(&wave.samples, wave.sample_rate, &FeatureConfig::default())
        .expect("cepstral");
    assert_eq!(matrix.family(FeatureFamily::Cepstral), cepstral.view());
}

#[test]
fn standardized_and_native_channels() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut samples = sine(DEFAULT_SAMPLE_RATE, 200.0, 30_000);
    samples.extend((0..30_000).map(|_| rng.gen_range(-0.8f32..0.8)));

    let matrix = FeatureExtractor::default()
        .feature_matrix(&Waveform::new(samples, DEFAULT_SAMPLE_RATE))
        .expect("matrix");

    for family in FeatureFamily::ALL {
        for column in matrix.family(family).columns() {
            let n = column.len() as f32;
            let mean = column.sum() / n;
            let std = (column.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n).sqrt();
            if family.is_standardized() {
                assert!(mean.abs() < 1e-3, "{} mean {}", family, mean);
                assert!((std - 1.0).abs() < 1e-2, "{} std {}", family, std);
            } else {
                assert!(column.iter().all(|&v| (0.0..=1.0 + 1e-6).contains(&v)));
            }
        }
    }

    // Noise half crosses zero far more often than the 200 Hz half
    let zcr = matrix.family(FeatureFamily::ZeroCrossing);
    assert!(zcr[[zcr.nrows() - 10, 0]] > 5.0 * zcr[[10, 0]]);
}

#[test]
fn invalid_feature_config_surfaces_error() {
    let config = PipelineConfig {
        features: FeatureConfig {
            n_cepstral: 200,
            ..FeatureConfig::default()
        },
        ..PipelineConfig::default()
    };
    let source = AudioSource::Samples {
        samples: sine(DEFAULT_SAMPLE_RATE, 440.0, 22_050),
        sample_rate: DEFAULT_SAMPLE_RATE,
    };
    let err = run_pipeline(&source, &config).unwrap_err();
    assert_eq!(err.family(), FeatureFamily::Cepstral);
}
