use std::fs;
use std::path::PathBuf;
use std::process::Command;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use serde_json::Value;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_speech_features_cli"))
}

fn scratch_path(name: &str) -> PathBuf {
    let dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("speech_features_cli");
    fs::create_dir_all(&dir).expect("create scratch dir");
    dir.join(name)
}

fn write_tone_wav(name: &str, sample_rate: u32, seconds: f32) -> PathBuf {
    let path = scratch_path(name);
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(&path, spec).expect("create wav");
    let len = (sample_rate as f32 * seconds) as usize;
    for i in 0..len {
        let t = i as f32 / sample_rate as f32;
        let value = 0.6 * (2.0 * std::f32::consts::PI * 330.0 * t).sin();
        writer
            .write_sample((value * 32767.0) as i16)
            .expect("write sample");
    }
    writer.finalize().expect("finalize wav");
    path
}

#[test]
fn extract_prints_report() {
    let input = write_tone_wav("extract_tone.wav", 44_100, 3.0);
    let output = cli()
        .args(["extract", input.to_str().unwrap()])
        .output()
        .expect("failed to run extract");
    assert!(
        output.status.success(),
        "CLI exited with {:?}: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let json: Value = serde_json::from_str(stdout.trim()).expect("extract report JSON");
    assert_eq!(json["outcome"], "decoded");
    assert_eq!(json["sample_rate"], 22_050);
    assert_eq!(json["waveform_len"], 66_150);
    assert_eq!(json["shape"][0], 1);
    assert_eq!(json["shape"][1], 1 + 66_150 / 512);
    assert_eq!(json["shape"][2], 29);
    assert_eq!(json["channel_means"].as_array().map(|a| a.len()), Some(29));
    assert_eq!(json["families"][3]["family"], "pitch_class");
    assert_eq!(json["families"][3]["start"], 17);
}

#[test]
fn extract_writes_npy_tensor() {
    let input = write_tone_wav("npy_tone.wav", 22_050, 1.0);
    let npy = scratch_path("npy_tone.npy");
    let _ = fs::remove_file(&npy);

    let output = cli()
        .args([
            "extract",
            input.to_str().unwrap(),
            "--npy",
            npy.to_str().unwrap(),
        ])
        .output()
        .expect("failed to run extract --npy");
    assert!(output.status.success());

    let bytes = fs::read(&npy).expect("npy written");
    assert!(bytes.starts_with(b"\x93NUMPY"));
    let header = String::from_utf8_lossy(&bytes[..128.min(bytes.len())]);
    assert!(header.contains("'shape': (1, "), "header {}", header);
    assert!(header.contains(", 29)"), "header {}", header);
}

#[test]
fn extract_on_garbage_reports_fallback() {
    let input = scratch_path("garbage.mp3");
    fs::write(&input, b"this is not an mp3 file at all").expect("write garbage");

    let output = cli()
        .args(["extract", input.to_str().unwrap()])
        .output()
        .expect("failed to run extract on garbage");
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).expect("report JSON");
    assert_eq!(json["outcome"], "fallback");
    assert!(json["fallback_reason"].is_string());
    assert_eq!(json["waveform_len"], 66_150);
}

#[test]
fn extract_fails_on_invalid_feature_config() {
    let input = write_tone_wav("bad_config_tone.wav", 22_050, 1.0);
    let config = scratch_path("bad_config.json");
    fs::write(&config, r#"{"features": {"n_pitch_bins": 0}}"#).expect("write config");

    let output = cli()
        .args([
            "--config",
            config.to_str().unwrap(),
            "extract",
            input.to_str().unwrap(),
        ])
        .output()
        .expect("failed to run extract with bad config");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).expect("stderr UTF-8");
    assert!(stderr.contains("pitch_class"), "stderr {}", stderr);
}

#[test]
fn preprocess_writes_float_wav() {
    let input = write_tone_wav("preprocess_tone.wav", 16_000, 2.0);
    let wav_out = scratch_path("preprocess_out.wav");

    let output = cli()
        .args([
            "preprocess",
            input.to_str().unwrap(),
            "--output",
            wav_out.to_str().unwrap(),
        ])
        .output()
        .expect("failed to run preprocess");
    assert!(output.status.success());

    let reader = WavReader::open(&wav_out).expect("open preprocessed wav");
    let spec = reader.spec();
    assert_eq!(spec.sample_rate, 22_050);
    assert_eq!(spec.sample_format, SampleFormat::Float);
    let samples: Vec<f32> = reader
        .into_samples::<f32>()
        .collect::<Result<_, _>>()
        .expect("read samples");
    let peak = samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    assert!((peak - 1.0).abs() < 1e-5, "peak {}", peak);
}

#[test]
fn synth_writes_fallback_clip() {
    let wav_out = scratch_path("synth.wav");
    let output = cli()
        .args(["synth", "--output", wav_out.to_str().unwrap()])
        .output()
        .expect("failed to run synth");
    assert!(output.status.success());

    let reader = WavReader::open(&wav_out).expect("open synth wav");
    assert_eq!(reader.spec().sample_rate, 22_050);
    assert_eq!(reader.len(), 66_150);
}
