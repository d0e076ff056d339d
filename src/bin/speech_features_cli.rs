use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hound::{SampleFormat, WavSpec, WavWriter};
use ndarray::Axis;
use ndarray_npy::WriteNpyExt;
use serde::Serialize;
use speech_features::audio::{is_supported_extension, synthesize_fallback};
use speech_features::config::DEFAULT_DURATION_SECONDS;
use speech_features::{
    run_pipeline, AudioSource, ErrorCode, FeatureFamily, OutcomeKind, PipelineConfig,
    Preprocessor, Waveform,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "speech_features_cli",
    about = "Preprocess speech clips and extract classifier feature tensors"
)]
struct Cli {
    /// JSON pipeline configuration (defaults when omitted or unreadable)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full pipeline and print a JSON report
    Extract {
        input: PathBuf,
        /// Also write the (1, T, C) tensor as a .npy file
        #[arg(long)]
        npy: Option<PathBuf>,
        /// Write the report here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run only the preprocessor and write the cleaned waveform
    Preprocess {
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Write the deterministic fallback signal
    Synth {
        #[arg(long)]
        output: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = cli
        .config
        .as_deref()
        .map(PipelineConfig::load_from_file)
        .unwrap_or_default();

    match cli.command {
        Commands::Extract { input, npy, output } => run_extract(&config, &input, npy, output),
        Commands::Preprocess { input, output } => run_preprocess(&config, &input, &output),
        Commands::Synth { output } => run_synth(&config, &output),
    }
}

fn warn_if_unsupported(input: &Path) {
    if !is_supported_extension(input) {
        tracing::warn!(
            "{} does not have a wav/mp3/ogg extension; decoding anyway",
            input.display()
        );
    }
}

fn run_extract(
    config: &PipelineConfig,
    input: &Path,
    npy: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<ExitCode> {
    warn_if_unsupported(input);
    let source = AudioSource::from_path(input);
    let result = run_pipeline(&source, config)
        .with_context(|| format!("extracting features from {}", input.display()))?;

    if let Some(path) = &npy {
        let writer = BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        );
        result
            .input
            .tensor()
            .write_npy(writer)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    let (batch, time_steps, channels) = result.input.shape();
    let layout = result.input.layout();
    let channel_means: Vec<f32> = result
        .input
        .matrix()
        .mean_axis(Axis(0))
        .map(|means| means.to_vec())
        .unwrap_or_default();

    let report = ExtractReport {
        input: input.display().to_string(),
        outcome: result.preprocessed.outcome,
        fallback_reason: result
            .preprocessed
            .fallback_reason
            .as_ref()
            .map(|err| err.message()),
        sample_rate: result.preprocessed.waveform.sample_rate,
        waveform_len: result.preprocessed.waveform.len(),
        shape: [batch, time_steps, channels],
        families: FeatureFamily::ALL
            .iter()
            .map(|family| {
                let columns = layout.columns(*family);
                FamilyColumns {
                    family: *family,
                    start: columns.start,
                    end: columns.end,
                }
            })
            .collect(),
        channel_means,
        npy: npy.map(|path| path.display().to_string()),
    };
    let json = serde_json::to_string_pretty(&report)?;

    if let Some(path) = output {
        std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{json}");
    }
    Ok(ExitCode::from(0))
}

fn run_preprocess(config: &PipelineConfig, input: &Path, output: &Path) -> Result<ExitCode> {
    warn_if_unsupported(input);
    let preprocessor = Preprocessor::new(config.preprocess.clone());
    let result = preprocessor.process(&AudioSource::from_path(input));
    if result.is_fallback() {
        eprintln!(
            "warning: {} could not be used, wrote fallback signal",
            input.display()
        );
    }
    write_wav(&result.waveform, output)?;
    Ok(ExitCode::from(0))
}

fn run_synth(config: &PipelineConfig, output: &Path) -> Result<ExitCode> {
    let rate = Preprocessor::new(config.preprocess.clone()).sample_rate();
    let duration = config
        .preprocess
        .duration_seconds
        .unwrap_or(DEFAULT_DURATION_SECONDS);
    let waveform = Waveform::new(synthesize_fallback(rate, duration), rate);
    write_wav(&waveform, output)?;
    Ok(ExitCode::from(0))
}

/// Write mono 32-bit float WAV
fn write_wav(waveform: &Waveform, path: &Path) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: waveform.sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("creating WAV file {}", path.display()))?;
    for &sample in &waveform.samples {
        writer.write_sample(sample)?;
    }
    writer
        .finalize()
        .with_context(|| format!("finalizing {}", path.display()))?;
    Ok(())
}

#[derive(Serialize)]
struct FamilyColumns {
    family: FeatureFamily,
    start: usize,
    end: usize,
}

#[derive(Serialize)]
struct ExtractReport {
    input: String,
    outcome: OutcomeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    fallback_reason: Option<String>,
    sample_rate: u32,
    waveform_len: usize,
    shape: [usize; 3],
    families: Vec<FamilyColumns>,
    channel_means: Vec<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    npy: Option<String>,
}
