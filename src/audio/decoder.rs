//! Container decoding to mono f32 samples
//!
//! Uses symphonia's default probe, so any enabled container (WAV, MP3, OGG
//! Vorbis, FLAC) decodes through the same path. Multi-channel audio is
//! mixed down by averaging channels.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::Waveform;
use crate::error::AudioError;

/// Read a file fully and decode it
///
/// The file is closed before decoding starts.
pub fn decode_file(path: &Path) -> Result<Waveform, AudioError> {
    let data = fs::read(path).map_err(|err| AudioError::SourceUnavailable {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;
    let hint = path.extension().and_then(|ext| ext.to_str());
    decode_bytes(data, hint)
}

/// Decode an in-memory container at its native sample rate
///
/// # Arguments
/// * `data` - Encoded container bytes
/// * `extension_hint` - File extension to speed up format probing
///
/// # Returns
/// Mono waveform; may be empty if the stream holds no frames
pub fn decode_bytes(data: Vec<u8>, extension_hint: Option<&str>) -> Result<Waveform, AudioError> {
    if data.is_empty() {
        return Err(AudioError::DecodeFailed {
            reason: "source contains no bytes".to_string(),
        });
    }

    let mss = MediaSourceStream::new(Box::new(Cursor::new(data)), Default::default());
    let mut hint = Hint::new();
    if let Some(ext) = extension_hint {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(AudioError::NoAudioTrack)?;
    let track_id = track.id;
    let sample_rate = match track.codec_params.sample_rate {
        Some(rate) if rate > 0 => rate,
        other => {
            return Err(AudioError::UnsupportedSampleRate {
                rate: other.unwrap_or(0),
            })
        }
    };

    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut samples: Vec<f32> = Vec::new();
    let mut skipped_packets = 0usize;
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(err) => return Err(err.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let channels = decoded.spec().channels.count().max(1);
                let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
                buffer.copy_interleaved_ref(decoded);
                mix_to_mono(buffer.samples(), channels, &mut samples);
            }
            Err(SymphoniaError::DecodeError(reason)) => {
                // Corrupt packet; keep what decodes
                skipped_packets += 1;
                tracing::debug!("Skipping undecodable packet: {}", reason);
            }
            Err(err) => return Err(err.into()),
        }
    }

    if skipped_packets > 0 {
        tracing::warn!("Skipped {} corrupt packets while decoding", skipped_packets);
    }
    tracing::debug!(
        "Decoded {} mono samples at {} Hz",
        samples.len(),
        sample_rate
    );
    Ok(Waveform::new(samples, sample_rate))
}

/// Append the channel average of each interleaved frame to `out`
fn mix_to_mono(interleaved: &[f32], channels: usize, out: &mut Vec<f32>) {
    if channels == 1 {
        out.extend_from_slice(interleaved);
        return;
    }
    out.extend(
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32),
    );
}
