// src/core/decoder.rs
//
// Audio file decoding with Symphonia, followed by mono downmix and
// optional resampling into a `Waveform`.

use anyhow::{bail, Context, Result};
use log::debug;
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::resample::resample;
use super::waveform::Waveform;

/// Decoded interleaved audio
#[derive(Debug, Clone)]
pub struct AudioData {
    /// Interleaved samples normalized to [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of audio channels
    pub channels: usize,
    /// Duration in seconds
    pub duration_secs: f64,
}

/// How a decoded file is turned into an analysis waveform
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Resample to this rate; `None` keeps the file's rate
    pub target_sample_rate: Option<u32>,
    /// Force a mono downmix. Analysis is always mono, so multi-channel
    /// input is downmixed either way; the flag only makes that explicit.
    pub mono: bool,
}

/// Decode audio file to floating-point samples
pub fn decode_audio(path: &Path) -> Result<AudioData> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension() {
        hint.with_extension(ext.to_str().unwrap_or(""));
    }

    let mut probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .context("Failed to probe file format - may be corrupted or unsupported")?;

    let track = probed
        .format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No supported audio track found in file")?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .context("File does not specify sample rate")?;

    let channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(2);
    if channels == 0 {
        bail!("File reports 0 audio channels");
    }

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Failed to create decoder for audio codec")?;

    let mut samples: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match probed.format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break
            }
            Err(symphonia::core::errors::Error::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(buf) => buf,
            Err(symphonia::core::errors::Error::DecodeError(_)) => continue,
            Err(e) => return Err(e.into()),
        };

        if sample_buf.is_none() {
            let spec = *decoded.spec();
            sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
        }

        if let Some(ref mut buf) = sample_buf {
            buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buf.samples());
        }
    }

    if samples.is_empty() {
        bail!("No audio samples decoded from file");
    }

    let duration_secs = samples.len() as f64 / (sample_rate as f64 * channels as f64);

    Ok(AudioData {
        samples,
        sample_rate,
        channels,
        duration_secs,
    })
}

/// Extract mono samples from potentially multi-channel audio
pub fn extract_mono(audio: &AudioData) -> Vec<f32> {
    if audio.channels == 1 {
        return audio.samples.clone();
    }

    audio
        .samples
        .chunks_exact(audio.channels)
        .map(|frame| frame.iter().sum::<f32>() / audio.channels as f32)
        .collect()
}

/// Decode a file into a mono waveform ready for analysis
pub fn load_waveform(path: &Path, options: &LoadOptions) -> Result<Waveform> {
    let audio = decode_audio(path)?;
    debug!(
        "{}: {} Hz, {} channel(s), {:.1}s",
        path.display(),
        audio.sample_rate,
        audio.channels,
        audio.duration_secs
    );

    let waveform = Waveform::new(extract_mono(&audio), audio.sample_rate);

    match options.target_sample_rate {
        Some(rate) if rate != waveform.sample_rate => resample(&waveform, rate)
            .with_context(|| format!("Failed to resample {} to {} Hz", path.display(), rate)),
        _ => Ok(waveform),
    }
}
