// src/core/resample.rs
//
// Sample-rate conversion for the `--sr` option, using rubato's
// synchronous FFT resampler.

use anyhow::{Context, Result};
use log::debug;
use rubato::{FftFixedIn, Resampler};

use super::waveform::Waveform;

/// Input frames per processing chunk
const CHUNK_SIZE: usize = 1024;
/// Sub-chunks per chunk; more means lower latency and more CPU
const SUB_CHUNKS: usize = 2;

/// Convert a mono waveform to `target_rate` Hz
///
/// Returns the input unchanged when the rates already match. The
/// resampler's delay is trimmed so the output lines up with the input.
pub fn resample(waveform: &Waveform, target_rate: u32) -> Result<Waveform> {
    if waveform.sample_rate == target_rate || waveform.is_empty() {
        return Ok(Waveform::new(waveform.samples.clone(), target_rate));
    }

    debug!("resampling {} Hz -> {} Hz", waveform.sample_rate, target_rate);

    let mut resampler = FftFixedIn::<f32>::new(
        waveform.sample_rate as usize,
        target_rate as usize,
        CHUNK_SIZE,
        SUB_CHUNKS,
        1,
    )
    .context("Failed to create resampler")?;

    let input = &waveform.samples;
    let mut output: Vec<f32> = Vec::new();
    let mut pos = 0;

    while pos + resampler.input_frames_next() <= input.len() {
        let n = resampler.input_frames_next();
        let chunk = resampler
            .process(&[&input[pos..pos + n]], None)
            .context("Resampling failed")?;
        output.extend_from_slice(&chunk[0]);
        pos += n;
    }

    if pos < input.len() {
        let chunk = resampler
            .process_partial(Some(&[&input[pos..]]), None)
            .context("Resampling failed")?;
        output.extend_from_slice(&chunk[0]);
    }

    // Flush the samples still held in the resampler's delay line
    let tail = resampler
        .process_partial::<&[f32]>(None, None)
        .context("Resampling failed")?;
    output.extend_from_slice(&tail[0]);

    let delay = resampler.output_delay();
    let expected = (input.len() as u64 * target_rate as u64).div_ceil(waveform.sample_rate as u64) as usize;

    let samples: Vec<f32> = output.into_iter().skip(delay).take(expected).collect();
    Ok(Waveform::new(samples, target_rate))
}
