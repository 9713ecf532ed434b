//! Single-channel extraction from interleaved PCM

use super::buffer::AudioBuffer;
use super::hops::Hops;
use crate::error::{try_filled, HopscanError, Result};

/// One deinterleaved channel, converted to f64
#[derive(Debug, Clone, PartialEq)]
pub struct MonoSamples {
    samples: Vec<f64>,
    sample_rate: u32,
}

impl MonoSamples {
    pub fn new(samples: Vec<f64>, sample_rate: u32) -> Self {
        Self { samples, sample_rate }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Non-overlapping analysis windows of `hop_size` samples
    pub fn hops(&self, hop_size: usize) -> Result<Hops<'_>> {
        Hops::new(&self.samples, hop_size)
    }
}

/// Deinterleave one channel
///
/// Emits the sample at `channel` from every complete frame. A trailing
/// partial frame is ignored, so the output holds `len / channels` samples.
pub fn extract_channel(buffer: &AudioBuffer, channel: usize) -> Result<MonoSamples> {
    let channels = buffer.channels() as usize;
    if channels == 0 {
        return Err(HopscanError::InvalidArgument(
            "buffer has no channels".to_string(),
        ));
    }
    if channel >= channels {
        return Err(HopscanError::InvalidArgument(format!(
            "channel {} out of range for {}-channel audio",
            channel, channels
        )));
    }

    let frames = buffer.len() / channels;
    let mut samples = try_filled(frames, 0.0, "mono sample buffer")?;

    for (out, frame) in samples
        .iter_mut()
        .zip(buffer.samples().chunks_exact(channels))
    {
        *out = f64::from(frame[channel]);
    }

    log::debug!(
        "Extracted channel {} of {}: {} samples",
        channel,
        channels,
        frames
    );

    Ok(MonoSamples::new(samples, buffer.sample_rate()))
}
