//! Growable PCM sample buffer
//!
//! Accumulates decoded interleaved 16-bit blocks into one owned sequence

use crate::error::{HopscanError, Result};

/// Seconds of audio reserved up front
const INITIAL_SECONDS: usize = 2;

/// Interleaved 16-bit PCM accumulated from a decoder
///
/// Capacity grows by doubling: whenever an append would overflow the current
/// capacity, it is doubled (repeatedly, for oversized blocks) before copying.
/// Samples already stored never move relative to each other.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    samples: Vec<i16>,

    /// Logical capacity in samples, always >= samples.len()
    capacity: usize,

    sample_rate: u32,
    channels: u16,
}

impl AudioBuffer {
    /// Create an empty buffer sized for ~2 seconds of audio
    ///
    /// # Arguments
    /// * `sample_rate` - Sample rate in Hz
    /// * `channels` - Interleaved channel count
    pub fn with_format(sample_rate: u32, channels: u16) -> Result<Self> {
        let initial = (sample_rate as usize)
            .saturating_mul(channels as usize)
            .saturating_mul(INITIAL_SECONDS)
            .max(1);
        Self::with_capacity(sample_rate, channels, initial)
    }

    /// Create an empty buffer with an explicit initial capacity (in samples)
    pub fn with_capacity(sample_rate: u32, channels: u16, capacity: usize) -> Result<Self> {
        let capacity = capacity.max(1);
        let mut samples = Vec::new();
        samples
            .try_reserve_exact(capacity)
            .map_err(|_| HopscanError::OutOfMemory {
                what: "PCM sample buffer",
                requested: capacity,
            })?;

        Ok(Self {
            samples,
            capacity,
            sample_rate,
            channels,
        })
    }

    /// Append a decoded block, doubling capacity as needed
    pub fn append(&mut self, block: &[i16]) -> Result<()> {
        let required = self
            .samples
            .len()
            .checked_add(block.len())
            .ok_or(HopscanError::OutOfMemory {
                what: "PCM sample buffer",
                requested: usize::MAX,
            })?;

        if required > self.capacity {
            self.grow_to_fit(required)?;
        }

        self.samples.extend_from_slice(block);
        Ok(())
    }

    fn grow_to_fit(&mut self, required: usize) -> Result<()> {
        let mut new_capacity = self.capacity;
        while new_capacity < required {
            new_capacity = new_capacity
                .checked_mul(2)
                .ok_or(HopscanError::OutOfMemory {
                    what: "PCM sample buffer",
                    requested: required,
                })?;
        }

        let additional = new_capacity - self.samples.len();
        self.samples
            .try_reserve_exact(additional)
            .map_err(|_| HopscanError::OutOfMemory {
                what: "PCM sample buffer",
                requested: new_capacity,
            })?;

        log::trace!("PCM buffer grown {} -> {} samples", self.capacity, new_capacity);
        self.capacity = new_capacity;
        Ok(())
    }

    /// Interleaved samples appended so far
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Total sample count (all channels)
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Current capacity in samples
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of complete interleaved frames
    pub fn frames(&self) -> usize {
        match self.channels {
            0 => 0,
            c => self.samples.len() / c as usize,
        }
    }

    /// Duration in seconds: num_samples / channels / sample_rate
    pub fn duration_secs(&self) -> f64 {
        if self.channels == 0 || self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.channels as f64 / self.sample_rate as f64
    }
}
