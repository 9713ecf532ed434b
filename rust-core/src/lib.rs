//! Hopscan - MP3 decoding and hop-based magnitude spectra
//!
//! Front end of an audio-fingerprinting pipeline: decodes a file to 16-bit
//! PCM, selects one channel, splits it into fixed-length hops and computes
//! the one-sided magnitude spectrum of every hop. Hop sizes need not be
//! powers of two; other lengths use Bluestein's chirp z-transform.

pub mod audio;
pub mod error;
pub mod spectrum;

use std::path::Path;

pub use audio::{decode_file, extract_channel, AudioBuffer, MonoSamples};
pub use error::{HopscanError, Result};
pub use spectrum::{AnalyzerConfig, HopAnalyzer, SpectralEngine, Spectrogram, DEFAULT_HOP_SIZE};

/// Decode a file and analyze one of its channels
///
/// The decoded interleaved buffer is dropped as soon as the channel has been
/// extracted.
pub fn analyze_file(path: impl AsRef<Path>, config: AnalyzerConfig) -> Result<Spectrogram> {
    let mono = {
        let buffer = decode_file(path)?;
        extract_channel(&buffer, config.channel)?
    };

    HopAnalyzer::new(config)?.analyze(&mono)
}
