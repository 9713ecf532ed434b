//! Audio decoding using symphonia
//!
//! Decodes a whole file into interleaved 16-bit PCM before analysis begins

use std::fs::File;
use std::path::{Path, PathBuf};

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

use super::buffer::AudioBuffer;
use crate::error::Result;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Unable to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unrecognised audio format: {0}")]
    UnknownFormat(#[source] SymphoniaError),

    #[error("No decodable audio track found")]
    NoTrack,

    #[error("Stream does not report its {0}")]
    MissingFormat(&'static str),

    #[error("Decoder failure: {0}")]
    Codec(#[from] SymphoniaError),
}

/// Source of interleaved 16-bit PCM blocks
pub trait PcmDecoder {
    fn sample_rate(&self) -> u32;

    fn channels(&self) -> u16;

    /// Decode the next block; `Ok(None)` once the stream is exhausted
    fn next_block(&mut self) -> std::result::Result<Option<&[i16]>, DecodeError>;
}

/// An open decoding session on one file
///
/// Opening detects the container and builds the codec; dropping the session
/// releases the reader and decoder, including on early-return error paths.
pub struct SymphoniaDecoder {
    path: PathBuf,
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    sample_rate: u32,
    channels: u16,

    /// Reused conversion buffer, sized from the first decoded packet
    sample_buf: Option<SampleBuffer<i16>>,
}

impl SymphoniaDecoder {
    /// Open a file and prepare its default audio track for decoding
    pub fn open(path: impl AsRef<Path>) -> std::result::Result<Self, DecodeError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DecodeError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension() {
            hint.with_extension(&ext.to_string_lossy());
        }

        let detected = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(DecodeError::UnknownFormat)?;
        let format = detected.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(DecodeError::NoTrack)?;

        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or(DecodeError::MissingFormat("sample rate"))?;
        let channels = track
            .codec_params
            .channels
            .map(|c| c.count())
            .and_then(|c| u16::try_from(c).ok())
            .ok_or(DecodeError::MissingFormat("channel layout"))?;
        let track_id = track.id;

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())?;

        log::debug!(
            "Opened {}: {} Hz, {} channel(s)",
            path.display(),
            sample_rate,
            channels
        );

        Ok(Self {
            path: path.to_path_buf(),
            format,
            decoder,
            track_id,
            sample_rate,
            channels,
            sample_buf: None,
        })
    }
}

impl PcmDecoder for SymphoniaDecoder {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn next_block(&mut self) -> std::result::Result<Option<&[i16]>, DecodeError> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(None);
                }
                Err(SymphoniaError::ResetRequired) => return Ok(None),
                Err(e) => return Err(e.into()),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            match self.decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    let needed = decoded.capacity() * spec.channels.count();
                    let too_small = self
                        .sample_buf
                        .as_ref()
                        .map_or(true, |buf| buf.capacity() < needed);
                    if too_small {
                        self.sample_buf =
                            Some(SampleBuffer::new(decoded.capacity() as u64, spec));
                    }

                    if let Some(buf) = self.sample_buf.as_mut() {
                        buf.copy_interleaved_ref(decoded);
                    }
                    break;
                }
                Err(SymphoniaError::DecodeError(msg)) => {
                    log::warn!("Skipping corrupt packet in {}: {}", self.path.display(), msg);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(self.sample_buf.as_ref().map(|buf| buf.samples()))
    }
}

impl Drop for SymphoniaDecoder {
    fn drop(&mut self) {
        log::trace!("Closing decoder session for {}", self.path.display());
    }
}

/// Drain a decoder into one growable PCM buffer
pub fn decode_all<D: PcmDecoder>(decoder: &mut D) -> Result<AudioBuffer> {
    let mut buffer = AudioBuffer::with_format(decoder.sample_rate(), decoder.channels())?;

    while let Some(block) = decoder.next_block()? {
        buffer.append(block)?;
    }

    log::debug!(
        "Decoded {} samples ({:.2} s)",
        buffer.len(),
        buffer.duration_secs()
    );
    Ok(buffer)
}

/// Decode an entire audio file (MP3, or any format symphonia was built with)
pub fn decode_file(path: impl AsRef<Path>) -> Result<AudioBuffer> {
    let mut session = SymphoniaDecoder::open(path)?;
    decode_all(&mut session)
}
