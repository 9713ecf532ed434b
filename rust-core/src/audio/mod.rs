//! Audio decoding, PCM buffering and hop segmentation

pub mod buffer;
pub mod decoder;
pub mod channel;
pub mod hops;

pub use buffer::AudioBuffer;
pub use decoder::{decode_all, decode_file, DecodeError, PcmDecoder, SymphoniaDecoder};
pub use channel::{extract_channel, MonoSamples};
pub use hops::{Hop, Hops};
