//! Spectral analysis with power-of-two and Bluestein FFTs

pub mod bluestein;
pub mod engine;
pub mod analysis;

pub use engine::{SpectralEngine, SpectralPlan, SpectralStrategy};
pub use analysis::{AnalyzerConfig, HopAnalyzer, Spectrogram, DEFAULT_HOP_SIZE};
