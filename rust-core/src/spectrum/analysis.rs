//! Hop-by-hop spectral analysis
//!
//! Runs the spectral engine over every hop of a mono signal and stores each
//! hop's magnitudes in its own row of a [hop, bin] table.

use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;
use std::sync::Arc;

use super::engine::{SpectralEngine, SpectralPlan};
use crate::audio::channel::MonoSamples;
use crate::audio::hops::{hop_count, Hop};
use crate::error::{try_filled, HopscanError, Result};

/// Default hop length in samples (~3.33 s at 48 kHz)
pub const DEFAULT_HOP_SIZE: usize = 159_840;

/// Analyzer configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerConfig {
    /// Samples per hop, any positive length
    pub hop_size: usize,

    /// Interleaved channel to analyze
    pub channel: usize,

    /// Process hops on the rayon thread pool
    pub parallel: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            hop_size: DEFAULT_HOP_SIZE,
            channel: 0,
            parallel: false,
        }
    }
}

/// Magnitude spectra of consecutive hops
#[derive(Debug, Clone)]
pub struct Spectrogram {
    /// magnitudes[[hop, bin]]
    magnitudes: Array2<f64>,
    hop_size: usize,
    sample_rate: u32,
}

impl Spectrogram {
    pub fn hop_count(&self) -> usize {
        self.magnitudes.nrows()
    }

    /// Bins per hop, hop_size/2 + 1
    pub fn bin_count(&self) -> usize {
        self.magnitudes.ncols()
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn magnitudes(&self) -> &Array2<f64> {
        &self.magnitudes
    }

    pub fn into_magnitudes(self) -> Array2<f64> {
        self.magnitudes
    }

    /// Magnitude row of one hop
    pub fn hop(&self, index: usize) -> Option<ArrayView1<'_, f64>> {
        (index < self.hop_count()).then(|| self.magnitudes.row(index))
    }

    pub fn magnitude(&self, hop: usize, bin: usize) -> Option<f64> {
        self.magnitudes.get((hop, bin)).copied()
    }

    /// Centre frequency of a bin in Hz
    pub fn bin_frequency_hz(&self, bin: usize) -> f64 {
        bin as f64 * self.sample_rate as f64 / self.hop_size as f64
    }

    /// Start time of a hop in seconds
    pub fn hop_start_secs(&self, hop: usize) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        (hop as f64 * self.hop_size as f64) / self.sample_rate as f64
    }

    /// Strongest bin of a hop (lowest index on ties)
    pub fn peak_bin(&self, hop: usize) -> Option<usize> {
        let row = self.hop(hop)?;
        let mut best: Option<(usize, f64)> = None;
        for (bin, &m) in row.iter().enumerate() {
            if best.map_or(true, |(_, b)| m > b) {
                best = Some((bin, m));
            }
        }
        best.map(|(bin, _)| bin)
    }
}

/// Hops per parallel job: an even split of `rows` over `threads`, at least 1
fn hops_per_job(rows: usize, threads: usize) -> usize {
    rows.div_ceil(threads.max(1)).max(1)
}

/// Runs the spectral engine across all hops of a signal
pub struct HopAnalyzer {
    config: AnalyzerConfig,
    engine: SpectralEngine,
}

impl HopAnalyzer {
    /// Build the spectral plan and scratch for `config.hop_size`
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        let engine = SpectralEngine::new(config.hop_size)?;
        Ok(Self { config, engine })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn plan(&self) -> &Arc<SpectralPlan> {
        self.engine.plan()
    }

    /// Number of bins per hop
    pub fn num_bins(&self) -> usize {
        self.engine.num_bins()
    }

    /// Compute the magnitude spectrum of every complete hop
    pub fn analyze(&mut self, mono: &MonoSamples) -> Result<Spectrogram> {
        let hop_size = self.config.hop_size;
        let bins = self.num_bins();
        let hops = mono.hops(hop_size)?;
        let rows = hop_count(mono.len(), hop_size);

        let cells = rows.checked_mul(bins).ok_or(HopscanError::OutOfMemory {
            what: "spectrogram",
            requested: usize::MAX,
        })?;
        let mut table = try_filled(cells, 0.0, "spectrogram")?;

        log::debug!(
            "Analyzing {} hops of {} samples ({} bins each, {})",
            rows,
            hop_size,
            bins,
            if self.config.parallel { "parallel" } else { "sequential" }
        );

        if self.config.parallel {
            let windows: Vec<Hop<'_>> = hops.collect();
            let plan = Arc::clone(self.engine.plan());
            let job_len = hops_per_job(rows, rayon::current_num_threads());

            // One engine per job: scratch is allocated per job, not per hop
            table
                .par_chunks_mut(bins * job_len)
                .zip(windows.par_chunks(job_len))
                .try_for_each(|(block, job)| {
                    let mut engine = SpectralEngine::from_plan(Arc::clone(&plan))?;
                    for (row, hop) in block.chunks_exact_mut(bins).zip(job) {
                        engine.transform_into(hop.samples, row)?;
                    }
                    Ok::<(), HopscanError>(())
                })?;
        } else {
            for (row, hop) in table.chunks_exact_mut(bins).zip(hops) {
                self.engine.transform_into(hop.samples, row)?;
            }
        }

        let magnitudes = Array2::from_shape_vec((rows, bins), table).map_err(|e| {
            HopscanError::InvalidArgument(format!("spectrogram shape: {}", e))
        })?;

        Ok(Spectrogram {
            magnitudes,
            hop_size,
            sample_rate: mono.sample_rate(),
        })
    }
}
