//! Magnitude spectrum engine for fixed-length hops
//!
//! The transform strategy is resolved once per hop size: power-of-two sizes
//! use a realfft real-to-complex plan directly, any other size goes through
//! Bluestein. Precomputed plans live in an immutable [`SpectralPlan`] that can
//! be shared between threads; each [`SpectralEngine`] owns its own buffers.

use realfft::{RealFftPlanner, RealToComplex};
use num_complex::Complex;
use std::sync::Arc;

use super::bluestein::Bluestein;
use crate::error::{try_filled, HopscanError, Result};

/// Transform strategy for one hop size
#[derive(Clone)]
pub enum SpectralStrategy {
    PowerOfTwo(Arc<dyn RealToComplex<f64>>),
    Bluestein(Bluestein),
}

impl SpectralStrategy {
    /// Pick and precompute the strategy for `hop_size`-point transforms
    pub fn for_len(hop_size: usize) -> Result<Self> {
        if hop_size == 0 {
            return Err(HopscanError::InvalidArgument(
                "hop size must be positive".to_string(),
            ));
        }

        if hop_size.is_power_of_two() {
            let mut planner = RealFftPlanner::<f64>::new();
            Ok(Self::PowerOfTwo(planner.plan_fft_forward(hop_size)))
        } else {
            Ok(Self::Bluestein(Bluestein::new(hop_size)?))
        }
    }

    /// Real input copy consumed by the transform
    fn input_len(&self) -> usize {
        match self {
            Self::PowerOfTwo(r2c) => r2c.len(),
            Self::Bluestein(_) => 0,
        }
    }

    /// Complex convolution buffer
    fn work_len(&self) -> usize {
        match self {
            Self::PowerOfTwo(_) => 0,
            Self::Bluestein(b) => b.conv_len(),
        }
    }

    /// Scratch required by the underlying FFT plans
    fn fft_scratch_len(&self) -> usize {
        match self {
            Self::PowerOfTwo(r2c) => r2c.get_scratch_len(),
            Self::Bluestein(b) => b.fft_scratch_len(),
        }
    }

    /// Complex elements of scratch one engine allocates
    pub fn scratch_len(&self) -> usize {
        self.work_len() + self.fft_scratch_len()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::PowerOfTwo(_) => "power-of-two",
            Self::Bluestein(_) => "bluestein",
        }
    }
}

/// Read-only plans for one hop size
pub struct SpectralPlan {
    hop_size: usize,
    strategy: SpectralStrategy,
}

impl SpectralPlan {
    pub fn new(hop_size: usize) -> Result<Self> {
        let strategy = SpectralStrategy::for_len(hop_size)?;
        log::debug!(
            "Spectral plan for {} samples: {} ({} bins)",
            hop_size,
            strategy.name(),
            hop_size / 2 + 1
        );
        Ok(Self { hop_size, strategy })
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// One-sided bin count, hop_size/2 + 1
    pub fn num_bins(&self) -> usize {
        self.hop_size / 2 + 1
    }

    pub fn strategy(&self) -> &SpectralStrategy {
        &self.strategy
    }
}

/// Computes one-sided magnitude spectra, reusing buffers across calls
pub struct SpectralEngine {
    plan: Arc<SpectralPlan>,

    /// Copy of the window (realfft overwrites its input)
    input: Vec<f64>,

    /// Bluestein convolution buffer
    work: Vec<Complex<f64>>,

    /// Scratch for the FFT plans
    fft_scratch: Vec<Complex<f64>>,

    /// Frequency-domain bins (num_bins)
    bins: Vec<Complex<f64>>,
}

impl SpectralEngine {
    /// Plan and allocate an engine for `hop_size`-sample windows
    pub fn new(hop_size: usize) -> Result<Self> {
        Self::from_plan(Arc::new(SpectralPlan::new(hop_size)?))
    }

    /// Engine with private buffers over a shared plan
    pub fn from_plan(plan: Arc<SpectralPlan>) -> Result<Self> {
        let zero = Complex::new(0.0, 0.0);
        let strategy = &plan.strategy;
        let input = try_filled(strategy.input_len(), 0.0, "FFT input buffer")?;
        let work = try_filled(strategy.work_len(), zero, "chirp convolution buffer")?;
        let fft_scratch = try_filled(strategy.fft_scratch_len(), zero, "FFT scratch buffer")?;
        let bins = try_filled(plan.num_bins(), zero, "FFT output buffer")?;

        Ok(Self {
            plan,
            input,
            work,
            fft_scratch,
            bins,
        })
    }

    pub fn plan(&self) -> &Arc<SpectralPlan> {
        &self.plan
    }

    pub fn hop_size(&self) -> usize {
        self.plan.hop_size
    }

    pub fn num_bins(&self) -> usize {
        self.plan.num_bins()
    }

    /// Magnitude spectrum |X[k]| for k = 0..=hop_size/2
    pub fn transform(&mut self, window: &[f64]) -> Result<Vec<f64>> {
        let mut magnitudes = try_filled(self.num_bins(), 0.0, "magnitude buffer")?;
        self.transform_into(window, &mut magnitudes)?;
        Ok(magnitudes)
    }

    /// Write the magnitude spectrum of `window` into `out`
    ///
    /// # Arguments
    /// * `window` - Exactly hop_size samples
    /// * `out` - Exactly hop_size/2 + 1 slots
    pub fn transform_into(&mut self, window: &[f64], out: &mut [f64]) -> Result<()> {
        if window.len() != self.hop_size() {
            return Err(HopscanError::InvalidArgument(format!(
                "window has {} samples, expected {}",
                window.len(),
                self.hop_size()
            )));
        }
        if out.len() != self.num_bins() {
            return Err(HopscanError::InvalidArgument(format!(
                "output has {} bins, expected {}",
                out.len(),
                self.num_bins()
            )));
        }

        match &self.plan.strategy {
            SpectralStrategy::PowerOfTwo(r2c) => {
                self.input.copy_from_slice(window);
                r2c.process_with_scratch(&mut self.input, &mut self.bins, &mut self.fft_scratch)
                    .map_err(|e| HopscanError::InvalidArgument(format!("real FFT: {}", e)))?;
            }
            SpectralStrategy::Bluestein(bluestein) => {
                bluestein.process_real(
                    window,
                    &mut self.work,
                    &mut self.fft_scratch,
                    &mut self.bins,
                );
            }
        }

        // norm() is hypot: no overflow for finite input
        for (m, c) in out.iter_mut().zip(&self.bins) {
            *m = c.norm();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine(freq_hz: f64, sample_rate: f64, amplitude: f64, len: usize) -> Vec<f64> {
        (0..len)
            .map(|n| amplitude * (2.0 * PI * freq_hz * n as f64 / sample_rate).sin())
            .collect()
    }

    fn peak_bin(spectrum: &[f64]) -> (usize, f64) {
        spectrum
            .iter()
            .copied()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .unwrap()
    }

    #[test]
    fn test_strategy_selection() {
        assert!(matches!(
            SpectralStrategy::for_len(1024).unwrap(),
            SpectralStrategy::PowerOfTwo(_)
        ));
        assert!(matches!(
            SpectralStrategy::for_len(1000).unwrap(),
            SpectralStrategy::Bluestein(_)
        ));
        assert!(matches!(
            SpectralStrategy::for_len(0),
            Err(HopscanError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_bin_count() {
        assert_eq!(SpectralEngine::new(1024).unwrap().num_bins(), 513);
        assert_eq!(SpectralEngine::new(1001).unwrap().num_bins(), 501);
        assert_eq!(SpectralEngine::new(159_840).unwrap().num_bins(), 79_921);
    }

    #[test]
    fn test_power_of_two_matches_naive_dft() {
        let signal: Vec<f64> = (0..256).map(|i| ((i * 37) % 101) as f64 - 50.0).collect();

        let mut engine = SpectralEngine::new(256).unwrap();
        let magnitudes = engine.transform(&signal).unwrap();
        assert_eq!(magnitudes.len(), 129);

        for (k, &got) in magnitudes.iter().enumerate() {
            let want: Complex<f64> = signal
                .iter()
                .enumerate()
                .map(|(n, &x)| Complex::from_polar(x, -2.0 * PI * ((k * n) % 256) as f64 / 256.0))
                .sum();
            assert!(
                (got - want.norm()).abs() <= 1e-9 * want.norm().max(1.0),
                "bin {}: {} vs {}",
                k,
                got,
                want.norm()
            );
        }
    }

    #[test]
    fn test_bluestein_agrees_with_power_of_two_path() {
        for &len in &[8usize, 256, 4096] {
            let signal: Vec<f64> = (0..len)
                .map(|i| (i as f64 * 0.05).cos() * 3000.0 - (i % 13) as f64 * 40.0)
                .collect();

            let mut direct_engine = SpectralEngine::new(len).unwrap();
            assert_eq!(direct_engine.plan().strategy().name(), "power-of-two");
            let direct = direct_engine.transform(&signal).unwrap();

            let bluestein = Bluestein::new(len).unwrap();
            let mut work = vec![Complex::new(0.0, 0.0); bluestein.conv_len()];
            let mut fft_scratch = vec![Complex::new(0.0, 0.0); bluestein.fft_scratch_len()];
            let mut bins = vec![Complex::new(0.0, 0.0); len / 2 + 1];
            bluestein.process_real(&signal, &mut work, &mut fft_scratch, &mut bins);

            let scale = direct.iter().copied().fold(0.0, f64::max);
            for (k, (d, b)) in direct.iter().zip(&bins).enumerate() {
                let err = (d - b.norm()).abs() / scale;
                assert!(err < 1e-9, "N = {}, bin {}: relative error {}", len, k, err);
            }
        }
    }

    #[test]
    fn test_power_of_two_reuses_buffers() {
        // Second call must not see state left by the first (realfft clobbers its input)
        let mut engine = SpectralEngine::new(64).unwrap();
        let impulse: Vec<f64> = (0..64).map(|i| if i == 0 { 1.0 } else { 0.0 }).collect();
        engine.transform(&[5.0; 64]).unwrap();
        let flat = engine.transform(&impulse).unwrap();

        assert!(flat.iter().all(|&m| (m - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_sine_peak_bin() {
        for &len in &[1024usize, 1000, 1323] {
            let mut engine = SpectralEngine::new(len).unwrap();
            let signal = sine(440.0, 44100.0, 1.0, len);
            let (bin, _) = peak_bin(&engine.transform(&signal).unwrap());

            let expected = (440.0 * len as f64 / 44100.0).round() as usize;
            assert_eq!(bin, expected, "hop size {}", len);
        }
    }

    #[test]
    fn test_peak_scales_linearly() {
        let mut engine = SpectralEngine::new(1000).unwrap();
        let (bin1, mag1) = peak_bin(&engine.transform(&sine(1000.0, 8000.0, 1.0, 1000)).unwrap());
        let (bin5, mag5) = peak_bin(&engine.transform(&sine(1000.0, 8000.0, 5.0, 1000)).unwrap());

        assert_eq!(bin1, 125);
        assert_eq!(bin1, bin5);
        assert!((mag5 / mag1 - 5.0).abs() < 1e-9);
        // On-bin sine: |X| = A·N/2
        assert!((mag1 - 500.0).abs() < 1e-6);
    }

    #[test]
    fn test_transform_is_deterministic() {
        let signal: Vec<f64> = (0..1500).map(|i| ((i * 7) % 23) as f64).collect();
        let mut engine = SpectralEngine::new(1500).unwrap();

        let first = engine.transform(&signal).unwrap();
        let second = engine.transform(&signal).unwrap();
        assert_eq!(
            first.iter().map(|x| x.to_bits()).collect::<Vec<_>>(),
            second.iter().map(|x| x.to_bits()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_extreme_input_stays_finite() {
        let signal: Vec<f64> = (0..777)
            .map(|i| if i % 2 == 0 { 32767.0 } else { -32768.0 })
            .collect();
        let mut engine = SpectralEngine::new(777).unwrap();

        for m in engine.transform(&signal).unwrap() {
            assert!(m.is_finite() && m >= 0.0);
        }
    }

    #[test]
    fn test_dc_and_wrong_length() {
        let mut engine = SpectralEngine::new(12).unwrap();
        let magnitudes = engine.transform(&[2.0; 12]).unwrap();
        assert!((magnitudes[0] - 24.0).abs() < 1e-9);
        assert!(magnitudes[1..].iter().all(|&m| m < 1e-9));

        assert!(matches!(
            engine.transform(&[1.0; 11]),
            Err(HopscanError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_shared_plan() {
        let plan = Arc::new(SpectralPlan::new(300).unwrap());
        let mut a = SpectralEngine::from_plan(Arc::clone(&plan)).unwrap();
        let mut b = SpectralEngine::from_plan(Arc::clone(&plan)).unwrap();

        let signal = sine(50.0, 300.0, 2.0, 300);
        assert_eq!(a.transform(&signal).unwrap(), b.transform(&signal).unwrap());
        assert_eq!(plan.strategy().name(), "bluestein");
    }
}
