//! Arbitrary-length DFT via Bluestein's chirp z-transform
//!
//! Rewrites nk = (n² + k² - (k-n)²) / 2 so that a length-N DFT becomes a
//! circular convolution with the chirp e^(+iπj²/N), evaluated with
//! power-of-two transforms of length M = next_power_of_two(2N-1). The
//! transform of the convolution kernel is computed once and reused for every
//! input.

use rustfft::{num_complex::Complex, Fft, FftPlanner, Length};
use std::f64::consts::PI;
use std::sync::Arc;

use crate::error::{try_filled, HopscanError, Result};

#[derive(Clone)]
pub struct Bluestein {
    len: usize,

    /// e^(-iπk²/N) for k in 0..N
    chirp: Vec<Complex<f64>>,

    /// FFT of the wrapped conjugate chirp, length M
    kernel_fft: Vec<Complex<f64>>,

    /// Forward and inverse plans of length M
    fft: Arc<dyn Fft<f64>>,
    ifft: Arc<dyn Fft<f64>>,
}

/// e^(-iπk²/N), with k² reduced modulo 2N before entering floating point
fn chirp_at(k: usize, len: usize) -> Complex<f64> {
    let period = 2 * len as u128;
    let k2 = (k as u128 * k as u128) % period;
    Complex::from_polar(1.0, -PI * k2 as f64 / len as f64)
}

impl Bluestein {
    /// Precompute chirp and kernel tables for a length-`len` transform
    pub fn new(len: usize) -> Result<Self> {
        if len == 0 {
            return Err(HopscanError::InvalidArgument(
                "transform length must be positive".to_string(),
            ));
        }

        let conv_len = (2 * len - 1).next_power_of_two();
        debug_assert!(conv_len >= 2 * len - 1);

        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(conv_len);
        let ifft = planner.plan_fft_inverse(conv_len);

        let zero = Complex::new(0.0, 0.0);
        let mut chirp = try_filled(len, zero, "chirp table")?;
        for (k, c) in chirp.iter_mut().enumerate() {
            *c = chirp_at(k, len);
        }

        // Even kernel b[j] = conj(chirp[|j|]) wrapped onto 0..M
        let mut kernel_fft = try_filled(conv_len, zero, "chirp kernel")?;
        kernel_fft[0] = chirp[0].conj();
        for k in 1..len {
            let b = chirp[k].conj();
            kernel_fft[k] = b;
            kernel_fft[conv_len - k] = b;
        }
        fft.process(&mut kernel_fft);

        log::debug!("Bluestein plan: N = {}, M = {}", len, conv_len);

        Ok(Self {
            len,
            chirp,
            kernel_fft,
            fft,
            ifft,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Convolution length M
    pub fn conv_len(&self) -> usize {
        self.fft.len()
    }

    /// Scratch the length-M plans need on top of the work buffer
    pub fn fft_scratch_len(&self) -> usize {
        self.fft
            .get_inplace_scratch_len()
            .max(self.ifft.get_inplace_scratch_len())
    }

    /// Compute the first `output.len()` DFT bins of a real input
    ///
    /// # Arguments
    /// * `input` - Exactly `len` real samples
    /// * `work` - Convolution buffer of `conv_len` elements, overwritten
    /// * `fft_scratch` - At least `fft_scratch_len` elements, overwritten
    /// * `output` - Receives X[0..output.len()], at most `len` bins
    pub fn process_real(
        &self,
        input: &[f64],
        work: &mut [Complex<f64>],
        fft_scratch: &mut [Complex<f64>],
        output: &mut [Complex<f64>],
    ) {
        assert_eq!(input.len(), self.len, "Bluestein input length mismatch");
        assert!(output.len() <= self.len);

        // A[k] = x[k]·chirp[k], zero-padded to M
        let (head, tail) = work.split_at_mut(self.len);
        for ((a, &x), &c) in head.iter_mut().zip(input).zip(&self.chirp) {
            *a = c * x;
        }
        tail.fill(Complex::new(0.0, 0.0));

        let fft_scratch = &mut fft_scratch[..self.fft_scratch_len()];
        self.fft.process_with_scratch(work, fft_scratch);
        for (a, &b) in work.iter_mut().zip(&self.kernel_fft) {
            *a *= b;
        }
        self.ifft.process_with_scratch(work, fft_scratch);

        // rustfft's inverse is unnormalized
        let scale = 1.0 / self.conv_len() as f64;
        for ((out, &conv), &c) in output.iter_mut().zip(work.iter()).zip(&self.chirp) {
            *out = conv * c * scale;
        }
    }
}
