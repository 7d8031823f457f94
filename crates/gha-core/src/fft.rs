//! Forward real transform and the analysis window
//!
//! The estimator only needs the one-sided spectrum of a real frame to pick
//! its starting bin. [`SpectralTransform`] is the seam for that service;
//! [`RustFftTransform`] is the default implementation on top of `rustfft`.

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::f64::consts::PI;
use std::sync::Arc;

use crate::error::{Result, try_alloc};
use crate::sample::Sample;

/// Number of one-sided bins produced for a real frame of `size` samples.
pub const fn n_of_bins(size: usize) -> usize {
    size / 2 + 1
}

/// Forward transform of a real frame into its one-sided spectrum.
pub trait SpectralTransform<T: Sample> {
    /// Frame size the transform was planned for.
    fn size(&self) -> usize;

    /// Transform `input` (`size()` samples) into `output` (`size() / 2 + 1` bins).
    fn forward(&mut self, input: &[T], output: &mut [Complex<T>]);
}

/// `rustfft` forward plan with its own work and scratch buffers.
pub struct RustFftTransform<T: Sample> {
    fft: Arc<dyn Fft<T>>,
    work: Vec<Complex<T>>,
    scratch: Vec<Complex<T>>,
    size: usize,
}

impl<T: Sample> RustFftTransform<T> {
    /// Plan a forward transform for `size` real samples.
    pub fn new(size: usize) -> Result<Self> {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let zero = Complex::new(T::zero(), T::zero());
        let work = try_alloc("transform work buffer", size, zero)?;
        let scratch = try_alloc("transform scratch", fft.get_inplace_scratch_len(), zero)?;

        Ok(Self {
            fft,
            work,
            scratch,
            size,
        })
    }
}

impl<T: Sample> SpectralTransform<T> for RustFftTransform<T> {
    fn size(&self) -> usize {
        self.size
    }

    fn forward(&mut self, input: &[T], output: &mut [Complex<T>]) {
        for (dst, &x) in self.work.iter_mut().zip(input) {
            *dst = Complex::new(x, T::zero());
        }

        self.fft.process_with_scratch(&mut self.work, &mut self.scratch);

        // Real input: bins above Nyquist mirror the lower half
        let bins = n_of_bins(self.size).min(output.len());
        output[..bins].copy_from_slice(&self.work[..bins]);
    }
}

impl<T: Sample> std::fmt::Debug for RustFftTransform<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RustFftTransform")
            .field("size", &self.size)
            .field("fft", &"omitted")
            .finish()
    }
}

/// Fill `coeffs` with the half-sine analysis window.
///
/// `w[i] = sin(π·(i + 1) / (N + 1))`, strictly positive at both edges.
pub fn half_sine_window<T: Sample>(coeffs: &mut [T]) {
    let denom = (coeffs.len() + 1) as f64;
    for (i, c) in coeffs.iter_mut().enumerate() {
        *c = T::narrow((PI * (i + 1) as f64 / denom).sin());
    }
}

/// Index of the bin with the largest squared magnitude; the lowest index wins ties.
pub fn peak_bin<T: Sample>(spectrum: &[Complex<T>]) -> usize {
    let mut best = 0;
    let mut max = T::zero();
    for (i, c) in spectrum.iter().enumerate() {
        let power = c.re * c.re + c.im * c.im;
        if power > max {
            max = power;
            best = i;
        }
    }
    best
}
