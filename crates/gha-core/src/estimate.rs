//! Single-tone estimation
//!
//! The dominant bin of the windowed frame seeds a Newton search for the
//! angular frequency that maximizes `|X(ω)|²`, where `X(ω)` is the Fourier
//! sum of the windowed frame evaluated directly (not through the FFT). The
//! phase comes from `X` at the converged frequency, and the magnitude from a
//! least-squares projection of the unwindowed frame onto the regenerated
//! sinusoid.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use crate::context::GhaContext;
use crate::error::Result;
use crate::fft::peak_bin;
use crate::info::{HarmonicInfo, fold_frequency, wrap_phase};
use crate::sample::Sample;

/// Result of the Newton frequency search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct NewtonEstimate {
    /// Angular frequency in `[0, π]`.
    pub omega: f64,
    /// Phase of `sin(ω·n + φ)` derived from `X(ω)`.
    pub phase: f64,
}

/// `X(ω)` and its first two derivatives with respect to `ω`.
#[derive(Debug, Clone, Copy, Default)]
struct FourierSums {
    re: f64,
    im: f64,
    d_re: f64,
    d_im: f64,
    dd_re: f64,
    dd_im: f64,
}

impl FourierSums {
    /// Evaluate at `omega` with a rotating phasor instead of per-sample trig calls.
    fn at<T: Sample>(signal: &[T], omega: f64) -> Self {
        let (b, a) = omega.sin_cos();
        let mut c = 1.0;
        let mut s = 0.0;
        let mut sums = Self::default();

        for (n, &x) in signal.iter().enumerate() {
            let n = n as f64;
            let x = x.widen();
            let cm = x * c;
            let sm = x * s;
            sums.re += cm;
            sums.im += sm;
            let tc = n * cm;
            let ts = n * sm;
            sums.d_re -= ts;
            sums.d_im += tc;
            sums.dd_re -= n * tc;
            sums.dd_im -= n * ts;

            let next_c = a * c - b * s;
            let next_s = b * c + a * s;
            c = next_c;
            s = next_s;
        }
        sums
    }

    /// Newton step on the gradient of `|X(ω)|²`.
    fn newton_step(&self) -> f64 {
        let f = self.re * self.d_re + self.im * self.d_im;
        let g2 = self.re * self.re + self.im * self.im;
        let df = self.re * self.dd_re
            + self.d_re * self.d_re
            + self.im * self.dd_im
            + self.d_im * self.d_im;
        f / (df - f * f / g2)
    }

    /// Phase of a sine whose Fourier sum is `X`.
    fn sine_phase(&self) -> f64 {
        if self.re == 0.0 && self.im == 0.0 {
            return 0.0;
        }
        let mut phase = FRAC_PI_2 - (self.im / self.re).atan();
        if self.re < 0.0 {
            phase += PI;
        }
        phase
    }
}

/// Run exactly `loops` Newton iterations from `bin` (fewer when `tolerance` is met).
///
/// The phase is derived from the Fourier sums of the final iteration.
pub(crate) fn search_omega_newton<T: Sample>(
    windowed: &[T],
    bin: usize,
    loops: usize,
    tolerance: Option<f64>,
) -> NewtonEstimate {
    let mut omega = TAU * bin as f64 / windowed.len() as f64;
    let mut phase = 0.0;
    let loops = loops.max(1);

    for iteration in 0..loops {
        let sums = FourierSums::at(windowed, omega);
        // Flat |X|² (silence) gives 0/0; stay on the seed
        let step = Some(sums.newton_step())
            .filter(|s| s.is_finite())
            .unwrap_or(0.0);
        omega = fold_frequency(omega - step);

        #[cfg(feature = "tracing")]
        tracing::trace!(iteration, omega, step, "newton frequency step");

        let converged = tolerance.is_some_and(|tol| step.abs() < tol);
        if iteration + 1 == loops || converged {
            phase = sums.sine_phase();
            break;
        }
    }

    NewtonEstimate { omega, phase }
}

/// Fill `buf` with `sin(omega·n + phase)`.
pub(crate) fn generate_sine<T: Sample>(buf: &mut [T], omega: f64, phase: f64) {
    for (n, sample) in buf.iter_mut().enumerate() {
        *sample = T::narrow((omega * n as f64 + phase).sin());
    }
}

/// Least-squares amplitude of `regen` in `pcm`: `Σ pcm·regen / Σ regen²`.
pub(crate) fn project_magnitude<T: Sample>(pcm: &[T], regen: &[T]) -> f64 {
    let (num, den) = pcm
        .iter()
        .zip(regen)
        .fold((0.0, 0.0), |(num, den), (&p, &r)| {
            let r = r.widen();
            (num + p.widen() * r, den + r * r)
        });
    if den == 0.0 { 0.0 } else { num / den }
}

impl<T: Sample> GhaContext<T> {
    /// Estimate the dominant tone of `pcm` without modifying it.
    ///
    /// Afterwards [`analyzed`](Self::analyzed) holds the unit-amplitude
    /// sinusoid at the returned frequency and phase.
    pub fn analyze_one(&mut self, pcm: &[T]) -> Result<HarmonicInfo<T>> {
        self.check_len(pcm.len())?;

        for ((dst, &x), &w) in self.scratch.iter_mut().zip(pcm).zip(&self.window) {
            *dst = x * w;
        }

        self.transform.forward(&self.scratch, &mut self.spectrum);
        let bin = peak_bin(&self.spectrum);

        let estimate = search_omega_newton(
            &self.scratch,
            bin,
            self.config.analysis_loops,
            self.config.convergence_tolerance,
        );

        generate_sine(&mut self.scratch, estimate.omega, estimate.phase);
        let mut magnitude = project_magnitude(pcm, &self.scratch);
        let mut phase = estimate.phase;

        if magnitude < 0.0 {
            magnitude = -magnitude;
            phase += PI;
            for sample in &mut self.scratch {
                *sample = -*sample;
            }
        }
        if let Some(max) = self.config.max_magnitude {
            magnitude = magnitude.min(max);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            bin,
            frequency = estimate.omega,
            phase,
            magnitude,
            "analyzed tone"
        );

        Ok(HarmonicInfo::new(
            T::narrow(estimate.omega),
            T::narrow(wrap_phase(phase)),
            T::narrow(magnitude),
        ))
    }
}
