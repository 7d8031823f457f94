//! Tone estimates and their canonical ranges.

use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

use crate::sample::{Real, Sample};

/// One sinusoidal component: `magnitude · sin(frequency · n + phase)`.
///
/// `frequency` is angular, in radians per sample, kept in `[0, π]`.
/// `phase` is kept in `[0, 2π)` and `magnitude` is non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HarmonicInfo<T: Sample = Real> {
    /// Angular frequency in radians per sample.
    pub frequency: T,
    /// Phase in radians.
    pub phase: T,
    /// Amplitude (linear).
    pub magnitude: T,
}

impl<T: Sample> HarmonicInfo<T> {
    /// Create a tone from raw parameters (not canonicalized).
    pub fn new(frequency: T, phase: T, magnitude: T) -> Self {
        Self {
            frequency,
            phase,
            magnitude,
        }
    }

    /// Create a tone from a frequency in Hz at the given sample rate.
    pub fn from_hz(frequency_hz: f64, sample_rate: f64, phase: T, magnitude: T) -> Self {
        Self::new(T::narrow(TAU * frequency_hz / sample_rate), phase, magnitude)
    }

    /// Frequency in Hz at the given sample rate.
    pub fn frequency_hz(&self, sample_rate: f64) -> f64 {
        self.frequency.widen() * sample_rate / TAU
    }

    /// Value of the tone at sample index `n`.
    pub fn value_at(&self, n: usize) -> f64 {
        self.magnitude.widen() * (self.frequency.widen() * n as f64 + self.phase.widen()).sin()
    }
}

/// Fold an angular frequency into `[0, π]`.
///
/// Negative values are reflected, the result wrapped into `[0, 2π)`, and
/// anything above π mirrored to `2π − ω`.
pub fn fold_frequency(omega: f64) -> f64 {
    let omega = wrap_tau(omega.abs());
    if omega > PI { TAU - omega } else { omega }
}

/// Wrap a phase into `[0, 2π)`.
pub fn wrap_phase(phase: f64) -> f64 {
    wrap_tau(phase)
}

fn wrap_tau(x: f64) -> f64 {
    let r = x.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if r >= TAU { 0.0 } else { r }
}

/// Compare two phases, tolerating wraparound at 0 / 2π.
///
/// Phases match when they differ by less than `delta` directly, or after
/// both are shifted by π and reduced modulo 2π.
pub fn compare_phase(a: f64, b: f64, delta: f64) -> bool {
    if (a - b).abs() < delta {
        return true;
    }
    let a = (a + PI) % TAU;
    let b = (b + PI) % TAU;
    (a - b).abs() < delta
}

/// Sum the given tones into `out`, overwriting its contents.
pub fn synthesize<T: Sample>(tones: &[HarmonicInfo<T>], out: &mut [T]) {
    for (n, sample) in out.iter_mut().enumerate() {
        *sample = T::narrow(tones.iter().map(|t| t.value_at(n)).sum());
    }
}

/// Sum of squares of a signal.
pub fn residual_energy<T: Sample>(signal: &[T]) -> f64 {
    signal.iter().map(|&x| x.widen() * x.widen()).sum()
}

/// RMS level of a signal.
pub fn rms<T: Sample>(signal: &[T]) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    (residual_energy(signal) / signal.len() as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_keeps_first_nyquist_half() {
        assert!((fold_frequency(0.5) - 0.5).abs() < 1e-12);
        assert!((fold_frequency(-0.5) - 0.5).abs() < 1e-12);
        assert!((fold_frequency(TAU - 0.5) - 0.5).abs() < 1e-12);
        assert!((fold_frequency(TAU + 0.5) - 0.5).abs() < 1e-12);
        assert!((fold_frequency(PI) - PI).abs() < 1e-12);
    }

    #[test]
    fn wrap_phase_range() {
        assert!((wrap_phase(-0.5) - (TAU - 0.5)).abs() < 1e-12);
        assert!((wrap_phase(TAU + 1.0) - 1.0).abs() < 1e-12);
        assert_eq!(wrap_phase(0.0), 0.0);
        let tiny = wrap_phase(-1e-300);
        assert!((0.0..TAU).contains(&tiny));
    }

    #[test]
    fn compare_phase_accepts_wraparound() {
        assert!(compare_phase(1.0, 1.0005, 0.001));
        assert!(!compare_phase(1.0, 1.1, 0.001));
        // Just above 0 and just below 2π meet after the π shift
        assert!(compare_phase(0.0001, TAU - 0.0001, 0.001));
        assert!(!compare_phase(0.5, TAU - 0.5, 0.001));
    }

    #[test]
    fn hz_conversion_roundtrip() {
        let tone = HarmonicInfo::<f64>::from_hz(697.0, 8000.0, 0.0, 1.0);
        assert!((tone.frequency_hz(8000.0) - 697.0).abs() < 1e-9);
    }

    #[test]
    fn synthesize_sums_tones() {
        let tones = [
            HarmonicInfo::<f64>::new(0.3, 0.2, 0.5),
            HarmonicInfo::new(1.1, 2.0, 0.25),
        ];
        let mut out = vec![0.0; 16];
        synthesize(&tones, &mut out);
        for (n, &v) in out.iter().enumerate() {
            let want = 0.5 * (0.3 * n as f64 + 0.2).sin() + 0.25 * (1.1 * n as f64 + 2.0).sin();
            assert!((v - want).abs() < 1e-12);
        }
    }

    #[test]
    fn rms_of_unit_square_wave() {
        let signal = [1.0f32, -1.0, 1.0, -1.0];
        assert!((rms(&signal) - 1.0).abs() < 1e-12);
        assert_eq!(residual_energy(&signal), 4.0);
        assert_eq!(rms::<f32>(&[]), 0.0);
    }
}
