//! Floating-point sample type shared by every buffer of an analysis session.
//!
//! One width is picked per build: [`Real`] is `f32` unless the `double`
//! feature is enabled. Contexts and tone estimates default to [`Real`] but
//! stay generic over [`Sample`] so tests can pin a width explicitly.

use num_traits::Float;
use rustfft::FftNum;
use std::fmt;

/// Build-wide sample type.
#[cfg(not(feature = "double"))]
pub type Real = f32;

/// Build-wide sample type.
#[cfg(feature = "double")]
pub type Real = f64;

/// A real sample usable for buffers, window coefficients and tone fields.
///
/// Iterative sums (Newton accumulators, normal equations) run in `f64`
/// regardless of the sample width; [`Sample::widen`] and [`Sample::narrow`]
/// move values across that boundary.
pub trait Sample: FftNum + Float + Default + fmt::Display {
    /// Convert to `f64` without loss.
    fn widen(self) -> f64;

    /// Convert from `f64`, rounding to the nearest representable value.
    fn narrow(value: f64) -> Self;
}

impl Sample for f32 {
    #[inline]
    fn widen(self) -> f64 {
        f64::from(self)
    }

    #[inline]
    fn narrow(value: f64) -> Self {
        value as f32
    }
}

impl Sample for f64 {
    #[inline]
    fn widen(self) -> f64 {
        self
    }

    #[inline]
    fn narrow(value: f64) -> Self {
        value
    }
}
