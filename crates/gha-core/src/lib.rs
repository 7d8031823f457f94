//! GHA Core - Generalized Harmonic Analysis
//!
//! Extracts sinusoidal components (angular frequency, phase, amplitude) from
//! a fixed-size frame with sub-bin frequency resolution, and refines a set of
//! them jointly against the original frame.
//!
//! - [`context`] - [`GhaContext`], the per-frame-size analysis state
//! - [`estimate`] - single-tone estimation (`analyze_one`)
//! - [`extract`] - sequential extraction by residual subtraction
//! - [`adjust`] - joint multi-tone Newton refinement
//! - [`solver`] - dense Gaussian elimination used by the refinement
//! - [`fft`] - spectral transform seam, window, peak picking
//! - [`info`] - [`HarmonicInfo`] and phase/frequency helpers
//! - [`config`] - tunables, loadable from TOML
//!
//! ## Numeric width
//!
//! Contexts are generic over [`Sample`] (`f32` or `f64`). [`Real`] is the
//! build-wide default: `f32`, or `f64` with the `double` feature. Internal
//! sums are always accumulated in `f64`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use gha_core::{GhaContext, compare_phase};
//!
//! let mut ctx = GhaContext::<f64>::new(512)?;
//!
//! // Strongest tone, input untouched
//! let tone = ctx.analyze_one(&frame)?;
//!
//! // Two tones, refined together; `frame` becomes the residual
//! let tones = ctx.extract_many_adjusted(&mut frame, 2)?;
//! for t in &tones {
//!     println!("{:.1} Hz", t.frequency_hz(8000.0));
//! }
//! ```
//!
//! ## Residual observer
//!
//! ```rust,ignore
//! let mut ctx = GhaContext::<f32>::new(256)?;
//! ctx.set_residual_observer(|r: &[f32]| {
//!     println!("residual rms {}", gha_core::rms(r));
//! });
//! ```

pub mod adjust;
pub mod config;
pub mod context;
pub mod error;
pub mod estimate;
pub mod extract;
pub mod fft;
pub mod info;
pub mod observer;
pub mod sample;
pub mod solver;

pub use adjust::AdjustOptions;
pub use config::GhaConfig;
pub use context::GhaContext;
pub use error::{ConfigError, GhaError, Result, SolveError};
pub use fft::{RustFftTransform, SpectralTransform};
pub use info::{
    HarmonicInfo, compare_phase, fold_frequency, residual_energy, rms, synthesize, wrap_phase,
};
pub use observer::ResidualObserver;
pub use sample::{Real, Sample};
pub use solver::solve;
