//! Per-frame analysis state.

use rustfft::num_complex::Complex;

use crate::config::GhaConfig;
use crate::error::{GhaError, Result, try_alloc};
use crate::fft::{RustFftTransform, SpectralTransform, half_sine_window, n_of_bins};
use crate::observer::ResidualObserver;
use crate::sample::{Real, Sample};

/// Owns every buffer an analysis of a fixed-size frame needs.
///
/// A context is built once per frame size and reused for any number of
/// `analyze_one` / `extract_*` / `adjust_info*` calls on buffers of exactly
/// that size. All operations share `scratch`, so they take `&mut self`: the
/// borrow checker enforces the single-caller rule, and a context is not
/// meant to be shared across threads. Dropping it releases the transform
/// plan and all buffers.
///
/// # Example
///
/// ```rust,ignore
/// use gha_core::GhaContext;
///
/// let mut ctx = GhaContext::<f32>::new(512)?;
/// let tones = ctx.extract_many(&mut frame, 2)?;
/// ```
pub struct GhaContext<T: Sample = Real> {
    pub(crate) size: usize,
    pub(crate) window: Vec<T>,
    pub(crate) transform: Box<dyn SpectralTransform<T>>,
    pub(crate) scratch: Vec<T>,
    pub(crate) spectrum: Vec<Complex<T>>,
    pub(crate) config: GhaConfig,
    pub(crate) observer: Option<Box<dyn ResidualObserver<T>>>,
}

impl<T: Sample> GhaContext<T> {
    /// Create a context for frames of `size` samples with default configuration.
    ///
    /// `size` must be even and non-zero.
    pub fn new(size: usize) -> Result<Self> {
        Self::with_config(size, GhaConfig::default())
    }

    /// Create a context with an explicit configuration.
    pub fn with_config(size: usize, config: GhaConfig) -> Result<Self> {
        check_size(size)?;
        let transform = RustFftTransform::new(size)?;
        Self::with_transform(size, config, Box::new(transform))
    }

    /// Create a context around a caller-supplied spectral transform.
    pub fn with_transform(
        size: usize,
        config: GhaConfig,
        transform: Box<dyn SpectralTransform<T>>,
    ) -> Result<Self> {
        check_size(size)?;
        config.validate()?;
        if transform.size() != size {
            return Err(GhaError::TransformSize {
                expected: size,
                actual: transform.size(),
            });
        }

        let mut window = try_alloc("analysis window", size, T::zero())?;
        half_sine_window(&mut window);
        let scratch = try_alloc("scratch buffer", size, T::zero())?;
        let spectrum = try_alloc(
            "spectrum buffer",
            n_of_bins(size),
            Complex::new(T::zero(), T::zero()),
        )?;

        #[cfg(feature = "tracing")]
        tracing::debug!(size, ?config, "gha context created");

        Ok(Self {
            size,
            window,
            transform,
            scratch,
            spectrum,
            config,
            observer: None,
        })
    }

    /// Frame size in samples.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Analysis window coefficients.
    pub fn window(&self) -> &[T] {
        &self.window
    }

    /// Current configuration.
    pub fn config(&self) -> &GhaConfig {
        &self.config
    }

    /// Replace the whole configuration after validating it.
    pub fn set_config(&mut self, config: GhaConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Set both Newton loop counts. Zero is bumped to one.
    pub fn set_max_loops(&mut self, loops: usize) {
        self.config.analysis_loops = loops.max(1);
        self.config.adjust_loops = loops.max(1);
    }

    /// Set the single-tone Newton loop count. Zero is bumped to one.
    pub fn set_analysis_loops(&mut self, loops: usize) {
        self.config.analysis_loops = loops.max(1);
    }

    /// Set the joint refinement loop count. Zero is bumped to one.
    pub fn set_adjust_loops(&mut self, loops: usize) {
        self.config.adjust_loops = loops.max(1);
    }

    /// Set or clear the magnitude ceiling.
    ///
    /// Non-positive or non-finite ceilings clear it.
    pub fn set_max_magnitude(&mut self, max: Option<T>) {
        self.config.max_magnitude = max
            .map(Sample::widen)
            .filter(|m| m.is_finite() && *m > 0.0);
    }

    /// Register the residual observer, replacing any previous one.
    pub fn set_residual_observer(&mut self, observer: impl ResidualObserver<T> + 'static) {
        self.observer = Some(Box::new(observer));
    }

    /// Remove the residual observer.
    pub fn clear_residual_observer(&mut self) {
        self.observer = None;
    }

    /// Last regenerated sinusoid or joint residual, `size` samples.
    pub fn analyzed(&self) -> &[T] {
        &self.scratch
    }

    pub(crate) fn check_len(&self, len: usize) -> Result<()> {
        if len == self.size {
            Ok(())
        } else {
            Err(GhaError::LengthMismatch {
                expected: self.size,
                actual: len,
            })
        }
    }

    /// Report `residual` to the registered observer, if any.
    pub(crate) fn notify(&mut self, residual: &[T]) {
        if let Some(observer) = self.observer.as_mut() {
            observer.on_residual(residual);
        }
    }
}

impl<T: Sample> std::fmt::Debug for GhaContext<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GhaContext")
            .field("size", &self.size)
            .field("config", &self.config)
            .field("transform", &"omitted")
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

fn check_size(size: usize) -> Result<()> {
    if size == 0 || size % 2 != 0 {
        return Err(GhaError::InvalidSize { size });
    }
    Ok(())
}
