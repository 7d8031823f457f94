//! Analysis configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// Default Newton iteration count for single-tone analysis.
pub const DEFAULT_ANALYSIS_LOOPS: usize = 8;

/// Default iteration count for joint multi-tone refinement.
pub const DEFAULT_ADJUST_LOOPS: usize = 7;

/// Default step multiplier applied to each joint Newton update.
pub const DEFAULT_DAMPING: f64 = 0.8;

/// Loop bounds and limits consulted by the estimator and the optimizer.
///
/// Both Newton loops run a fixed number of iterations unless
/// `convergence_tolerance` is set.
///
/// # TOML Format
///
/// ```toml
/// analysis_loops = 8
/// adjust_loops = 7
/// max_magnitude = 1.0
/// damping = 0.8
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GhaConfig {
    /// Newton iterations on angular frequency per analyzed tone.
    pub analysis_loops: usize,

    /// Joint refinement iterations per `adjust_info` call.
    pub adjust_loops: usize,

    /// Magnitude ceiling; `None` leaves magnitudes unclamped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_magnitude: Option<f64>,

    /// Fraction of each joint Newton step that is applied.
    pub damping: f64,

    /// Stop a Newton loop early once its largest update falls below this.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub convergence_tolerance: Option<f64>,
}

impl Default for GhaConfig {
    fn default() -> Self {
        Self {
            analysis_loops: DEFAULT_ANALYSIS_LOOPS,
            adjust_loops: DEFAULT_ADJUST_LOOPS,
            max_magnitude: None,
            damping: DEFAULT_DAMPING,
            convergence_tolerance: None,
        }
    }
}

impl GhaConfig {
    /// Set both loop counts.
    pub fn with_max_loops(mut self, loops: usize) -> Self {
        self.analysis_loops = loops;
        self.adjust_loops = loops;
        self
    }

    /// Set the single-tone Newton iteration count.
    pub fn with_analysis_loops(mut self, loops: usize) -> Self {
        self.analysis_loops = loops;
        self
    }

    /// Set the joint refinement iteration count.
    pub fn with_adjust_loops(mut self, loops: usize) -> Self {
        self.adjust_loops = loops;
        self
    }

    /// Set the magnitude ceiling.
    pub fn with_max_magnitude(mut self, max: Option<f64>) -> Self {
        self.max_magnitude = max;
        self
    }

    /// Set the joint update damping factor.
    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = damping;
        self
    }

    /// Enable early exit once updates fall below `tolerance`.
    pub fn with_convergence_tolerance(mut self, tolerance: Option<f64>) -> Self {
        self.convergence_tolerance = tolerance;
        self
    }

    /// Check that every field can drive an analysis.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.analysis_loops == 0 {
            return Err(ConfigError::invalid("analysis_loops", "must be at least 1"));
        }
        if self.adjust_loops == 0 {
            return Err(ConfigError::invalid("adjust_loops", "must be at least 1"));
        }
        if !(self.damping > 0.0 && self.damping <= 1.0) {
            return Err(ConfigError::invalid(
                "damping",
                format!("{} is not in (0, 1]", self.damping),
            ));
        }
        if let Some(max) = self.max_magnitude
            && !(max.is_finite() && max > 0.0)
        {
            return Err(ConfigError::invalid(
                "max_magnitude",
                format!("{max} is not a positive finite value"),
            ));
        }
        if let Some(tol) = self.convergence_tolerance
            && !(tol.is_finite() && tol >= 0.0)
        {
            return Err(ConfigError::invalid(
                "convergence_tolerance",
                format!("{tol} is not a non-negative finite value"),
            ));
        }
        Ok(())
    }

    /// Load and validate a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: GhaConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Convert the configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
