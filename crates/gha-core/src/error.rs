//! Error types for analysis sessions, the linear solver and configuration.

use std::collections::TryReserveError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by [`GhaContext`](crate::GhaContext) operations.
#[derive(Debug, Error)]
pub enum GhaError {
    /// Frame size is zero or odd.
    #[error("frame size must be even and non-zero, got {size}")]
    InvalidSize {
        /// Rejected frame size.
        size: usize,
    },

    /// A per-frame buffer could not be reserved.
    #[error("failed to allocate {what} for {size} elements: {source}")]
    Allocation {
        /// Which buffer was being allocated.
        what: &'static str,
        /// Requested element count.
        size: usize,
        /// Underlying reservation error.
        #[source]
        source: TryReserveError,
    },

    /// A caller buffer does not match the frame size.
    #[error("buffer has {actual} samples, context expects {expected}")]
    LengthMismatch {
        /// Frame size of the context.
        expected: usize,
        /// Length of the buffer that was passed.
        actual: usize,
    },

    /// Effective length for joint refinement is zero or larger than the frame.
    #[error("effective length {len} is outside 1..={size}")]
    EffectiveLength {
        /// Requested effective length.
        len: usize,
        /// Frame size of the context.
        size: usize,
    },

    /// The spectral transform was built for a different frame size.
    #[error("spectral transform is sized for {actual} samples, context expects {expected}")]
    TransformSize {
        /// Frame size of the context.
        expected: usize,
        /// Size reported by the transform.
        actual: usize,
    },

    /// Joint refinement aborted because the linear system could not be solved.
    #[error("joint refinement failed: {0}")]
    Solve(#[from] SolveError),

    /// Invalid or unreadable configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Convenience result type for analysis operations.
pub type Result<T> = std::result::Result<T, GhaError>;

/// Allocate a buffer of `len` copies of `value`, reporting exhaustion instead of aborting.
pub(crate) fn try_alloc<T: Clone>(what: &'static str, len: usize, value: T) -> Result<Vec<T>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|source| GhaError::Allocation {
            what,
            size: len,
            source,
        })?;
    buf.resize(len, value);
    Ok(buf)
}

/// Errors reported by [`solve`](crate::solver::solve).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolveError {
    /// The system has no unknowns.
    #[error("system has no unknowns")]
    Empty,

    /// Matrix or solution slice does not fit the declared dimension.
    #[error("expected {expected} elements, got {actual}")]
    Shape {
        /// Element count implied by `n`.
        expected: usize,
        /// Element count actually supplied.
        actual: usize,
    },

    /// No usable pivot was found in a column.
    #[error("matrix is singular at pivot column {column}")]
    Singular {
        /// Column at which elimination stopped.
        column: usize,
    },
}

/// Errors that can occur while loading or validating a [`GhaConfig`](crate::GhaConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// A field holds a value the analysis cannot run with.
    #[error("invalid value for '{field}': {reason}")]
    Invalid {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

impl ConfigError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid field error.
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
