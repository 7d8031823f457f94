//! PCM loading for Generalized Harmonic Analysis.
//!
//! This crate provides:
//!
//! - **Raw PCM**: [`load_raw_pcm`] for headerless signed 8/24-bit mono captures
//! - **WAV files**: [`read_wav_mono`] via `hound`, mixed down to mono
//! - **Framing**: [`frame`] for slicing an analysis window out of a capture
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gha_core::GhaContext;
//! use gha_io::load_raw_pcm;
//!
//! // 320 samples starting at sample 1000 of an 8-bit capture
//! let mut pcm: Vec<f64> = load_raw_pcm("dtmf.raw", 1000, 320, 8)?;
//! let mut ctx = GhaContext::<f64>::new(pcm.len())?;
//! let tones = ctx.extract_many_adjusted(&mut pcm, 2)?;
//! ```

mod raw;
mod wav;

pub use raw::{SampleWidth, load_raw_pcm};
pub use wav::{WavSpec, read_wav_mono};

/// Error types for PCM loading.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Raw PCM sample width other than 8 or 24 bits.
    #[error("Unsupported sample width: {0} bits (expected 8 or 24)")]
    UnsupportedBits(u16),

    /// The source holds fewer samples than requested.
    #[error("Requested samples {offset}..{end} but only {available} available")]
    TooShort {
        /// First requested sample.
        offset: usize,
        /// One past the last requested sample.
        end: usize,
        /// Samples present in the source.
        available: usize,
    },
}

/// Convenience result type for PCM loading.
pub type Result<T> = std::result::Result<T, Error>;

/// Borrow `len` samples starting at `offset`.
pub fn frame<T>(samples: &[T], offset: usize, len: usize) -> Result<&[T]> {
    let end = offset.checked_add(len).ok_or(Error::TooShort {
        offset,
        end: usize::MAX,
        available: samples.len(),
    })?;
    samples.get(offset..end).ok_or(Error::TooShort {
        offset,
        end,
        available: samples.len(),
    })
}
