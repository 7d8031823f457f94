//! Headerless signed PCM captures.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use gha_core::Sample;

use crate::{Error, Result};

/// Full-scale of a left-justified 32-bit sample.
const FULL_SCALE: f64 = 2_147_483_648.0;

/// Supported raw sample widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleWidth {
    /// Signed 8-bit.
    Bits8,
    /// Signed 24-bit little-endian.
    Bits24,
}

impl SampleWidth {
    /// Parse a bit depth.
    pub fn from_bits(bits: u16) -> Result<Self> {
        match bits {
            8 => Ok(Self::Bits8),
            24 => Ok(Self::Bits24),
            other => Err(Error::UnsupportedBits(other)),
        }
    }

    /// Bytes per sample.
    pub fn bytes(self) -> usize {
        match self {
            Self::Bits8 => 1,
            Self::Bits24 => 3,
        }
    }

    /// Decode one little-endian sample into `[-1, 1)`.
    ///
    /// The bytes are placed at the top of a 32-bit word so the sign bit
    /// lands in bit 31, then scaled by 2^31.
    fn decode(self, bytes: &[u8]) -> f64 {
        let mut word = [0u8; 4];
        word[4 - self.bytes()..].copy_from_slice(bytes);
        f64::from(i32::from_le_bytes(word)) / FULL_SCALE
    }
}

/// Load `len` mono samples starting at sample `offset` of a raw PCM file.
///
/// `bits` must be 8 or 24. Samples are signed, little-endian for 24-bit.
///
/// # Example
/// ```ignore
/// let pcm: Vec<f64> = load_raw_pcm("dtmf.raw", 0, 320, 8)?;
/// ```
pub fn load_raw_pcm<T: Sample, P: AsRef<Path>>(
    path: P,
    offset: usize,
    len: usize,
    bits: u16,
) -> Result<Vec<T>> {
    let width = SampleWidth::from_bits(bits)?;
    let bytes = width.bytes();

    let mut file = File::open(path.as_ref())?;
    let available = usize::try_from(file.metadata()?.len()).unwrap_or(usize::MAX) / bytes;
    let end = offset.saturating_add(len);
    if end > available {
        return Err(Error::TooShort {
            offset,
            end,
            available,
        });
    }

    file.seek(SeekFrom::Start((offset * bytes) as u64))?;
    let mut raw = vec![0u8; len * bytes];
    file.read_exact(&mut raw)?;

    tracing::debug!(
        path = %path.as_ref().display(),
        offset,
        len,
        bits,
        "loaded raw pcm"
    );

    Ok(raw
        .chunks_exact(bytes)
        .map(|chunk| T::narrow(width.decode(chunk)))
        .collect())
}
