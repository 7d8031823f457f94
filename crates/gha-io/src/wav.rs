//! WAV file loading via hound.

use std::path::Path;

use gha_core::Sample;
use hound::{SampleFormat, WavReader};

use crate::Result;

/// Format of a loaded WAV file, before mixdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    /// Number of channels in the file.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bits per sample.
    pub bits_per_sample: u16,
}

impl From<hound::WavSpec> for WavSpec {
    fn from(spec: hound::WavSpec) -> Self {
        Self {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
        }
    }
}

/// Read a WAV file as mono samples along with its format.
///
/// Multi-channel files are mixed down by averaging channels. Integer
/// samples are scaled into `[-1, 1)`.
///
/// # Example
/// ```ignore
/// let (samples, spec) = read_wav_mono::<f64, _>("dtmf.wav")?;
/// println!("Loaded {} samples at {} Hz", samples.len(), spec.sample_rate);
/// ```
pub fn read_wav_mono<T: Sample, P: AsRef<Path>>(path: P) -> Result<(Vec<T>, WavSpec)> {
    let reader = WavReader::open(path.as_ref())?;
    let spec = WavSpec::from(reader.spec());
    let channels = usize::from(spec.channels.max(1));

    let samples: Vec<f64> = match reader.spec().sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<std::result::Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let max_val = f64::from(1u32 << (spec.bits_per_sample - 1));
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| f64::from(v) / max_val))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    let mono: Vec<T> = samples
        .chunks(channels)
        .map(|chunk| T::narrow(chunk.iter().sum::<f64>() / channels as f64))
        .collect();

    tracing::debug!(
        path = %path.as_ref().display(),
        samples = mono.len(),
        sample_rate = spec.sample_rate,
        channels = spec.channels,
        "loaded wav"
    );

    Ok((mono, spec))
}
