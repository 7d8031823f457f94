//! Shared CLI helpers used across multiple commands.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use gha_core::{GhaConfig, GhaContext, HarmonicInfo, compare_phase};
use gha_io::SampleWidth;
use serde::Serialize;

/// Absolute tolerance of `--expect` checks.
pub const EXPECT_TOLERANCE: f64 = 1e-3;

/// Input selection and output options shared by every command.
#[derive(Args)]
pub struct InputArgs {
    /// Input PCM file (raw signed mono, or WAV)
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// First sample of the frame
    #[arg(long, default_value = "0")]
    pub offset: usize,

    /// Frame length in samples, must be even (default: rest of the file)
    #[arg(long)]
    pub len: Option<usize>,

    /// Raw sample width in bits (8 or 24)
    #[arg(long)]
    pub bits: Option<u16>,

    /// Read the input as WAV (implied by a .wav extension)
    #[arg(long)]
    pub wav: bool,

    /// Sample rate used to report frequencies in Hz
    #[arg(long)]
    pub sample_rate: Option<f64>,

    /// Analysis configuration file
    #[arg(long, value_name = "TOML")]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

/// One analysis frame.
pub struct Frame {
    pub samples: Vec<f64>,
    pub sample_rate: f64,
}

impl InputArgs {
    fn is_wav(&self) -> bool {
        self.wav
            || self
                .input
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"))
    }

    /// Load the requested frame.
    ///
    /// `default_bits` and `default_rate` apply to raw input when the flags are absent.
    pub fn load(&self, default_bits: u16, default_rate: f64) -> anyhow::Result<Frame> {
        let frame = if self.is_wav() {
            let (all, spec) = gha_io::read_wav_mono::<f64, _>(&self.input)
                .with_context(|| format!("reading {}", self.input.display()))?;
            let len = self.len.unwrap_or(all.len().saturating_sub(self.offset));
            Frame {
                samples: gha_io::frame(&all, self.offset, len)?.to_vec(),
                sample_rate: self.sample_rate.unwrap_or(f64::from(spec.sample_rate)),
            }
        } else {
            let bits = self.bits.unwrap_or(default_bits);
            let len = match self.len {
                Some(len) => len,
                None => {
                    let width = SampleWidth::from_bits(bits)?;
                    let bytes = std::fs::metadata(&self.input)
                        .with_context(|| format!("reading {}", self.input.display()))?
                        .len();
                    (bytes as usize / width.bytes()).saturating_sub(self.offset)
                }
            };
            Frame {
                samples: gha_io::load_raw_pcm(&self.input, self.offset, len, bits)
                    .with_context(|| format!("reading {}", self.input.display()))?,
                sample_rate: self.sample_rate.unwrap_or(default_rate),
            }
        };

        tracing::debug!(
            samples = frame.samples.len(),
            offset = self.offset,
            sample_rate = frame.sample_rate,
            "loaded frame"
        );
        Ok(frame)
    }

    /// Build an analysis context for frames of `size` samples.
    pub fn context(&self, size: usize) -> anyhow::Result<GhaContext<f64>> {
        let config = match &self.config {
            Some(path) => GhaConfig::load(path)?,
            None => GhaConfig::default(),
        };
        GhaContext::with_config(size, config)
            .with_context(|| format!("creating analysis context for {size} samples"))
    }
}

/// Serializable view of one tone.
#[derive(Debug, Serialize)]
pub struct ToneReport {
    /// Angular frequency, radians per sample.
    pub frequency: f64,
    pub frequency_hz: f64,
    pub phase: f64,
    pub magnitude: f64,
}

impl ToneReport {
    pub fn new(info: &HarmonicInfo<f64>, sample_rate: f64) -> Self {
        Self {
            frequency: info.frequency,
            frequency_hz: info.frequency_hz(sample_rate),
            phase: info.phase,
            magnitude: info.magnitude,
        }
    }
}

/// Command output.
#[derive(Debug, Serialize)]
pub struct Report {
    pub tones: Vec<ToneReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub residual_rms: Option<f64>,
}

impl Report {
    pub fn new(tones: &[HarmonicInfo<f64>], sample_rate: f64, residual_rms: Option<f64>) -> Self {
        Self {
            tones: tones
                .iter()
                .map(|t| ToneReport::new(t, sample_rate))
                .collect(),
            residual_rms,
        }
    }

    pub fn print(&self, json: bool) -> anyhow::Result<()> {
        if json {
            println!("{}", serde_json::to_string_pretty(self)?);
            return Ok(());
        }

        for (i, tone) in self.tones.iter().enumerate() {
            println!(
                "tone {}: freq {:.6} rad/sample ({:.2} Hz), phase {:.6}, magn {:.6}",
                i, tone.frequency, tone.frequency_hz, tone.phase, tone.magnitude
            );
        }
        if let Some(rms) = self.residual_rms {
            println!("residual rms: {:.6}", rms);
        }
        Ok(())
    }
}

/// Check a tone against expected values within [`EXPECT_TOLERANCE`].
///
/// The phase is skipped when `phase` is `None`.
pub fn tone_matches(
    info: &HarmonicInfo<f64>,
    frequency: f64,
    phase: Option<f64>,
    magnitude: f64,
) -> bool {
    (info.frequency - frequency).abs() <= EXPECT_TOLERANCE
        && (info.magnitude - magnitude).abs() <= EXPECT_TOLERANCE
        && phase.is_none_or(|p| compare_phase(p, info.phase, EXPECT_TOLERANCE))
}
