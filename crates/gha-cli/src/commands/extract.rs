//! Multi-tone extraction command.

use clap::Args;
use gha_core::rms;

use super::common::{InputArgs, Report};

#[derive(Args)]
pub struct ExtractArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Number of tones to extract
    #[arg(short = 'k', long, default_value = "1")]
    count: usize,

    /// Jointly refine the extracted tones against the original frame
    #[arg(long)]
    adjust: bool,
}

pub fn run(args: ExtractArgs) -> anyhow::Result<()> {
    let frame = args.input.load(24, 44100.0)?;
    let mut ctx = args.input.context(frame.samples.len())?;
    let mut pcm = frame.samples;

    let tones = if args.adjust {
        ctx.extract_many_adjusted(&mut pcm, args.count)?
    } else {
        ctx.extract_many(&mut pcm, args.count)?
    };
    let residual = rms(&pcm);
    tracing::info!(count = tones.len(), residual, "extraction done");

    Report::new(&tones, frame.sample_rate, Some(residual)).print(args.input.json)
}
