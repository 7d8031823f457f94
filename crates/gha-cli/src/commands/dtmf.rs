//! DTMF tone pair decoding.

use clap::Args;
use gha_core::rms;

use super::common::{InputArgs, Report, tone_matches};

#[derive(Args)]
pub struct DtmfArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Fail unless low and high tones match (rad/sample, magnitude) within 1e-3
    #[arg(
        long,
        num_args = 4,
        value_names = ["FREQ_LOW", "MAGN_LOW", "FREQ_HIGH", "MAGN_HIGH"]
    )]
    expect: Option<Vec<f64>>,
}

pub fn run(args: DtmfArgs) -> anyhow::Result<()> {
    // Raw captures default to 8-bit 8 kHz telephony
    let frame = args.input.load(8, 8000.0)?;
    let mut ctx = args.input.context(frame.samples.len())?;
    let original = frame.samples.clone();
    let mut pcm = frame.samples;

    let mut tones = ctx.extract_many(&mut pcm, 2)?;
    let extracted = rms(&pcm);
    tones.sort_by(|a, b| a.frequency.total_cmp(&b.frequency));

    ctx.adjust_info(&original, &mut tones)?;
    let adjusted = rms(ctx.analyzed());
    tracing::info!(extracted, adjusted, "residual rms");

    if adjusted > extracted {
        anyhow::bail!("joint refinement increased the residual: {extracted:.6} -> {adjusted:.6}");
    }

    Report::new(&tones, frame.sample_rate, Some(adjusted)).print(args.input.json)?;

    if let Some(expect) = args.expect {
        let low_ok = tone_matches(&tones[0], expect[0], None, expect[1]);
        let high_ok = tone_matches(&tones[1], expect[2], None, expect[3]);
        if !(low_ok && high_ok) {
            anyhow::bail!("dtmf tones do not match expected {:?}", expect);
        }
    }

    Ok(())
}
