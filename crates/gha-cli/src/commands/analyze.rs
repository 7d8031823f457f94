//! Single-tone analysis command.

use clap::Args;

use super::common::{InputArgs, Report, tone_matches};

#[derive(Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Fail unless the tone matches FREQ (rad/sample), PHASE and MAGN within 1e-3
    #[arg(long, num_args = 3, value_names = ["FREQ", "PHASE", "MAGN"])]
    expect: Option<Vec<f64>>,
}

pub fn run(args: AnalyzeArgs) -> anyhow::Result<()> {
    // Raw captures default to 24-bit 44.1 kHz
    let frame = args.input.load(24, 44100.0)?;
    let mut ctx = args.input.context(frame.samples.len())?;

    let info = ctx.analyze_one(&frame.samples)?;
    tracing::info!(
        frequency = info.frequency,
        phase = info.phase,
        magnitude = info.magnitude,
        "analyzed frame"
    );

    Report::new(&[info], frame.sample_rate, None).print(args.input.json)?;

    if let Some(expect) = args.expect
        && !tone_matches(&info, expect[0], Some(expect[1]), expect[2])
    {
        anyhow::bail!(
            "tone (freq {:.6}, phase {:.6}, magn {:.6}) does not match expected {:?}",
            info.frequency,
            info.phase,
            info.magnitude,
            expect
        );
    }

    Ok(())
}
