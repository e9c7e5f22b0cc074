use clap::Parser;
use log::info;

use prbs_backend::*;

/// Prints the PRBS excitation plan of an acquisition session.
#[derive(Parser, Debug)]
struct Args {
    /// Register order, snapped to the nearest supported order.
    #[arg(short, long, default_value_t = 6)]
    order: u32,
    /// Register seed, clamped into range. Random when omitted.
    #[arg(short, long)]
    seed: Option<i64>,
    /// Sampling period in seconds.
    #[arg(long, default_value_t = 0.5)]
    ts: f64,
    /// Session duration in seconds.
    #[arg(long, default_value_t = 10.0)]
    duration: f64,
    /// Number of sampling periods each bit is held for.
    #[arg(long, default_value_t = 1)]
    tb: usize,
}

fn main() -> Result<(), ConfigError> {
    env_logger::init();
    let args = Args::parse();

    let signal = Signal::new(LfsrConfig::new(args.order, args.seed));
    let timing = SessionTiming::new(args.ts, args.duration, args.tb)?;
    let plan = signal.plan_for(&timing)?;
    info!(
        "PRBS{} seed={} taps={:?}: {} bits, plan of {} ticks",
        signal.lfsr().order(),
        signal.lfsr().seed(),
        signal.lfsr().taps(),
        signal.sequence().len(),
        plan.len()
    );

    let line: String = plan.bits().iter().map(|b| char::from(b'0' + b)).collect();
    println!("{}", line);
    Ok(())
}
