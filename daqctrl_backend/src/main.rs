use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use log::{error, info, warn};

use daqctrl_backend::*;

/// Runs a PRBS identification session against a simulated first-order plant.
#[derive(Parser, Debug)]
struct Args {
    /// PRBS register order.
    #[arg(short, long, default_value_t = 6)]
    order: u32,
    /// PRBS seed, clamped into the register range.
    #[arg(short, long, default_value_t = 100)]
    seed: i64,
    /// Sampling period in seconds.
    #[arg(long, default_value_t = 0.05)]
    ts: f64,
    /// Session duration in seconds.
    #[arg(long, default_value_t = 5.0)]
    duration: f64,
    /// Number of sampling periods each bit is held for.
    #[arg(long, default_value_t = 1)]
    tb: usize,
    /// Plant pole, in [0, 1).
    #[arg(long, default_value_t = 0.8)]
    pole: f64,
    /// Plant static gain.
    #[arg(long, default_value_t = 0.9)]
    gain: f64,
    /// Simulated measurement turnaround in milliseconds.
    #[arg(long, default_value_t = 2)]
    turnaround_ms: u64,
    /// Seconds of transient to drop before the training window.
    #[arg(long, default_value_t = 0.5)]
    start_save_time: f64,
    /// Percentage of samples held back for validation.
    #[arg(long, default_value_t = 15.0)]
    validation_percent: f64,
    /// Run on virtual time instead of the wall clock.
    #[arg(long)]
    offline: bool,
}

fn acquire<C>(plant: SimulatedPlant<C>, clock: C, plan: ExcitationPlan, ts: f64) -> Result<RunReport, String>
where
    C: Clock + Send + 'static,
{
    let worker = AcquisitionWorker::spawn_with_clock(plant, clock, plan, ts).map_err(|e| e.to_string())?;
    worker.start();
    for event in worker.events().iter() {
        match event {
            AcqEvent::Sample(rec) => info!(
                "t={:.3}s u={} y={:.4}",
                rec.elapsed_time, rec.excitation, rec.measurement
            ),
            AcqEvent::Finished(outcome) => {
                info!("Finished: {:?}", outcome);
                break;
            }
            _ => {}
        }
    }
    let (_plant, report) = worker.join().map_err(|e| e.to_string())?;
    Ok(report)
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let timing = match SessionTiming::new(args.ts, args.duration, args.tb) {
        Ok(timing) => timing,
        Err(err) => {
            error!("{}", err);
            return ExitCode::FAILURE;
        }
    };
    let signal = Signal::new(LfsrConfig::new(args.order, Some(args.seed)));
    let plan = match signal.plan_for(&timing) {
        Ok(plan) => plan,
        Err(err) => {
            error!("{}", err);
            return ExitCode::FAILURE;
        }
    };
    info!(
        "PRBS{} (seed {}), {} ticks of {} s",
        signal.lfsr().order(),
        signal.lfsr().seed(),
        plan.len(),
        timing.sampling_period()
    );

    let turnaround = Duration::from_millis(args.turnaround_ms);
    let result = if args.offline {
        let clock = ManualClock::new();
        let plant = SimulatedPlant::with_clock(args.pole, args.gain, clock.clone()).turnaround(turnaround);
        acquire(plant, clock, plan, timing.sampling_period())
    } else {
        let plant = SimulatedPlant::new(args.pole, args.gain).turnaround(turnaround);
        acquire(plant, SystemClock::new(), plan, timing.sampling_period())
    };
    let report = match result {
        Ok(report) => report,
        Err(err) => {
            error!("{}", err);
            return ExitCode::FAILURE;
        }
    };
    if !report.timing_trustworthy() {
        warn!(
            "{} ticks overran the sampling period, recorded times are nominal",
            report.overruns.len()
        );
    }

    let data = IdentificationData::from_records(&report.records);
    match data.split(args.start_save_time, timing.sampling_period(), args.validation_percent) {
        Ok((train, valid)) => {
            println!(
                "{} samples: {} for training, {} for validation",
                data.len(),
                train.len(),
                valid.len()
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
