//! # Timed excitation / acquisition with the `acquisition` module
//!
//! This module drives a [`Device`] through an [`ExcitationPlan`], one bit per
//! sampling period, and records the measured response.
//!
//! ## Key Features:
//!
//! - **Fixed cadence:** every tick resets the device input buffer, writes the
//!   tick's excitation bit, reads one measurement back and then sleeps for
//!   whatever is left of the sampling period.
//!
//! - **Reported slippage:** when a tick's work does not fit in the period, the
//!   loop does not sleep and emits a [`TimingOverrun`] instead. Overruns are
//!   advisory: the run carries on, but the nominal `elapsed_time` of the
//!   following records no longer matches wall-clock time.
//!
//! - **Cooperative cancellation:** a caller supplied predicate is checked once
//!   per tick, after the tick's sample has been recorded.
//!
//! - **Partial results on failure:** a [`DeviceError`] stops the run, and the
//!   samples captured before the failing tick are returned with it.
//!
//! ## Run lifecycle
//!
//! ```text
//! Idle --run()--> Running --all ticks done------> Completed
//!                    |  \--should_continue false--> Cancelled
//!                    \-----device error-----------> Failed
//! ```
//!
//! Terminal states are left only by the next [`AcquisitionLoop::run`] call,
//! which always starts from an empty record list. The device is
//! [parked](Device::park) once at the end of every run.

use std::fmt;
use std::time::Duration;

use log::{debug, error, info, warn};
use prbs_backend::{validate_sampling_period, ExcitationPlan};

use crate::clock::{Clock, SystemClock};
use crate::device::Device;
use crate::error::{ConfigError, DeviceError};

/// One acquired sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRecord {
    pub tick_index: usize,
    /// Nominal time of the tick, `tick_index * sampling_period` seconds.
    pub elapsed_time: f64,
    pub excitation: u8,
    pub measurement: f64,
}

/// A tick whose work took longer than the sampling period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingOverrun {
    pub tick: usize,
    /// How far past the period budget the tick ran, in seconds (`>= 0`).
    pub overrun_seconds: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed,
    Cancelled,
    Failed(DeviceError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Cancelled | RunState::Failed)
    }
}

impl From<&RunOutcome> for RunState {
    fn from(outcome: &RunOutcome) -> Self {
        match outcome {
            RunOutcome::Completed => RunState::Completed,
            RunOutcome::Cancelled => RunState::Cancelled,
            RunOutcome::Failed(_) => RunState::Failed,
        }
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub records: Vec<SampleRecord>,
    pub outcome: RunOutcome,
    pub overruns: Vec<TimingOverrun>,
}

impl RunReport {
    /// `false` once any tick overran: `elapsed_time` is then nominal only.
    pub fn timing_trustworthy(&self) -> bool {
        self.overruns.is_empty()
    }
}

/// Receives run events as they happen. Both hooks default to doing nothing.
pub trait RunObserver {
    fn on_sample(&mut self, _record: &SampleRecord) {}
    fn on_overrun(&mut self, _overrun: &TimingOverrun) {}
}

impl RunObserver for () {}

pub struct AcquisitionLoop<D: Device, C: Clock = SystemClock> {
    device: D,
    clock: C,
    sampling_period: f64,
    state: RunState,
}

impl<D: Device> AcquisitionLoop<D, SystemClock> {
    /// Loop on the wall clock.
    ///
    /// # Errors
    ///
    /// [`ConfigError::SamplingPeriod`] unless `sampling_period` is finite and `> 0`,
    /// [`ConfigError::SamplingPeriodTooLong`] if it does not fit a [`Duration`].
    pub fn new(device: D, sampling_period: f64) -> Result<Self, ConfigError> {
        Self::with_clock(device, SystemClock::new(), sampling_period)
    }
}

impl<D: Device, C: Clock> AcquisitionLoop<D, C> {
    pub fn with_clock(device: D, clock: C, sampling_period: f64) -> Result<Self, ConfigError> {
        validate_sampling_period(sampling_period)?;
        Ok(Self {
            device,
            clock,
            sampling_period,
            state: RunState::Idle,
        })
    }

    pub fn state(&self) -> RunState {
        self.state
    }
    pub fn sampling_period(&self) -> f64 {
        self.sampling_period
    }
    pub fn device(&self) -> &D {
        &self.device
    }
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }
    pub fn into_device(self) -> D {
        self.device
    }

    /// Runs the whole plan. See the [module documentation](self) for the tick sequence.
    pub fn run<F>(&mut self, plan: ExcitationPlan, should_continue: F) -> RunReport
    where
        F: FnMut() -> bool,
    {
        self.run_observed(plan, should_continue, &mut ())
    }

    /// [`AcquisitionLoop::run`], forwarding samples and overruns to `observer`
    /// as they occur.
    pub fn run_observed<F, O>(
        &mut self,
        plan: ExcitationPlan,
        mut should_continue: F,
        observer: &mut O,
    ) -> RunReport
    where
        F: FnMut() -> bool,
        O: RunObserver + ?Sized,
    {
        self.state = RunState::Running;
        let num_ticks = plan.len();
        info!(
            "Acquisition started: {} ticks every {} s",
            num_ticks, self.sampling_period
        );

        let mut records = Vec::with_capacity(num_ticks);
        let mut overruns = Vec::new();
        let mut outcome = RunOutcome::Completed;

        for (k, &bit) in plan.bits().iter().enumerate() {
            let st = self.clock.now();

            let measurement = match self.exchange(bit) {
                Ok(value) => value,
                Err(err) => {
                    error!("Device error on tick {} of {}: {}", k, num_ticks, err);
                    outcome = RunOutcome::Failed(err);
                    break;
                }
            };

            let record = SampleRecord {
                tick_index: k,
                elapsed_time: k as f64 * self.sampling_period,
                excitation: bit,
                measurement,
            };
            records.push(record);
            observer.on_sample(&record);
            debug!("Iteration: {} of {}", k, num_ticks.saturating_sub(1));

            if !should_continue() {
                info!("Acquisition cancelled after tick {}", k);
                outcome = RunOutcome::Cancelled;
                break;
            }

            let et = self.clock.now();
            let remaining = self.sampling_period - et.saturating_sub(st).as_secs_f64();
            if remaining > 0. {
                // `remaining` never exceeds the validated period
                self.clock
                    .sleep(Duration::try_from_secs_f64(remaining).unwrap_or(Duration::MAX));
            } else {
                let overrun = TimingOverrun {
                    tick: k,
                    overrun_seconds: -remaining,
                };
                warn!(
                    "Tick {} overran the {} s sampling period by {:.6} s; elapsed times are no longer wall-clock accurate",
                    k, self.sampling_period, overrun.overrun_seconds
                );
                observer.on_overrun(&overrun);
                overruns.push(overrun);
            }
        }

        if let Err(err) = self.device.park() {
            warn!("Failed to park excitation output: {}", err);
        }

        self.state = RunState::from(&outcome);
        info!(
            "Acquisition {:?}: {} samples, {} overruns",
            self.state,
            records.len(),
            overruns.len()
        );
        RunReport {
            records,
            outcome,
            overruns,
        }
    }

    fn exchange(&mut self, bit: u8) -> Result<f64, DeviceError> {
        self.device.reset_input_buffer()?;
        self.device.write_excitation(bit)?;
        self.device.read_measurement()
    }
}

/// One-shot run on the wall clock: `plan` applied to `device` every
/// `sampling_period` seconds until done, cancelled or failed.
pub fn run<D, F>(
    device: D,
    plan: ExcitationPlan,
    sampling_period: f64,
    should_continue: F,
) -> Result<RunReport, ConfigError>
where
    D: Device,
    F: FnMut() -> bool,
{
    let mut acq = AcquisitionLoop::new(device, sampling_period)?;
    Ok(acq.run(plan, should_continue))
}

/// Reads the answer of a fallible cancellation predicate. An error cancels
/// the run, after logging it so it is not mistaken for a user stop.
pub fn continue_or_cancel<E: fmt::Display>(answer: Result<bool, E>) -> bool {
    match answer {
        Ok(keep_going) => keep_going,
        Err(err) => {
            warn!("Cancellation predicate failed, cancelling the acquisition: {}", err);
            false
        }
    }
}
