use std::time::Duration;

use daqctrl_backend::*;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Reset,
    Write(u8),
    Read,
    Park,
}

/// Device returning `10 * tick` on every read, with scripted failures and delays.
struct ScriptedDevice {
    clock: ManualClock,
    calls: Vec<Call>,
    reads: usize,
    fail_read_on: Option<usize>,
    fail_write_on: Option<usize>,
    read_delay: Vec<(usize, Duration)>,
    writes: usize,
    resets: usize,
    disconnect_on_reset: Option<usize>,
}

impl ScriptedDevice {
    fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            calls: Vec::new(),
            reads: 0,
            fail_read_on: None,
            fail_write_on: None,
            read_delay: Vec::new(),
            writes: 0,
            resets: 0,
            disconnect_on_reset: None,
        }
    }

    fn parks(&self) -> usize {
        self.calls.iter().filter(|c| **c == Call::Park).count()
    }
}

impl Device for ScriptedDevice {
    fn write_excitation(&mut self, bit: u8) -> Result<(), DeviceError> {
        self.calls.push(Call::Write(bit));
        let tick = self.writes;
        self.writes += 1;
        if self.fail_write_on == Some(tick) {
            return Err(DeviceError::Write("line stuck".to_string()));
        }
        Ok(())
    }

    fn read_measurement(&mut self) -> Result<f64, DeviceError> {
        self.calls.push(Call::Read);
        let tick = self.reads;
        self.reads += 1;
        if let Some(&(_, delay)) = self.read_delay.iter().find(|(t, _)| *t == tick) {
            self.clock.advance(delay);
        }
        if self.fail_read_on == Some(tick) {
            return Err(DeviceError::Read("timeout".to_string()));
        }
        Ok(10. * tick as f64)
    }

    fn reset_input_buffer(&mut self) -> Result<(), DeviceError> {
        self.calls.push(Call::Reset);
        let tick = self.resets;
        self.resets += 1;
        if self.disconnect_on_reset == Some(tick) {
            return Err(DeviceError::Disconnected);
        }
        Ok(())
    }

    fn park(&mut self) -> Result<(), DeviceError> {
        self.calls.push(Call::Park);
        Ok(())
    }
}

fn five_tick_plan() -> ExcitationPlan {
    ExcitationPlan::from_bits(vec![1, 0, 1, 1, 0])
}

#[test]
fn completes_every_tick_in_order() {
    let clock = ManualClock::new();
    let mut acq = AcquisitionLoop::with_clock(ScriptedDevice::new(clock.clone()), clock.clone(), 0.5).unwrap();
    assert_eq!(acq.state(), RunState::Idle);

    let report = acq.run(five_tick_plan(), || true);

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(acq.state(), RunState::Completed);
    let ticks: Vec<usize> = report.records.iter().map(|r| r.tick_index).collect();
    assert_eq!(ticks, vec![0, 1, 2, 3, 4]);
    let bits: Vec<u8> = report.records.iter().map(|r| r.excitation).collect();
    assert_eq!(bits, vec![1, 0, 1, 1, 0]);
    assert_eq!(report.records[3].elapsed_time, 1.5);
    assert_eq!(report.records[3].measurement, 30.);
    assert!(report.overruns.is_empty());
    assert!(report.timing_trustworthy());
    // Every tick sleeps out its full period
    assert_eq!(clock.now(), Duration::from_millis(2500));
}

#[test]
fn each_tick_resets_writes_then_reads() {
    let clock = ManualClock::new();
    let mut acq = AcquisitionLoop::with_clock(ScriptedDevice::new(clock.clone()), clock, 0.1).unwrap();
    acq.run(ExcitationPlan::from_bits(vec![1, 0]), || true);

    assert_eq!(
        acq.device().calls,
        vec![
            Call::Reset,
            Call::Write(1),
            Call::Read,
            Call::Reset,
            Call::Write(0),
            Call::Read,
            Call::Park,
        ]
    );
}

#[test]
fn cancellation_stops_after_current_tick() {
    let clock = ManualClock::new();
    let mut acq = AcquisitionLoop::with_clock(ScriptedDevice::new(clock.clone()), clock, 0.5).unwrap();

    let mut checks = 0;
    let report = acq.run(five_tick_plan(), || {
        checks += 1;
        checks < 3
    });

    assert_eq!(report.outcome, RunOutcome::Cancelled);
    assert_eq!(acq.state(), RunState::Cancelled);
    assert_eq!(report.records.len(), 3);
    assert_eq!(report.records.last().unwrap().tick_index, 2);
    assert_eq!(acq.device().parks(), 1);
}

#[test]
fn read_failure_keeps_partial_results() {
    let clock = ManualClock::new();
    let mut device = ScriptedDevice::new(clock.clone());
    device.fail_read_on = Some(2);
    let mut acq = AcquisitionLoop::with_clock(device, clock, 0.5).unwrap();

    let report = acq.run(five_tick_plan(), || true);

    assert_eq!(
        report.outcome,
        RunOutcome::Failed(DeviceError::Read("timeout".to_string()))
    );
    assert_eq!(acq.state(), RunState::Failed);
    let ticks: Vec<usize> = report.records.iter().map(|r| r.tick_index).collect();
    assert_eq!(ticks, vec![0, 1]);
    // No retry, and the output is still parked
    assert_eq!(acq.device().reads, 3);
    assert_eq!(acq.device().parks(), 1);
}

#[test]
fn write_failure_is_fatal_too() {
    let clock = ManualClock::new();
    let mut device = ScriptedDevice::new(clock.clone());
    device.fail_write_on = Some(1);
    let mut acq = AcquisitionLoop::with_clock(device, clock, 0.5).unwrap();

    let report = acq.run(five_tick_plan(), || true);

    assert!(matches!(report.outcome, RunOutcome::Failed(DeviceError::Write(_))));
    assert_eq!(report.records.len(), 1);
    assert_eq!(acq.device().reads, 1);
}

#[test]
fn disconnect_between_runs_fails_the_next_one() {
    let clock = ManualClock::new();
    let mut acq = AcquisitionLoop::with_clock(ScriptedDevice::new(clock.clone()), clock, 0.5).unwrap();
    assert!(!acq.state().is_terminal());

    let first = acq.run(ExcitationPlan::from_bits(vec![1, 0]), || true);
    assert_eq!(first.outcome, RunOutcome::Completed);

    // Resets 0 and 1 belong to the first run, reset 3 is the second tick of this one
    acq.device_mut().disconnect_on_reset = Some(3);
    let second = acq.run(five_tick_plan(), || true);

    assert_eq!(second.outcome, RunOutcome::Failed(DeviceError::Disconnected));
    assert_eq!(acq.state(), RunState::Failed);
    assert!(acq.state().is_terminal());
    assert_eq!(second.records.len(), 1);
    // Nothing written on the failed tick
    assert_eq!(acq.device().writes, 3);
    assert_eq!(acq.device().parks(), 2);
}

#[test]
fn failing_predicate_cancels() {
    let clock = ManualClock::new();
    let mut acq = AcquisitionLoop::with_clock(ScriptedDevice::new(clock.clone()), clock, 0.5).unwrap();
    let mut answers = vec![Ok(true), Err("predicate raised")].into_iter();

    let report = acq.run(five_tick_plan(), || {
        continue_or_cancel(answers.next().unwrap_or(Ok(true)))
    });

    assert_eq!(report.outcome, RunOutcome::Cancelled);
    assert_eq!(report.records.len(), 2);
    assert!(continue_or_cancel::<String>(Ok(true)));
    assert!(!continue_or_cancel::<String>(Ok(false)));
}

#[test]
fn overrun_is_reported_and_run_continues() {
    let clock = ManualClock::new();
    let mut device = ScriptedDevice::new(clock.clone());
    device.read_delay = vec![(1, Duration::from_millis(700))];
    let mut acq = AcquisitionLoop::with_clock(device, clock.clone(), 0.5).unwrap();

    let report = acq.run(five_tick_plan(), || true);

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.records.len(), 5);
    assert_eq!(report.overruns.len(), 1);
    assert_eq!(report.overruns[0].tick, 1);
    assert!((report.overruns[0].overrun_seconds - 0.2).abs() < 1e-9);
    assert!(!report.timing_trustworthy());
    // The overrunning tick is not slept, the others are
    assert_eq!(clock.now(), Duration::from_millis(4 * 500 + 700));
}

#[test]
fn overrun_on_the_wall_clock() {
    struct SlowDevice;
    impl Device for SlowDevice {
        fn write_excitation(&mut self, _bit: u8) -> Result<(), DeviceError> {
            Ok(())
        }
        fn read_measurement(&mut self) -> Result<f64, DeviceError> {
            std::thread::sleep(Duration::from_millis(15));
            Ok(1.)
        }
        fn reset_input_buffer(&mut self) -> Result<(), DeviceError> {
            Ok(())
        }
    }

    let report = run(SlowDevice, ExcitationPlan::from_bits(vec![1, 0, 1]), 0.005, || true).unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.records.len(), 3);
    let ticks: Vec<usize> = report.overruns.iter().map(|o| o.tick).collect();
    assert_eq!(ticks, vec![0, 1, 2]);
    assert!(report.overruns.iter().all(|o| o.overrun_seconds >= 0.009));
}

#[test]
fn observer_sees_events_as_they_happen() {
    #[derive(Default)]
    struct Collect {
        samples: Vec<usize>,
        overruns: Vec<usize>,
    }
    impl RunObserver for Collect {
        fn on_sample(&mut self, record: &SampleRecord) {
            self.samples.push(record.tick_index);
        }
        fn on_overrun(&mut self, overrun: &TimingOverrun) {
            self.overruns.push(overrun.tick);
        }
    }

    let clock = ManualClock::new();
    let mut device = ScriptedDevice::new(clock.clone());
    device.read_delay = vec![(3, Duration::from_secs(1))];
    let mut acq = AcquisitionLoop::with_clock(device, clock, 0.5).unwrap();
    let mut observer = Collect::default();

    acq.run_observed(five_tick_plan(), || true, &mut observer);

    assert_eq!(observer.samples, vec![0, 1, 2, 3, 4]);
    assert_eq!(observer.overruns, vec![3]);
}

#[test]
fn new_run_starts_from_scratch() {
    let clock = ManualClock::new();
    let mut acq = AcquisitionLoop::with_clock(ScriptedDevice::new(clock.clone()), clock, 0.5).unwrap();

    let first = acq.run(five_tick_plan(), || false);
    assert_eq!(first.outcome, RunOutcome::Cancelled);
    assert_eq!(first.records.len(), 1);

    let second = acq.run(ExcitationPlan::from_bits(vec![0, 1]), || true);
    assert_eq!(second.outcome, RunOutcome::Completed);
    assert_eq!(acq.state(), RunState::Completed);
    let ticks: Vec<usize> = second.records.iter().map(|r| r.tick_index).collect();
    assert_eq!(ticks, vec![0, 1]);
}

#[test]
fn empty_plan_completes_immediately() {
    let clock = ManualClock::new();
    let mut acq = AcquisitionLoop::with_clock(ScriptedDevice::new(clock.clone()), clock, 0.5).unwrap();
    let report = acq.run(ExcitationPlan::default(), || true);
    assert_eq!(report.outcome, RunOutcome::Completed);
    assert!(report.records.is_empty());
    assert_eq!(acq.device().calls, vec![Call::Park]);
}

#[test]
fn rejects_non_positive_period() {
    let clock = ManualClock::new();
    for bad in [0., -0.5, f64::NAN] {
        let res = AcquisitionLoop::with_clock(ScriptedDevice::new(clock.clone()), clock.clone(), bad);
        assert!(matches!(res, Err(ConfigError::SamplingPeriod(_))));
    }
}

#[test]
fn rejects_period_longer_than_any_sleep() {
    let clock = ManualClock::new();
    let res = AcquisitionLoop::with_clock(ScriptedDevice::new(clock.clone()), clock, 1e20);
    assert!(matches!(res, Err(ConfigError::SamplingPeriodTooLong(_))));
    assert!(matches!(
        run(ScriptedDevice::new(ManualClock::new()), five_tick_plan(), 1e20, || true),
        Err(ConfigError::SamplingPeriodTooLong(_))
    ));
}

#[test]
fn long_but_representable_period_sleeps_it_out() {
    let clock = ManualClock::new();
    let mut acq = AcquisitionLoop::with_clock(ScriptedDevice::new(clock.clone()), clock.clone(), 1e9).unwrap();
    let report = acq.run(ExcitationPlan::from_bits(vec![1]), || true);
    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(clock.now(), Duration::from_secs(1_000_000_000));
}

#[test]
fn prbs_session_against_simulated_plant() {
    let clock = ManualClock::new();
    let plant = SimulatedPlant::with_clock(0.5, 1.0, clock.clone()).turnaround(Duration::from_millis(1));
    let signal = Signal::default();
    let timing = SessionTiming::new(0.5, 10., 1).unwrap();
    let plan = signal.plan_for(&timing).unwrap();

    let mut acq = AcquisitionLoop::with_clock(plant, clock, timing.sampling_period()).unwrap();
    let report = acq.run(plan.clone(), || true);

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.records.len(), 21);
    let applied: Vec<u8> = report.records.iter().map(|r| r.excitation).collect();
    assert_eq!(applied.as_slice(), plan.bits());
    assert!(report
        .records
        .iter()
        .all(|r| (0. ..=5.).contains(&r.measurement)));
    // Parked low after the run
    assert_eq!(acq.device().input(), 0.);
}
