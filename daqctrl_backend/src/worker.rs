//! Runs an acquisition on its own thread and streams its progress back.
//!
//! The acquisition loop blocks for the whole session. Hosts with an event
//! loop of their own (a live plot, a GUI) spawn an [`AcquisitionWorker`]
//! instead: the worker owns the device and the plan, waits for
//! [`AcquisitionWorker::start`], and publishes every sample and overrun on a
//! channel as soon as it is produced. [`AcquisitionWorker::stop`] is the
//! cancellation predicate seen from the host side; it takes effect at the end
//! of the current tick.
//!
//! ```ignore
//! let worker = AcquisitionWorker::spawn(device, plan, 0.5)?;
//! worker.start();
//! for event in worker.events().iter() {
//!     match event {
//!         AcqEvent::Sample(rec) => plot(rec),
//!         AcqEvent::Finished(_) => break,
//!         _ => {}
//!     }
//! }
//! let (device, report) = worker.join()?;
//! ```

use std::thread::{self, JoinHandle};

use crossbeam::channel::{unbounded, Receiver, Sender};
use log::{debug, info};
use prbs_backend::ExcitationPlan;

use crate::acquisition::*;
use crate::clock::{Clock, SystemClock};
use crate::device::Device;
use crate::error::{ConfigError, WorkerError};
use crate::worker_cmd_chan::{CmdChan, WorkerCmd};

#[derive(Debug, Clone, PartialEq)]
pub enum AcqEvent {
    Started,
    Sample(SampleRecord),
    Overrun(TimingOverrun),
    /// Always the last event of a worker.
    Finished(RunOutcome),
}

struct ChannelObserver {
    events: Sender<AcqEvent>,
}

impl RunObserver for ChannelObserver {
    fn on_sample(&mut self, record: &SampleRecord) {
        // A host that dropped its receiver only loses the live view
        let _ = self.events.send(AcqEvent::Sample(*record));
    }
    fn on_overrun(&mut self, overrun: &TimingOverrun) {
        let _ = self.events.send(AcqEvent::Overrun(*overrun));
    }
}

pub struct AcquisitionWorker<D> {
    handle: Option<JoinHandle<(D, RunReport)>>,
    events: Receiver<AcqEvent>,
    cmd_chan: CmdChan,
}

impl<D> AcquisitionWorker<D>
where
    D: Device + Send + 'static,
{
    /// Spawns a worker on the wall clock. Nothing is written to the device
    /// until [`AcquisitionWorker::start`].
    pub fn spawn(device: D, plan: ExcitationPlan, sampling_period: f64) -> Result<Self, ConfigError> {
        Self::spawn_with_clock(device, SystemClock::new(), plan, sampling_period)
    }

    pub fn spawn_with_clock<C>(
        device: D,
        clock: C,
        plan: ExcitationPlan,
        sampling_period: f64,
    ) -> Result<Self, ConfigError>
    where
        C: Clock + Send + 'static,
    {
        let mut acq = AcquisitionLoop::with_clock(device, clock, sampling_period)?;
        let cmd_chan = CmdChan::new();
        let mut cmd_recvr = cmd_chan.new_recvr();
        let (sender, events) = unbounded();

        let handle = thread::spawn(move || {
            let report = match cmd_recvr.recv() {
                WorkerCmd::Start => {
                    let _ = sender.send(AcqEvent::Started);
                    let mut observer = ChannelObserver {
                        events: sender.clone(),
                    };
                    let should_continue = || match cmd_recvr.poll() {
                        Some(WorkerCmd::Stop) | Some(WorkerCmd::Close) => false,
                        _ => true,
                    };
                    acq.run_observed(plan, should_continue, &mut observer)
                }
                cmd => {
                    debug!("Acquisition worker received {:?} before start, exiting", cmd);
                    RunReport {
                        records: Vec::new(),
                        outcome: RunOutcome::Cancelled,
                        overruns: Vec::new(),
                    }
                }
            };

            let _ = sender.send(AcqEvent::Finished(report.outcome.clone()));
            (acq.into_device(), report)
        });

        Ok(Self {
            handle: Some(handle),
            events,
            cmd_chan,
        })
    }

    pub fn start(&self) {
        info!("Starting acquisition worker");
        self.cmd_chan.send(WorkerCmd::Start);
    }

    /// Requests cancellation; honoured at the end of the current tick.
    /// Before [`AcquisitionWorker::start`] it makes the worker exit without running.
    pub fn stop(&self) {
        self.cmd_chan.send(WorkerCmd::Stop);
    }

    pub fn events(&self) -> &Receiver<AcqEvent> {
        &self.events
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |handle| handle.is_finished())
    }

    /// Waits for the run to end and hands back the device and the full report.
    pub fn join(mut self) -> Result<(D, RunReport), WorkerError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| WorkerError::Panicked),
            None => Err(WorkerError::Panicked),
        }
    }
}

impl<D> Drop for AcquisitionWorker<D> {
    // Releases a worker still waiting for `start`, or cancels a running one
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.cmd_chan.send(WorkerCmd::Close);
        }
    }
}
