//! Python exposure of the acquisition loop, built with the `python` feature.
//!
//! Any Python object with `write_excitation(bit)`, `read_measurement()` and
//! `reset_input_buffer()` methods can serve as the device; an optional
//! `park()` method overrides the default of writing `0` after the run.
//!
//! ```python
//! from daqctrl_backend import Acquisition
//!
//! acq = Acquisition(0.5)
//! report = acq.run(arduino, plan, should_continue=lambda: figure_open())
//! data = report.records()   # numpy (n, 3): time, input, output
//! ```

use numpy::{IntoPyArray, PyArray2};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use prbs_backend::ExcitationPlan;

use crate::acquisition::{continue_or_cancel, AcquisitionLoop, RunOutcome, RunReport, SampleRecord};
use crate::dataset::IdentificationData;
use crate::device::Device;
use crate::error::{ConfigError, DeviceError};

/// Adapts a Python object to the [`Device`] capability.
struct PyDevice {
    obj: PyObject,
}

impl PyDevice {
    fn call0(&self, method: &str) -> PyResult<PyObject> {
        Python::with_gil(|py| self.obj.call_method0(py, method))
    }
}

impl Device for PyDevice {
    fn write_excitation(&mut self, bit: u8) -> Result<(), DeviceError> {
        Python::with_gil(|py| self.obj.call_method1(py, "write_excitation", (bit,)))
            .map(|_| ())
            .map_err(|err| DeviceError::Write(err.to_string()))
    }

    fn read_measurement(&mut self) -> Result<f64, DeviceError> {
        Python::with_gil(|py| {
            self.obj
                .call_method0(py, "read_measurement")
                .and_then(|value| value.extract::<f64>(py))
        })
        .map_err(|err| DeviceError::Read(err.to_string()))
    }

    fn reset_input_buffer(&mut self) -> Result<(), DeviceError> {
        self.call0("reset_input_buffer")
            .map(|_| ())
            .map_err(|err| DeviceError::Reset(err.to_string()))
    }

    fn park(&mut self) -> Result<(), DeviceError> {
        let has_park = Python::with_gil(|py| self.obj.as_ref(py).hasattr("park").unwrap_or(false));
        if has_park {
            self.call0("park")
                .map(|_| ())
                .map_err(|err| DeviceError::Write(err.to_string()))
        } else {
            self.write_excitation(0)
        }
    }
}

fn config_err(err: ConfigError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

#[pyclass(name = "RunReport")]
pub struct PyRunReport {
    records: Vec<SampleRecord>,
    outcome: RunOutcome,
    overruns: Vec<(usize, f64)>,
}

impl From<RunReport> for PyRunReport {
    fn from(report: RunReport) -> Self {
        Self {
            records: report.records,
            outcome: report.outcome,
            overruns: report
                .overruns
                .iter()
                .map(|o| (o.tick, o.overrun_seconds))
                .collect(),
        }
    }
}

#[pymethods]
impl PyRunReport {
    /// `"completed"`, `"cancelled"` or `"failed"`.
    #[getter]
    fn outcome(&self) -> &'static str {
        match self.outcome {
            RunOutcome::Completed => "completed",
            RunOutcome::Cancelled => "cancelled",
            RunOutcome::Failed(_) => "failed",
        }
    }

    #[getter]
    fn error(&self) -> Option<String> {
        match &self.outcome {
            RunOutcome::Failed(err) => Some(err.to_string()),
            _ => None,
        }
    }

    /// `[(tick, overrun_seconds), ...]`
    #[getter]
    fn overruns(&self) -> Vec<(usize, f64)> {
        self.overruns.clone()
    }

    fn records<'py>(&self, py: Python<'py>) -> &'py PyArray2<f64> {
        IdentificationData::from_records(&self.records)
            .to_array2()
            .into_pyarray(py)
    }

    fn __len__(&self) -> usize {
        self.records.len()
    }
}

#[pyclass]
pub struct Acquisition {
    sampling_period: f64,
}

#[pymethods]
impl Acquisition {
    #[new]
    fn new(sampling_period: f64) -> PyResult<Self> {
        prbs_backend::validate_sampling_period(sampling_period).map_err(config_err)?;
        Ok(Self { sampling_period })
    }

    /// Runs `plan` against `device`, releasing the GIL between device calls.
    #[pyo3(signature = (device, plan, should_continue=None))]
    fn run(
        &self,
        py: Python<'_>,
        device: PyObject,
        plan: Vec<u8>,
        should_continue: Option<PyObject>,
    ) -> PyResult<PyRunReport> {
        let mut acq = AcquisitionLoop::new(PyDevice { obj: device }, self.sampling_period)
            .map_err(config_err)?;
        let plan = ExcitationPlan::from_bits(plan);

        let report = py.allow_threads(move || {
            acq.run(plan, || match &should_continue {
                // A predicate that raises or returns a non-bool cancels the run
                Some(pred) => Python::with_gil(|py| {
                    continue_or_cancel(pred.call0(py).and_then(|ret| ret.extract::<bool>(py)))
                }),
                None => true,
            })
        });
        Ok(report.into())
    }
}

pub fn register(m: &PyModule) -> PyResult<()> {
    m.add_class::<Acquisition>()?;
    m.add_class::<PyRunReport>()?;
    Ok(())
}
