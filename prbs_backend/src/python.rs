//! Python exposure of the generator, built with the `python` feature.
//!
//! ```python
//! from prbs_backend import Signal, generate_prbs
//!
//! sig = Signal(6, 100)
//! plan = sig.plan_for_session(0.5, 10.0)
//! assert len(generate_prbs(3, 0)) == 7
//! ```

use numpy::{IntoPyArray, PyArray1};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::error::ConfigError;
use crate::lfsr::{generate, LfsrConfig};
use crate::plan::tile_bits;
use crate::session::SessionTiming;
use crate::signal::Signal;

impl From<ConfigError> for PyErr {
    fn from(err: ConfigError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

#[pymethods]
impl Signal {
    /// Constructor for the `Signal` class. `seed=None` draws a random seed.
    #[new]
    #[pyo3(signature = (order=6, seed=Some(100)))]
    fn py_new(order: u32, seed: Option<i64>) -> Self {
        Signal::new(LfsrConfig::new(order, seed))
    }

    #[getter(order)]
    fn py_order(&self) -> u32 {
        self.lfsr().order()
    }

    #[getter(seed)]
    fn py_seed(&self) -> u64 {
        self.lfsr().seed()
    }

    #[getter(taps)]
    fn py_taps(&self) -> (u32, u32) {
        self.lfsr().taps()
    }

    #[pyo3(name = "bits")]
    fn py_bits<'py>(&self, py: Python<'py>) -> &'py PyArray1<u8> {
        self.sequence().bits().to_vec().into_pyarray(py)
    }

    #[pyo3(name = "plan")]
    fn py_plan<'py>(&self, py: Python<'py>, total_samples: usize) -> &'py PyArray1<u8> {
        self.plan(total_samples).into_bits().into_pyarray(py)
    }

    #[pyo3(signature = (sampling_period, session_duration, bit_hold=1))]
    fn plan_for_session<'py>(
        &self,
        py: Python<'py>,
        sampling_period: f64,
        session_duration: f64,
        bit_hold: usize,
    ) -> PyResult<&'py PyArray1<u8>> {
        let timing = SessionTiming::new(sampling_period, session_duration, bit_hold)?;
        Ok(self.plan_for(&timing)?.into_bits().into_pyarray(py))
    }

    fn __len__(&self) -> usize {
        self.sequence().len()
    }
}

#[pyfunction]
#[pyo3(signature = (order=6, seed=Some(100)))]
fn generate_prbs(order: u32, seed: Option<i64>) -> Vec<u8> {
    generate(order, seed).bits().to_vec()
}

#[pyfunction]
fn build_excitation_plan(bits: Vec<u8>, total_samples: usize) -> Vec<u8> {
    tile_bits(&bits, total_samples).into_bits()
}

pub fn register(m: &PyModule) -> PyResult<()> {
    m.add_class::<Signal>()?;
    m.add_function(wrap_pyfunction!(generate_prbs, m)?)?;
    m.add_function(wrap_pyfunction!(build_excitation_plan, m)?)?;
    Ok(())
}
