pub mod acquisition;
pub mod clock;
pub mod dataset;
pub mod device;
pub mod error;
pub mod sim;
pub mod worker;
pub mod worker_cmd_chan;

#[cfg(feature = "python")]
pub mod python;

pub use crate::acquisition::*;
pub use crate::clock::*;
pub use crate::dataset::*;
pub use crate::device::*;
pub use crate::error::*;
pub use crate::sim::SimulatedPlant;
pub use crate::worker::{AcqEvent, AcquisitionWorker};
pub use prbs_backend::{build_excitation_plan, generate, ExcitationPlan, LfsrConfig, PrbsSequence, SessionTiming, Signal};

#[cfg(feature = "python")]
#[pyo3::pymodule]
fn daqctrl_backend(_py: pyo3::Python, m: &pyo3::types::PyModule) -> pyo3::PyResult<()> {
    prbs_backend::python::register(m)?;
    python::register(m)
}
