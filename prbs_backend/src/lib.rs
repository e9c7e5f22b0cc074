pub mod error;
pub mod lfsr;
pub mod plan;
pub mod session;
pub mod signal;
pub mod utils;

#[cfg(feature = "python")]
pub mod python;

pub use error::*;
pub use lfsr::*;
pub use plan::*;
pub use session::*;
pub use signal::*;
pub use utils::*;

#[cfg(feature = "python")]
#[pyo3::pymodule]
fn prbs_backend(_py: pyo3::Python, m: &pyo3::types::PyModule) -> pyo3::PyResult<()> {
    python::register(m)
}
