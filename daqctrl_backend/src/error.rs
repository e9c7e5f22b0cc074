use thiserror::Error;

pub use prbs_backend::ConfigError;

/// A failed exchange with the acquisition hardware.
///
/// Fatal to the run in progress: the loop stops and hands back every sample
/// captured so far together with this error. No retry is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("failed to write excitation: {0}")]
    Write(String),
    #[error("failed to read measurement: {0}")]
    Read(String),
    #[error("failed to reset input buffer: {0}")]
    Reset(String),
    #[error("device disconnected")]
    Disconnected,
}

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("acquisition worker thread panicked")]
    Panicked,
}
