use thiserror::Error;

/// Rejected session or loop parameters.
///
/// LFSR `order` and `seed` never produce this error: both are normalized into
/// the supported range (see [`crate::lfsr::normalize_order`] and
/// [`crate::lfsr::clamp_seed`]).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("sampling period must be a finite number of seconds > 0, got {0}")]
    SamplingPeriod(f64),
    #[error("sampling period of {0} s exceeds the longest sleep the clock can represent")]
    SamplingPeriodTooLong(f64),
    #[error("session duration must be a finite number of seconds >= 0, got {0}")]
    SessionDuration(f64),
    #[error("bit hold must be at least 1 sampling period, got {0}")]
    BitHold(usize),
    #[error("a {duration} s session at {bit_period} s per bit needs more ticks than fit in memory")]
    SessionTooLong { duration: f64, bit_period: f64 },
    #[error("validation percentage must lie in [0, 100], got {0}")]
    ValidationPercent(f64),
}
