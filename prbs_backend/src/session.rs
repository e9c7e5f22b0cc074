//! Sizing of an acquisition session.
//!
//! A session runs for `session_duration` seconds, sampling every
//! `sampling_period` seconds, and holds every PRBS bit for `bit_hold` samples.
//! The bit period is therefore `TB = sampling_period * bit_hold`, the session
//! needs `floor(session_duration / TB) + 1` PRBS bits, and the acquisition
//! loop runs `bit_hold` ticks per bit.

use std::time::Duration;

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionTiming {
    sampling_period: f64,
    session_duration: f64,
    bit_hold: usize,
}

impl Default for SessionTiming {
    /// 0.5 s sampling period, 10 s session, every bit held for one sample.
    fn default() -> Self {
        Self {
            sampling_period: 0.5,
            session_duration: 10.0,
            bit_hold: 1,
        }
    }
}

impl SessionTiming {
    /// Validates and builds a session timing.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::SamplingPeriod`] unless `sampling_period` is finite and `> 0`.
    /// * [`ConfigError::SessionDuration`] unless `session_duration` is finite and `>= 0`.
    /// * [`ConfigError::BitHold`] if `bit_hold == 0`.
    /// * [`ConfigError::SessionTooLong`] if the tick count overflows `usize`.
    pub fn new(
        sampling_period: f64,
        session_duration: f64,
        bit_hold: usize,
    ) -> Result<Self, ConfigError> {
        validate_sampling_period(sampling_period)?;
        if !session_duration.is_finite() || session_duration < 0. {
            return Err(ConfigError::SessionDuration(session_duration));
        }
        if bit_hold == 0 {
            return Err(ConfigError::BitHold(bit_hold));
        }
        let timing = Self {
            sampling_period,
            session_duration,
            bit_hold,
        };
        if timing.checked_total_ticks().is_none() {
            return Err(ConfigError::SessionTooLong {
                duration: session_duration,
                bit_period: timing.bit_period(),
            });
        }
        Ok(timing)
    }

    fn checked_total_ticks(&self) -> Option<usize> {
        let whole_bits = (self.session_duration / self.bit_period()).floor();
        // `usize::MAX as f64` rounds up to 2^64, which does not fit
        if whole_bits >= usize::MAX as f64 {
            return None;
        }
        (whole_bits as usize)
            .checked_add(1)?
            .checked_mul(self.bit_hold)
    }

    pub fn sampling_period(&self) -> f64 {
        self.sampling_period
    }
    pub fn session_duration(&self) -> f64 {
        self.session_duration
    }
    pub fn bit_hold(&self) -> usize {
        self.bit_hold
    }

    /// Duration of one PRBS bit, `sampling_period * bit_hold`.
    pub fn bit_period(&self) -> f64 {
        self.sampling_period * self.bit_hold as f64
    }

    /// Number of PRBS bits the session consumes.
    ///
    /// ```
    /// use prbs_backend::session::SessionTiming;
    /// let timing = SessionTiming::new(0.5, 10., 1).unwrap();
    /// assert_eq!(timing.plan_bits(), 21);
    /// ```
    pub fn plan_bits(&self) -> usize {
        (self.session_duration / self.bit_period()).floor() as usize + 1
    }

    /// Number of acquisition ticks, `plan_bits * bit_hold`.
    pub fn total_ticks(&self) -> usize {
        self.plan_bits() * self.bit_hold
    }
}

/// Accepts finite periods strictly greater than zero that a [`Duration`] can hold.
pub fn validate_sampling_period(sampling_period: f64) -> Result<(), ConfigError> {
    if !sampling_period.is_finite() || sampling_period <= 0. {
        return Err(ConfigError::SamplingPeriod(sampling_period));
    }
    if Duration::try_from_secs_f64(sampling_period).is_err() {
        return Err(ConfigError::SamplingPeriodTooLong(sampling_period));
    }
    Ok(())
}
