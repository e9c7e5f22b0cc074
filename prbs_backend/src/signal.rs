//! The [`Signal`] struct ties an LFSR configuration to its generated sequence
//! and is the single place by which excitation plans are built for a session.
//!
//! ## Overview
//!
//! Generation runs once, when the `Signal` is constructed: the configuration
//! is normalized (order snapped to the supported table, seed clamped or drawn
//! at random), the register is run, and the resulting [`PrbsSequence`] is kept
//! for the lifetime of the `Signal`. Every plan built afterwards tiles that
//! same sequence, so repeated sessions apply bit-identical excitation.
//!
//! ## Usage
//!
//! ```
//! use prbs_backend::session::SessionTiming;
//! use prbs_backend::signal::Signal;
//!
//! let signal = Signal::default(); // PRBS6, seed 100
//! let timing = SessionTiming::new(0.5, 40., 1).unwrap();
//! let plan = signal.plan_for(&timing).unwrap();
//! assert_eq!(plan.len(), 81);
//! ```

use rand::Rng;

use crate::error::ConfigError;
use crate::lfsr::{LfsrConfig, NormalizedLfsr, PrbsSequence};
use crate::plan::{build_excitation_plan, ExcitationPlan};
use crate::session::SessionTiming;
use crate::utils::TickTimer;

#[cfg_attr(feature = "python", pyo3::pyclass)]
#[derive(Debug, Clone)]
pub struct Signal {
    lfsr: NormalizedLfsr,
    sequence: PrbsSequence,
}

impl Default for Signal {
    fn default() -> Self {
        Self::new(LfsrConfig::default())
    }
}

impl Signal {
    /// Normalizes `config` and generates its sequence.
    pub fn new(config: LfsrConfig) -> Self {
        Self::from_normalized(config.normalize())
    }

    /// Like [`Signal::new`], drawing an unset seed from `rng`.
    pub fn with_rng<R: Rng>(config: LfsrConfig, rng: &mut R) -> Self {
        Self::from_normalized(config.normalize_with(rng))
    }

    pub fn from_normalized(lfsr: NormalizedLfsr) -> Self {
        let mut timer = TickTimer::new();
        let sequence = lfsr.sequence();
        timer.tick_log(&format!("PRBS{} generation ({} bits)", lfsr.order(), sequence.len()));
        Self { lfsr, sequence }
    }

    pub fn lfsr(&self) -> &NormalizedLfsr {
        &self.lfsr
    }
    pub fn sequence(&self) -> &PrbsSequence {
        &self.sequence
    }

    /// Tiles the sequence to exactly `total_samples` bits.
    pub fn plan(&self, total_samples: usize) -> ExcitationPlan {
        build_excitation_plan(&self.sequence, total_samples)
    }

    /// The plan for a whole session: [`SessionTiming::plan_bits`] tiled bits,
    /// each held for [`SessionTiming::bit_hold`] ticks.
    pub fn plan_for(&self, timing: &SessionTiming) -> Result<ExcitationPlan, ConfigError> {
        self.plan(timing.plan_bits()).with_bit_hold(timing.bit_hold())
    }
}
