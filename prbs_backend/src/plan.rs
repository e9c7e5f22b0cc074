//! Length-matching of a PRBS to the number of samples a session needs.
//!
//! An [`ExcitationPlan`] is the exact bit sequence an acquisition run applies,
//! one bit per tick. It is built from a [`PrbsSequence`] by periodic tiling
//! (never by re-seeding the register), optionally stretched by a bit hold.

use ndarray::Array1;

use crate::error::ConfigError;
use crate::lfsr::PrbsSequence;

/// The finalized excitation, one bit per acquisition tick.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExcitationPlan {
    bits: Vec<u8>,
}

impl ExcitationPlan {
    pub fn from_bits(bits: Vec<u8>) -> Self {
        Self { bits }
    }

    pub fn bits(&self) -> &[u8] {
        &self.bits
    }
    pub fn len(&self) -> usize {
        self.bits.len()
    }
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }
    pub fn get(&self, tick: usize) -> Option<u8> {
        self.bits.get(tick).copied()
    }
    pub fn into_bits(self) -> Vec<u8> {
        self.bits
    }

    /// Holds every bit for `bit_hold` consecutive ticks.
    ///
    /// ```
    /// use prbs_backend::plan::ExcitationPlan;
    /// let plan = ExcitationPlan::from_bits(vec![1, 0]).with_bit_hold(3).unwrap();
    /// assert_eq!(plan.bits(), &[1, 1, 1, 0, 0, 0]);
    /// ```
    pub fn with_bit_hold(self, bit_hold: usize) -> Result<Self, ConfigError> {
        if bit_hold == 0 {
            return Err(ConfigError::BitHold(bit_hold));
        }
        if bit_hold == 1 {
            return Ok(self);
        }
        let bits = self
            .bits
            .iter()
            .flat_map(|&bit| std::iter::repeat(bit).take(bit_hold))
            .collect();
        Ok(Self { bits })
    }

    /// Output level per tick: `low` for a `0` bit, `high` for a `1` bit.
    pub fn levels(&self, low: f64, high: f64) -> Array1<f64> {
        self.bits
            .iter()
            .map(|&bit| if bit == 0 { low } else { high })
            .collect()
    }
}

/// Tiles or truncates `sequence` to exactly `total_samples` bits.
///
/// * `total_samples <= sequence.len()`: the first `total_samples` bits.
/// * otherwise: `total_samples / len` whole copies followed by the first
///   `total_samples % len` bits.
///
/// An empty sequence always yields an empty plan.
///
/// ```
/// use prbs_backend::lfsr::generate;
/// use prbs_backend::plan::build_excitation_plan;
///
/// let seq = generate(3, Some(0));
/// let plan = build_excitation_plan(&seq, 20);
/// assert_eq!(plan.len(), 20);
/// assert_eq!(&plan.bits()[..7], seq.bits());
/// assert_eq!(&plan.bits()[14..], &seq.bits()[..6]);
/// ```
pub fn build_excitation_plan(sequence: &PrbsSequence, total_samples: usize) -> ExcitationPlan {
    tile_bits(sequence.bits(), total_samples)
}

/// [`build_excitation_plan`] over a raw bit slice.
pub fn tile_bits(bits: &[u8], total_samples: usize) -> ExcitationPlan {
    let len = bits.len();
    if len == 0 || total_samples <= len {
        return ExcitationPlan::from_bits(bits[..total_samples.min(len)].to_vec());
    }

    let (reps, rest) = (total_samples / len, total_samples % len);
    let mut out = Vec::with_capacity(total_samples);
    for _ in 0..reps {
        out.extend_from_slice(bits);
    }
    out.extend_from_slice(&bits[..rest]);
    ExcitationPlan::from_bits(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_samples_is_empty() {
        assert!(tile_bits(&[1, 0, 1], 0).is_empty());
    }

    #[test]
    fn empty_sequence_never_tiles() {
        assert!(tile_bits(&[], 10).is_empty());
    }

    #[test]
    fn exact_multiple_has_no_remainder() {
        let plan = tile_bits(&[1, 0, 0], 6);
        assert_eq!(plan.bits(), &[1, 0, 0, 1, 0, 0]);
        assert_eq!(plan.get(3), Some(1));
        assert_eq!(plan.get(6), None);
    }

    #[test]
    fn zero_hold_rejected() {
        let err = ExcitationPlan::from_bits(vec![1]).with_bit_hold(0).unwrap_err();
        assert_eq!(err, ConfigError::BitHold(0));
    }

    #[test]
    fn levels_map_bits() {
        let plan = ExcitationPlan::from_bits(vec![0, 1, 1]);
        assert_eq!(plan.levels(0., 5.).to_vec(), vec![0., 5., 5.]);
    }
}
