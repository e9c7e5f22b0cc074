//! Maximal-length PRBS generation from a two-tap linear feedback shift register.
//!
//! ## Overview
//!
//! A PRBS of order `n` is produced by an `n`-bit register whose feedback is the
//! XNOR of two tap bits. Only the orders listed in [`SUPPORTED_ORDERS`] have a
//! known tap pair; every other requested order is snapped onto that table by
//! [`normalize_order`]. The register seed is likewise clamped into the valid
//! range by [`clamp_seed`]. Neither normalization is an error: callers asking
//! for PRBS2 simply receive PRBS3.
//!
//! ## Usage
//!
//! ```
//! use prbs_backend::lfsr::{generate, LfsrConfig};
//!
//! let seq = generate(6, Some(100));
//! assert_eq!(seq.order(), 6);
//! assert_eq!(seq.len(), 63);
//!
//! // Same thing through an explicit configuration
//! let cfg = LfsrConfig::new(6, Some(100)).normalize();
//! assert_eq!(cfg.sequence(), seq);
//! ```

use log::debug;
use rand::Rng;

/// Supported register orders and their feedback taps `(order, (tap1, tap2))`,
/// sorted by order.
pub const SUPPORTED_ORDERS: [(u32, (u32, u32)); 15] = [
    (3, (2, 1)),    // 7
    (4, (3, 2)),    // 15
    (5, (4, 2)),    // 31
    (6, (5, 4)),    // 63
    (7, (6, 5)),    // 127
    (9, (8, 4)),    // 511
    (10, (9, 6)),   // 1_023
    (11, (10, 8)),  // 2_047
    (15, (14, 13)), // 32_767
    (17, (16, 13)), // 131_071
    (18, (17, 10)), // 262_143
    (20, (19, 16)), // 1_048_575
    (21, (20, 18)), // 2_097_151
    (22, (21, 20)), // 4_194_303
    (23, (22, 17)), // 8_388_607
];

pub const MIN_ORDER: u32 = SUPPORTED_ORDERS[0].0;
pub const MAX_ORDER: u32 = SUPPORTED_ORDERS[SUPPORTED_ORDERS.len() - 1].0;

/// Snaps `order` to the smallest supported order that is `>= order`, or to
/// [`MAX_ORDER`] when the request exceeds every supported order.
///
/// ```
/// use prbs_backend::lfsr::normalize_order;
/// assert_eq!(normalize_order(2), 3);
/// assert_eq!(normalize_order(8), 9);
/// assert_eq!(normalize_order(30), 23);
/// ```
pub fn normalize_order(order: u32) -> u32 {
    SUPPORTED_ORDERS
        .iter()
        .map(|&(supported, _)| supported)
        .find(|&supported| supported >= order)
        .unwrap_or(MAX_ORDER)
}

/// Feedback taps of a supported order, `None` for orders outside the table.
pub fn taps(order: u32) -> Option<(u32, u32)> {
    SUPPORTED_ORDERS
        .iter()
        .find(|&&(supported, _)| supported == order)
        .map(|&(_, taps)| taps)
}

/// Maximal sequence length `2^order - 1`.
pub fn sequence_len(order: u32) -> u64 {
    (1u64 << order) - 1
}

/// Clamps `seed` into `[0, 2^order - 2]`.
pub fn clamp_seed(order: u32, seed: i64) -> u64 {
    let max_seed = sequence_len(order) - 1;
    if seed < 0 {
        0
    } else {
        (seed as u64).min(max_seed)
    }
}

/// Requested register configuration, before normalization.
///
/// `seed: None` draws a uniformly random seed when the configuration is
/// normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LfsrConfig {
    pub order: u32,
    pub seed: Option<i64>,
}

impl Default for LfsrConfig {
    /// PRBS6 seeded with 100 (clamps to 62), the default excitation of the acquisition tool.
    fn default() -> Self {
        Self {
            order: 6,
            seed: Some(100),
        }
    }
}

impl LfsrConfig {
    pub fn new(order: u32, seed: Option<i64>) -> Self {
        Self { order, seed }
    }

    /// Normalizes order and seed, drawing an unset seed from the thread-local RNG.
    pub fn normalize(&self) -> NormalizedLfsr {
        self.normalize_with(&mut rand::thread_rng())
    }

    /// Same as [`LfsrConfig::normalize`], drawing an unset seed from `rng`.
    pub fn normalize_with<R: Rng>(&self, rng: &mut R) -> NormalizedLfsr {
        let order = normalize_order(self.order);
        let seed = match self.seed {
            Some(seed) => clamp_seed(order, seed),
            None => rng.gen_range(0..sequence_len(order)),
        };
        if order != self.order {
            debug!("PRBS order {} snapped to supported order {}", self.order, order);
        }
        NormalizedLfsr {
            order,
            seed,
            // The table lookup cannot miss after `normalize_order`
            taps: taps(order).unwrap_or(SUPPORTED_ORDERS[SUPPORTED_ORDERS.len() - 1].1),
        }
    }
}

/// A register configuration whose order is in [`SUPPORTED_ORDERS`] and whose
/// seed lies in `[0, 2^order - 2]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedLfsr {
    order: u32,
    seed: u64,
    taps: (u32, u32),
}

impl NormalizedLfsr {
    pub fn order(&self) -> u32 {
        self.order
    }
    pub fn seed(&self) -> u64 {
        self.seed
    }
    pub fn taps(&self) -> (u32, u32) {
        self.taps
    }

    /// Runs the register and collects its output bits.
    ///
    /// The first bit is the seed's LSB. Each step shifts the XNOR of the two
    /// taps into the register and emits it. Generation stops early, without
    /// emitting the current bit, if the register returns to the seed or lands
    /// on the all-ones lock-up state; otherwise the result has `2^order - 1`
    /// bits.
    pub fn sequence(&self) -> PrbsSequence {
        let size = sequence_len(self.order);
        let (tap1, tap2) = self.taps;

        let mut bits = Vec::with_capacity(size as usize);
        bits.push((self.seed & 1) as u8);

        let mut value = self.seed;
        for _ in 0..size - 1 {
            let feedback = !((value >> tap1) ^ (value >> tap2)) & 1;
            value = ((value << 1) + feedback) & size;
            if value == self.seed || value == size {
                debug!(
                    "PRBS{} seed {} closed its cycle after {} bits",
                    self.order,
                    self.seed,
                    bits.len()
                );
                break;
            }
            bits.push(feedback as u8);
        }

        PrbsSequence {
            order: self.order,
            seed: self.seed,
            bits,
        }
    }
}

/// Generates the PRBS for `(order, seed)` after normalizing both.
pub fn generate(order: u32, seed: Option<i64>) -> PrbsSequence {
    LfsrConfig::new(order, seed).normalize().sequence()
}

/// An immutable PRBS, one bit (`0` or `1`) per element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrbsSequence {
    order: u32,
    seed: u64,
    bits: Vec<u8>,
}

impl PrbsSequence {
    pub fn order(&self) -> u32 {
        self.order
    }
    pub fn seed(&self) -> u64 {
        self.seed
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
    /// `true` when the register ran the full `2^order - 1` steps.
    pub fn is_maximal(&self) -> bool {
        self.bits.len() as u64 == sequence_len(self.order)
    }
}

impl AsRef<[u8]> for PrbsSequence {
    fn as_ref(&self) -> &[u8] {
        &self.bits
    }
}
