//! Streaming Poseidon sponge over field elements.
//!
//! A sponge is initialised in one of two input-length modes:
//!
//! * **constant length** – the caller declares up front how many elements
//!   will be absorbed; the declared count seeds the capacity slot and
//!   [`PoseidonSponge::finalize`] rejects any other count.
//! * **variable length** – the capacity slot carries a fixed variable-length
//!   tag. With `mod_rate` set the absorbed count must be a multiple of the
//!   rate; otherwise the pending queue is closed with one padding element
//!   carrying its length.
//!
//! Finalisation never consumes the sponge: it works on a copy of the state,
//! so the digest can be read repeatedly and absorption can resume afterwards.
//! An optional personalization prefix is absorbed in zero-padded rate blocks
//! at initialisation and does not count toward the declared input length.

use core::fmt;

use super::params::{RATE, WIDTH};
use super::poseidon::permute;
use crate::field::FieldElement;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputLength {
    Constant(u64),
    Variable { mod_rate: bool },
}

/// Incremental Poseidon hasher producing a single field element.
#[derive(Debug, Clone)]
pub struct PoseidonSponge {
    mode: InputLength,
    state: [FieldElement; WIDTH],
    pending: Vec<FieldElement>,
    absorbed: u64,
}

impl PoseidonSponge {
    /// Creates a sponge that must absorb exactly `input_len` elements.
    pub fn constant_length(input_len: u64, personalization: Option<&[FieldElement]>) -> Self {
        Self::init(InputLength::Constant(input_len), personalization)
    }

    /// Creates a variable-length sponge; with `mod_rate` the absorbed count
    /// must stay a multiple of the rate.
    pub fn variable_length(mod_rate: bool, personalization: Option<&[FieldElement]>) -> Self {
        Self::init(InputLength::Variable { mod_rate }, personalization)
    }

    fn init(mode: InputLength, personalization: Option<&[FieldElement]>) -> Self {
        let tag = match mode {
            InputLength::Constant(input_len) => FieldElement::from(input_len),
            InputLength::Variable { .. } => FieldElement::from_u128(1u128 << 64),
        };
        let mut state = [FieldElement::ZERO; WIDTH];
        state[WIDTH - 1] = tag;
        if let Some(prefix) = personalization {
            for block in prefix.chunks(RATE) {
                // zip stops at the block end, which zero-pads short blocks
                for (slot, value) in state.iter_mut().zip(block.iter()) {
                    *slot += *value;
                }
                permute(&mut state);
            }
        }
        PoseidonSponge {
            mode,
            state,
            pending: Vec::with_capacity(RATE),
            absorbed: 0,
        }
    }

    /// Absorbs one element, permuting eagerly on every full rate block.
    pub fn update(&mut self, input: FieldElement) -> &mut Self {
        self.pending.push(input);
        self.absorbed += 1;
        if self.pending.len() == RATE {
            for (slot, value) in self.state.iter_mut().zip(self.pending.iter()) {
                *slot += *value;
            }
            permute(&mut self.state);
            self.pending.clear();
        }
        self
    }

    /// Number of elements absorbed since initialisation or the last reset.
    pub fn absorbed(&self) -> u64 {
        self.absorbed
    }

    /// Produces the digest without consuming the sponge.
    ///
    /// The pending queue and any mode padding are absorbed into a copy of
    /// the state, so repeated calls return the same digest and later
    /// `update` calls continue from the pre-finalize state.
    pub fn finalize(&self) -> Result<FieldElement, FinalizeError> {
        match self.mode {
            InputLength::Constant(expected) if self.absorbed != expected => {
                return Err(FinalizeError::InputCountMismatch {
                    expected,
                    absorbed: self.absorbed,
                });
            }
            InputLength::Variable { mod_rate: true } if self.absorbed % RATE as u64 != 0 => {
                return Err(FinalizeError::NotMultipleOfRate {
                    absorbed: self.absorbed,
                    rate: RATE,
                });
            }
            _ => {}
        }

        let mut state = self.state;
        let mut queue = self.pending.clone();
        if let InputLength::Variable { mod_rate: false } = self.mode {
            queue.push(FieldElement::from(self.pending.len() as u64));
        }
        for block in queue.chunks(RATE) {
            for (slot, value) in state.iter_mut().zip(block.iter()) {
                *slot += *value;
            }
            permute(&mut state);
        }
        Ok(state[0])
    }

    /// Restores the freshly-initialised state, keeping the input-length mode.
    pub fn reset(&mut self, personalization: Option<&[FieldElement]>) {
        *self = Self::init(self.mode, personalization);
    }
}

/// Error raised when a sponge is finalised with an invalid input count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeError {
    /// A constant-length sponge absorbed a different count than declared.
    InputCountMismatch {
        /// Declared input length.
        expected: u64,
        /// Elements actually absorbed.
        absorbed: u64,
    },
    /// A rate-aligned sponge absorbed a count not divisible by the rate.
    NotMultipleOfRate {
        /// Elements actually absorbed.
        absorbed: u64,
        /// Absorption rate of the permutation.
        rate: usize,
    },
}

impl fmt::Display for FinalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinalizeError::InputCountMismatch { expected, absorbed } => write!(
                f,
                "finalize failed: expected {} inputs, absorbed {}",
                expected, absorbed
            ),
            FinalizeError::NotMultipleOfRate { absorbed, rate } => write!(
                f,
                "finalize failed: absorbed {} inputs, not a multiple of the rate {}",
                absorbed, rate
            ),
        }
    }
}

impl std::error::Error for FinalizeError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::poseidon::hash_pair;

    fn hex(value: &FieldElement) -> String {
        value.to_bytes().iter().map(|b| format!("{:02x}", b)).collect()
    }

    #[test]
    fn variable_length_padding_golden_ok() {
        let mut sponge = PoseidonSponge::variable_length(false, None);
        sponge.update(FieldElement::from(3u64));
        sponge.update(FieldElement::from(4u64));
        let digest = sponge.finalize().expect("variable length always finalizes");
        assert_eq!(
            hex(&digest),
            "a35b9c3f2a1ad56e9bdb72cb90590f7d9434bc2875927ae7c764f15f40719a1a"
        );
    }

    #[test]
    fn constant_length_golden_ok() {
        let mut sponge = PoseidonSponge::constant_length(3, None);
        sponge
            .update(FieldElement::from(5u64))
            .update(FieldElement::from(6u64))
            .update(FieldElement::from(7u64));
        let digest = sponge.finalize().expect("declared count was absorbed");
        assert_eq!(
            hex(&digest),
            "c63b1e91fd12a1e367073487746ee49e0c4a69c8322b42cc91f0dd2a1738c524"
        );
    }

    #[test]
    fn mod_rate_golden_ok() {
        let mut sponge = PoseidonSponge::variable_length(true, None);
        sponge.update(FieldElement::from(8u64));
        sponge.update(FieldElement::from(9u64));
        let digest = sponge.finalize().expect("two inputs are rate aligned");
        assert_eq!(
            hex(&digest),
            "70fe46deea319e32d880f7e8784f2ebedff499a167aacaf85b157ac62235bb2c"
        );
    }

    #[test]
    fn personalization_golden_ok() {
        let prefix = [
            FieldElement::from(41u64),
            FieldElement::from(42u64),
            FieldElement::from(43u64),
        ];
        let mut sponge = PoseidonSponge::constant_length(2, Some(&prefix));
        sponge.update(FieldElement::ONE);
        sponge.update(FieldElement::from(2u64));
        let digest = sponge.finalize().expect("declared count was absorbed");
        assert_eq!(
            hex(&digest),
            "f2ce0d0d5aa8346661178f8f685ee8b1c7d0f81c7886596efa262a4f0cfaf415"
        );
    }

    #[test]
    fn personalization_changes_digest_ok() {
        let prefix = [FieldElement::from(41u64)];
        let mut plain = PoseidonSponge::constant_length(1, None);
        let mut personalized = PoseidonSponge::constant_length(1, Some(&prefix));
        plain.update(FieldElement::from(9u64));
        personalized.update(FieldElement::from(9u64));
        assert_ne!(
            plain.finalize().expect("count matches"),
            personalized.finalize().expect("prefix does not count")
        );
    }

    #[test]
    fn constant_length_mismatch_err() {
        let mut sponge = PoseidonSponge::constant_length(3, None);
        sponge.update(FieldElement::from(5u64));
        sponge.update(FieldElement::from(6u64));
        let err = sponge.finalize().expect_err("one element short");
        assert_eq!(
            err,
            FinalizeError::InputCountMismatch {
                expected: 3,
                absorbed: 2
            }
        );
        assert_eq!(err.to_string(), "finalize failed: expected 3 inputs, absorbed 2");
    }

    #[test]
    fn mod_rate_violation_err() {
        let mut sponge = PoseidonSponge::variable_length(true, None);
        sponge.update(FieldElement::ONE);
        let err = sponge.finalize().expect_err("one input breaks rate alignment");
        assert_eq!(
            err,
            FinalizeError::NotMultipleOfRate {
                absorbed: 1,
                rate: RATE
            }
        );
        assert_eq!(
            err.to_string(),
            "finalize failed: absorbed 1 inputs, not a multiple of the rate 2"
        );
    }

    #[test]
    fn finalize_is_idempotent_and_resumable_ok() {
        let mut sponge = PoseidonSponge::variable_length(false, None);
        sponge.update(FieldElement::from(3u64));
        let first = sponge.finalize().expect("variable length always finalizes");
        let again = sponge.finalize().expect("variable length always finalizes");
        assert_eq!(first, again);

        sponge.update(FieldElement::from(4u64));
        let resumed = sponge.finalize().expect("variable length always finalizes");
        let mut fresh = PoseidonSponge::variable_length(false, None);
        fresh.update(FieldElement::from(3u64));
        fresh.update(FieldElement::from(4u64));
        assert_eq!(resumed, fresh.finalize().expect("same absorption sequence"));
        assert_ne!(resumed, first);
    }

    #[test]
    fn sponge_matches_compression_ok() {
        let left = FieldElement::from(11u64);
        let right = FieldElement::from(22u64);
        let mut sponge = PoseidonSponge::constant_length(2, None);
        sponge.update(left);
        sponge.update(right);
        assert_eq!(
            sponge.finalize().expect("declared count was absorbed"),
            hash_pair(&left, &right)
        );
    }

    #[test]
    fn reset_restores_initial_state_ok() {
        let mut sponge = PoseidonSponge::variable_length(false, None);
        sponge.update(FieldElement::from(100u64));
        sponge.update(FieldElement::from(200u64));
        sponge.reset(None);
        assert_eq!(sponge.absorbed(), 0);
        sponge.update(FieldElement::from(3u64));
        sponge.update(FieldElement::from(4u64));
        assert_eq!(
            hex(&sponge.finalize().expect("variable length always finalizes")),
            "a35b9c3f2a1ad56e9bdb72cb90590f7d9434bc2875927ae7c764f15f40719a1a"
        );
    }

    #[test]
    fn empty_variable_input_finalizes_ok() {
        let sponge = PoseidonSponge::variable_length(false, None);
        let digest = sponge.finalize().expect("empty input pads to one block");
        assert_eq!(digest, sponge.finalize().expect("idempotent"));

        let aligned = PoseidonSponge::variable_length(true, None);
        aligned
            .finalize()
            .expect("zero inputs are a multiple of the rate");
    }
}
