//! Derived Poseidon parameters for the BN254 scalar field instance.
//!
//! Round constants are drawn from a SHAKE-256 stream seeded with a versioned
//! domain tag and rejection-sampled into the field; the mixing matrix is the
//! Cauchy construction over small constants. Both are computed once at first
//! use and shared process-wide.

use once_cell::sync::Lazy;
use sha3::digest::{ExtendableOutput, Update, XofReader};
use sha3::Shake256;

use crate::field::{FieldElement, FIELD_SIZE};

/// Permutation state width in field elements.
pub const WIDTH: usize = 3;
/// Number of state slots absorbed per permutation call.
pub const RATE: usize = 2;
/// Rounds applying the S-box to every state slot.
pub const FULL_ROUNDS: usize = 8;
/// Rounds applying the S-box to the last state slot only.
pub const PARTIAL_ROUNDS: usize = 57;
/// Total round count of the permutation.
pub const TOTAL_ROUNDS: usize = FULL_ROUNDS + PARTIAL_ROUNDS;

/// Seed of the round-constant stream. Versioned so any parameter change
/// produces different digests instead of silently colliding.
const DOMAIN_TAG: &[u8] = b"POSEIDON-BN254FR-T3-A5-RF8-RP57-V1";

/// Permutation parameters shared by every hasher instance.
pub struct PoseidonParams {
    /// Additive round constants; row `r` is added ahead of round `r`.
    pub round_constants: Vec<[FieldElement; WIDTH]>,
    /// Cauchy MDS mixing matrix.
    pub mds: [[FieldElement; WIDTH]; WIDTH],
}

static PARAMS: Lazy<PoseidonParams> = Lazy::new(|| PoseidonParams {
    round_constants: derive_round_constants(),
    mds: cauchy_mds(),
});

/// Returns the process-wide parameter set.
pub fn params() -> &'static PoseidonParams {
    &PARAMS
}

/// Draws `TOTAL_ROUNDS * WIDTH` field elements from the domain-tagged
/// SHAKE-256 stream, masking each candidate to 254 bits and discarding draws
/// at or above the modulus.
fn derive_round_constants() -> Vec<[FieldElement; WIDTH]> {
    let mut hasher = Shake256::default();
    hasher.update(DOMAIN_TAG);
    let mut reader = hasher.finalize_xof();

    let mut rows = Vec::with_capacity(TOTAL_ROUNDS);
    let mut row = [FieldElement::ZERO; WIDTH];
    let mut filled = 0;
    while rows.len() < TOTAL_ROUNDS {
        let mut buf = [0u8; FIELD_SIZE];
        reader.read(&mut buf);
        buf[FIELD_SIZE - 1] &= 0x3f;
        if let Ok(constant) = FieldElement::from_bytes(&buf) {
            row[filled] = constant;
            filled += 1;
            if filled == WIDTH {
                rows.push(row);
                filled = 0;
            }
        }
    }
    rows
}

/// Builds the `WIDTH x WIDTH` Cauchy matrix `M[i][j] = (i + WIDTH + j)^-1`.
fn cauchy_mds() -> [[FieldElement; WIDTH]; WIDTH] {
    let mut mds = [[FieldElement::ZERO; WIDTH]; WIDTH];
    for (i, row) in mds.iter_mut().enumerate() {
        for (j, entry) in row.iter_mut().enumerate() {
            *entry = FieldElement::from((i + WIDTH + j) as u64)
                .inv()
                .expect("cauchy denominators are nonzero in the field");
        }
    }
    mds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_shape_ok() {
        let params = params();
        assert_eq!(params.round_constants.len(), TOTAL_ROUNDS);
        assert_eq!(TOTAL_ROUNDS, 65);
        assert_eq!(WIDTH - RATE, 1);
    }

    #[test]
    fn round_constants_are_nontrivial_ok() {
        let params = params();
        assert!(params
            .round_constants
            .iter()
            .all(|row| row.iter().any(|c| !c.is_zero())));
        // distinct rows, otherwise the stream is broken
        assert_ne!(params.round_constants[0], params.round_constants[1]);
    }

    #[test]
    fn mds_matches_cauchy_definition_ok() {
        let params = params();
        for i in 0..WIDTH {
            for j in 0..WIDTH {
                let denominator = FieldElement::from((i + WIDTH + j) as u64);
                assert_eq!(params.mds[i][j] * denominator, FieldElement::ONE);
            }
        }
    }
}
