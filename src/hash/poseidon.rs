//! Poseidon permutation and two-to-one node compression.

use super::params::{params, FULL_ROUNDS, PARTIAL_ROUNDS, RATE, TOTAL_ROUNDS, WIDTH};
use crate::field::FieldElement;

/// Applies the Poseidon permutation to the state in place.
///
/// Full rounds apply the `x^5` S-box to every slot, partial rounds to the
/// last slot only; every round mixes through the MDS matrix and absorbs the
/// next round-constant row.
pub fn permute(state: &mut [FieldElement; WIDTH]) {
    let params = params();
    add_round_constants(state, &params.round_constants[0]);
    let half = FULL_ROUNDS / 2;
    for round in 0..TOTAL_ROUNDS {
        if round < half || round >= half + PARTIAL_ROUNDS {
            for slot in state.iter_mut() {
                *slot = sbox(*slot);
            }
        } else {
            state[WIDTH - 1] = sbox(state[WIDTH - 1]);
        }
        mix(state, &params.mds);
        if round + 1 < TOTAL_ROUNDS {
            add_round_constants(state, &params.round_constants[round + 1]);
        }
    }
}

/// Compresses two nodes into their parent digest.
///
/// Equivalent to a constant-length sponge over exactly the two inputs; the
/// capacity slot carries the input count as domain separation.
pub fn hash_pair(left: &FieldElement, right: &FieldElement) -> FieldElement {
    let mut state = [*left, *right, FieldElement::from(RATE as u64)];
    permute(&mut state);
    state[0]
}

fn sbox(value: FieldElement) -> FieldElement {
    let square = value.square();
    square.square() * value
}

fn add_round_constants(state: &mut [FieldElement; WIDTH], row: &[FieldElement; WIDTH]) {
    for (slot, constant) in state.iter_mut().zip(row.iter()) {
        *slot += *constant;
    }
}

fn mix(state: &mut [FieldElement; WIDTH], mds: &[[FieldElement; WIDTH]; WIDTH]) {
    let mut mixed = [FieldElement::ZERO; WIDTH];
    for (acc, row) in mixed.iter_mut().zip(mds.iter()) {
        for (entry, slot) in row.iter().zip(state.iter()) {
            *acc += *entry * *slot;
        }
    }
    *state = mixed;
}
