//! Poseidon hashing over the prime field.
//!
//! The submodules cover the three layers of the hash stack:
//!
//! * [`params`] – derived permutation parameters (round constants, MDS
//!   matrix) behind a process-wide lazy static.
//! * [`poseidon`] – the raw permutation and the two-to-one node compression
//!   used by the Merkle layer.
//! * [`sponge`] – the streaming sponge with constant-length and
//!   variable-length absorption modes.
//!
//! All digests are single field elements; byte-oriented callers serialize
//! through the canonical field encoding.

pub mod params;
pub mod poseidon;
pub mod sponge;

pub use params::{PoseidonParams, FULL_ROUNDS, PARTIAL_ROUNDS, RATE, TOTAL_ROUNDS, WIDTH};
pub use poseidon::{hash_pair, permute};
pub use sponge::{FinalizeError, PoseidonSponge};
