//! Prime-field Merkle tree commitment engine.
//!
//! The crate packages four layers:
//!
//! * [`field`] – the BN254 scalar field with canonical 32-byte little-endian
//!   encodings.
//! * [`hash`] – the Poseidon permutation, two-to-one node compression and
//!   streaming sponge producing every digest in the engine.
//! * [`merkle`] – fixed-height binary commitment trees in append-only and
//!   sparse shapes, plus membership paths with structural predicates.
//! * [`ser`] – little-endian codecs shared by the tree and path blobs.
//!
//! Both tree shapes agree bit for bit on roots and paths for the same slot
//! contents, and every wire blob round-trips through the codecs.

#![forbid(unsafe_code)]

pub mod field;
pub mod hash;
pub mod merkle;
pub mod ser;

pub use field::{FieldDeserializeError, FieldElement, FIELD_SIZE};
pub use hash::{FinalizeError, PoseidonSponge};
pub use merkle::{
    AppendOnlyMerkleTree, MerkleError, MerkleHasher, MerklePath, PathError, PoseidonMerkleHasher,
    SparseMerkleTree, MAX_HEIGHT,
};
pub use ser::{SerError, SerKind, SerResult};
