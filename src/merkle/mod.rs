//! Merkle commitment layer of the engine.
//!
//! The module fixes the following protocol knobs:
//!
//! * **Arity:** binary trees only; every internal node is the two-to-one
//!   compression of its children.
//! * **Empty slots:** never-written leaves hold the hasher's empty sentinel,
//!   and each level has a precomputed empty-subtree digest used for padding
//!   and path defaults.
//! * **Heights:** `1..=MAX_HEIGHT` levels, giving capacities up to `2^32`
//!   leaf positions addressed as `u64`.
//! * **Hashing:** the [`MerkleHasher`] trait abstracts node compression;
//!   [`PoseidonMerkleHasher`] is the default for every tree and path.
//!
//! Two tree shapes share these rules: [`AppendOnlyMerkleTree`] fills slots
//! left to right with batched hashing, [`SparseMerkleTree`] addresses slots
//! directly and supports removal. Both finalize into the same roots and
//! paths for the same slot contents.

mod append_only;
mod hasher;
mod path;
mod ser;
mod sparse;
mod types;

pub use append_only::AppendOnlyMerkleTree;
pub use hasher::{empty_subtree_roots, MerkleHasher, PoseidonMerkleHasher};
pub use path::MerklePath;
pub use ser::{
    decode_append_only_tree, decode_merkle_path, decode_sparse_tree, encode_append_only_tree,
    encode_merkle_path, encode_sparse_tree,
};
pub use sparse::SparseMerkleTree;
pub use types::{MerkleError, PathError, MAX_HEIGHT};
