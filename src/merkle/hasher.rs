use crate::field::FieldElement;
use crate::hash::poseidon::hash_pair;

/// Hash abstraction used by the Merkle commitment layer.
///
/// Trees and paths are generic over this trait so the node compression can be
/// swapped out; the engine ships [`PoseidonMerkleHasher`] as the default.
pub trait MerkleHasher {
    /// Compresses two child nodes into their parent digest.
    fn compress(left: &FieldElement, right: &FieldElement) -> FieldElement;

    /// Sentinel stored in never-written leaf slots.
    fn empty_leaf() -> FieldElement {
        FieldElement::ZERO
    }
}

/// Default hasher backed by the Poseidon two-to-one compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoseidonMerkleHasher;

impl MerkleHasher for PoseidonMerkleHasher {
    fn compress(left: &FieldElement, right: &FieldElement) -> FieldElement {
        hash_pair(left, right)
    }
}

/// Precomputes the empty-subtree digest of every level up to `height`.
///
/// Index 0 holds the empty leaf; index `i + 1` compresses two copies of
/// index `i`. The returned vector has `height + 1` entries so the last one
/// is the root of a fully empty tree.
pub fn empty_subtree_roots<H: MerkleHasher>(height: u8) -> Vec<FieldElement> {
    let mut roots = Vec::with_capacity(height as usize + 1);
    roots.push(H::empty_leaf());
    for level in 0..height as usize {
        let parent = H::compress(&roots[level], &roots[level]);
        roots.push(parent);
    }
    roots
}
