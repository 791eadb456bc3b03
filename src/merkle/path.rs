//! Membership proofs connecting a leaf to the tree root.

use core::fmt;
use core::marker::PhantomData;

use super::hasher::{empty_subtree_roots, MerkleHasher, PoseidonMerkleHasher};
use super::types::PathError;
use crate::field::FieldElement;

/// Ordered sibling list proving one leaf slot, leaf level first.
///
/// Each entry pairs the sibling digest with the orientation flag of the
/// proven node: `true` means the node is the left child at that level, so
/// the sibling sits on the right. The flag sequence encodes the leaf
/// position bit by bit, which makes [`MerklePath::leaf_index`] recoverable
/// from the path alone.
pub struct MerklePath<H: MerkleHasher = PoseidonMerkleHasher> {
    elements: Vec<(FieldElement, bool)>,
    _hasher: PhantomData<H>,
}

impl<H: MerkleHasher> MerklePath<H> {
    /// Wraps an ordered `(sibling, is_left_child)` list.
    pub fn new(elements: Vec<(FieldElement, bool)>) -> Self {
        Self {
            elements,
            _hasher: PhantomData,
        }
    }

    /// Sibling and orientation per level, leaf level first.
    pub fn elements(&self) -> &[(FieldElement, bool)] {
        &self.elements
    }

    /// Number of levels covered by the path.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the path covers no levels.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Folds the leaf up through every sibling, producing the implied root.
    pub fn apply(&self, leaf: &FieldElement) -> FieldElement {
        let mut node = *leaf;
        for (sibling, is_left) in &self.elements {
            node = if *is_left {
                H::compress(&node, sibling)
            } else {
                H::compress(sibling, &node)
            };
        }
        node
    }

    /// Checks the path against a root for a tree of the given height.
    ///
    /// A path whose length differs from `height` is rejected with an explicit
    /// error rather than reported as a failed verification.
    pub fn verify(
        &self,
        height: u8,
        leaf: &FieldElement,
        root: &FieldElement,
    ) -> Result<bool, PathError> {
        if self.elements.len() != height as usize {
            return Err(PathError::LengthMismatch {
                expected: height as usize,
                got: self.elements.len(),
            });
        }
        Ok(self.apply(leaf) == *root)
    }

    /// Leaf position reconstructed from the orientation flags alone.
    pub fn leaf_index(&self) -> u64 {
        let mut index = 0u64;
        for (_, is_left) in self.elements.iter().rev() {
            index = (index << 1) | u64::from(!is_left);
        }
        index
    }

    /// Whether the proven slot is position 0.
    pub fn is_leftmost(&self) -> bool {
        self.elements.iter().all(|(_, is_left)| *is_left)
    }

    /// Whether the proven slot is the last position of the tree.
    pub fn is_rightmost(&self) -> bool {
        self.elements.iter().all(|(_, is_left)| !*is_left)
    }

    /// Whether every sibling to the right of the path is an empty subtree,
    /// certifying that no leaf exists past the proven slot.
    pub fn are_right_leaves_empty(&self) -> bool {
        let empty = empty_subtree_roots::<H>(self.elements.len() as u8);
        self.elements
            .iter()
            .enumerate()
            .all(|(level, (sibling, is_left))| !*is_left || *sibling == empty[level])
    }
}

impl<H: MerkleHasher> Clone for MerklePath<H> {
    fn clone(&self) -> Self {
        Self {
            elements: self.elements.clone(),
            _hasher: PhantomData,
        }
    }
}

impl<H: MerkleHasher> PartialEq for MerklePath<H> {
    fn eq(&self, other: &Self) -> bool {
        self.elements == other.elements
    }
}

impl<H: MerkleHasher> Eq for MerklePath<H> {}

impl<H: MerkleHasher> fmt::Debug for MerklePath<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MerklePath")
            .field("elements", &self.elements)
            .finish()
    }
}
