//! Position-addressed Merkle tree over a sparse leaf set.

use core::fmt;
use core::marker::PhantomData;

use std::collections::{BTreeMap, BTreeSet};

use super::hasher::{empty_subtree_roots, MerkleHasher, PoseidonMerkleHasher};
use super::path::MerklePath;
use super::types::{MerkleError, MAX_HEIGHT};
use crate::field::FieldElement;

/// Fixed-height binary Merkle tree storing only occupied positions.
///
/// Leaves live at arbitrary positions below `2^height`; everything else is
/// the hasher's empty-leaf sentinel. Internal nodes are derived at finalize
/// from the occupied set, so a sparse tree and an append-only tree with the
/// same slot contents produce identical roots and paths.
pub struct SparseMerkleTree<H: MerkleHasher = PoseidonMerkleHasher> {
    height: u8,
    empty_roots: Vec<FieldElement>,
    // levels[0] is the leaf map, upper maps stay empty until finalized
    levels: Vec<BTreeMap<u64, FieldElement>>,
    finalized: bool,
    _hasher: PhantomData<H>,
}

impl<H: MerkleHasher> SparseMerkleTree<H> {
    /// Creates an empty tree of the given height in `1..=MAX_HEIGHT`.
    pub fn new(height: u8) -> Result<Self, MerkleError> {
        if height == 0 || height > MAX_HEIGHT {
            return Err(MerkleError::HeightOutOfRange {
                height,
                max: MAX_HEIGHT,
            });
        }
        Ok(Self {
            height,
            empty_roots: empty_subtree_roots::<H>(height),
            levels: vec![BTreeMap::new(); height as usize + 1],
            finalized: false,
            _hasher: PhantomData,
        })
    }

    /// Tree height in levels above the leaves.
    pub fn height(&self) -> u8 {
        self.height
    }

    /// Number of leaf positions.
    pub fn capacity(&self) -> u64 {
        1u64 << self.height
    }

    /// Whether the tree has been finalized.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Number of occupied positions.
    pub fn leaf_count(&self) -> u64 {
        self.levels[0].len() as u64
    }

    /// Occupied positions and their leaves in position order.
    pub fn leaves(&self) -> impl Iterator<Item = (u64, FieldElement)> + '_ {
        self.levels[0].iter().map(|(position, leaf)| (*position, *leaf))
    }

    /// Inserts or overwrites leaves at the given positions.
    ///
    /// The whole batch is validated before any slot changes; a later entry
    /// for the same position wins.
    pub fn add_leaves<I>(&mut self, leaves: I) -> Result<&mut Self, MerkleError>
    where
        I: IntoIterator<Item = (u64, FieldElement)>,
    {
        if self.finalized {
            return Err(MerkleError::AlreadyFinalized);
        }
        let batch: Vec<(u64, FieldElement)> = leaves.into_iter().collect();
        let capacity = self.capacity();
        for (position, _) in &batch {
            if *position >= capacity {
                return Err(MerkleError::PositionOutOfRange {
                    position: *position,
                    capacity,
                });
            }
        }
        for (position, leaf) in batch {
            self.levels[0].insert(position, leaf);
        }
        Ok(self)
    }

    /// Clears the given positions back to the empty sentinel.
    ///
    /// The whole batch is validated before any slot changes; a position that
    /// is unoccupied, out of range, or repeated within the batch fails the
    /// call without modifying the tree.
    pub fn remove_leaves<I>(&mut self, positions: I) -> Result<&mut Self, MerkleError>
    where
        I: IntoIterator<Item = u64>,
    {
        if self.finalized {
            return Err(MerkleError::AlreadyFinalized);
        }
        let batch: Vec<u64> = positions.into_iter().collect();
        let capacity = self.capacity();
        let mut scheduled = BTreeSet::new();
        for &position in &batch {
            if position >= capacity {
                return Err(MerkleError::PositionOutOfRange { position, capacity });
            }
            if !self.levels[0].contains_key(&position) || !scheduled.insert(position) {
                return Err(MerkleError::PositionEmpty { position });
            }
        }
        for position in batch {
            self.levels[0].remove(&position);
        }
        Ok(self)
    }

    /// Whether the slot at `position` holds no leaf. Usable in any state.
    pub fn is_position_empty(&self, position: u64) -> Result<bool, MerkleError> {
        let capacity = self.capacity();
        if position >= capacity {
            return Err(MerkleError::PositionOutOfRange { position, capacity });
        }
        Ok(!self.levels[0].contains_key(&position))
    }

    /// Derives all internal levels from the occupied set. Idempotent on an
    /// already-finalized tree.
    pub fn finalize_in_place(&mut self) {
        if self.finalized {
            return;
        }
        for level in 0..self.height as usize {
            let parent_positions: BTreeSet<u64> =
                self.levels[level].keys().map(|position| position >> 1).collect();
            let mut parents = BTreeMap::new();
            for position in parent_positions {
                let left = self.node_at(level, 2 * position);
                let right = self.node_at(level, 2 * position + 1);
                parents.insert(position, H::compress(&left, &right));
            }
            self.levels[level + 1] = parents;
        }
        self.finalized = true;
    }

    /// Returns an independent finalized copy, leaving `self` open for more
    /// mutations.
    pub fn finalize(&self) -> Self {
        let mut finalized = self.clone();
        finalized.finalize_in_place();
        finalized
    }

    /// Root digest of the finalized tree.
    pub fn root(&self) -> Result<FieldElement, MerkleError> {
        if !self.finalized {
            return Err(MerkleError::NotFinalized);
        }
        let top = self.height as usize;
        Ok(self.levels[top]
            .get(&0)
            .copied()
            .unwrap_or(self.empty_roots[top]))
    }

    /// Membership path for any position below capacity; empty slots prove
    /// the empty sentinel.
    pub fn get_merkle_path(&self, position: u64) -> Result<MerklePath<H>, MerkleError> {
        if !self.finalized {
            return Err(MerkleError::NotFinalized);
        }
        let capacity = self.capacity();
        if position >= capacity {
            return Err(MerkleError::PositionOutOfRange { position, capacity });
        }
        let mut elements = Vec::with_capacity(self.height as usize);
        let mut index = position;
        for level in 0..self.height as usize {
            let sibling = self.node_at(level, index ^ 1);
            elements.push((sibling, index & 1 == 0));
            index >>= 1;
        }
        Ok(MerklePath::new(elements))
    }

    fn node_at(&self, level: usize, index: u64) -> FieldElement {
        self.levels[level]
            .get(&index)
            .copied()
            .unwrap_or(self.empty_roots[level])
    }

    /// Smallest occupied position holding a leaf equal to `leaf`, if any.
    pub fn leaf_index(&self, leaf: &FieldElement) -> Option<u64> {
        self.levels[0]
            .iter()
            .find(|(_, stored)| *stored == leaf)
            .map(|(position, _)| *position)
    }

    /// Whether any occupied position holds `leaf`.
    pub fn contains_leaf(&self, leaf: &FieldElement) -> bool {
        self.leaf_index(leaf).is_some()
    }

    /// Drops all leaves and reopens the tree, keeping the height.
    pub fn reset(&mut self) {
        for level in &mut self.levels {
            level.clear();
        }
        self.finalized = false;
    }
}

impl<H: MerkleHasher> Clone for SparseMerkleTree<H> {
    fn clone(&self) -> Self {
        Self {
            height: self.height,
            empty_roots: self.empty_roots.clone(),
            levels: self.levels.clone(),
            finalized: self.finalized,
            _hasher: PhantomData,
        }
    }
}

impl<H: MerkleHasher> fmt::Debug for SparseMerkleTree<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparseMerkleTree")
            .field("height", &self.height)
            .field("leaf_count", &self.leaf_count())
            .field("finalized", &self.finalized)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn felt(value: u64) -> FieldElement {
        FieldElement::from(value)
    }

    #[test]
    fn add_remove_roundtrip_matches_never_inserted_ok() {
        let mut staged = SparseMerkleTree::<PoseidonMerkleHasher>::new(4).expect("valid height");
        staged
            .add_leaves([(3, felt(30)), (9, felt(90)), (12, felt(120))])
            .expect("positions in range");
        staged.remove_leaves([9]).expect("position occupied");

        let mut direct = SparseMerkleTree::<PoseidonMerkleHasher>::new(4).expect("valid height");
        direct
            .add_leaves([(3, felt(30)), (12, felt(120))])
            .expect("positions in range");

        assert_eq!(
            staged.finalize().root().expect("finalized"),
            direct.finalize().root().expect("finalized")
        );
    }

    #[test]
    fn upsert_last_write_wins_ok() {
        let mut tree = SparseMerkleTree::<PoseidonMerkleHasher>::new(3).expect("valid height");
        tree.add_leaves([(5, felt(1)), (5, felt(2))])
            .expect("duplicate positions upsert");
        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.leaf_index(&felt(2)), Some(5));
        assert_eq!(tree.leaf_index(&felt(1)), None);
    }

    #[test]
    fn batch_validation_is_atomic_err() {
        let mut tree = SparseMerkleTree::<PoseidonMerkleHasher>::new(3).expect("valid height");
        tree.add_leaves([(1, felt(10))]).expect("position in range");

        let err = tree
            .add_leaves([(2, felt(20)), (8, felt(80))])
            .expect_err("position 8 exceeds capacity 8");
        assert_eq!(
            err,
            MerkleError::PositionOutOfRange {
                position: 8,
                capacity: 8
            }
        );
        assert!(tree.is_position_empty(2).expect("position in range"));

        let err = tree
            .remove_leaves([1, 5])
            .expect_err("position 5 holds no leaf");
        assert_eq!(err, MerkleError::PositionEmpty { position: 5 });
        assert!(!tree.is_position_empty(1).expect("position in range"));

        let err = tree
            .remove_leaves([1, 1])
            .expect_err("second removal hits an emptied slot");
        assert_eq!(err, MerkleError::PositionEmpty { position: 1 });
        assert!(!tree.is_position_empty(1).expect("position in range"));
    }

    #[test]
    fn state_machine_transitions_err() {
        let mut tree = SparseMerkleTree::<PoseidonMerkleHasher>::new(3).expect("valid height");
        assert_eq!(tree.root(), Err(MerkleError::NotFinalized));

        tree.add_leaves([(0, felt(5))]).expect("tree is open");
        tree.finalize_in_place();
        assert_eq!(
            tree.add_leaves([(1, felt(6))]).err(),
            Some(MerkleError::AlreadyFinalized)
        );
        assert_eq!(
            tree.remove_leaves([0]).err(),
            Some(MerkleError::AlreadyFinalized)
        );

        let root = tree.root().expect("finalized");
        tree.finalize_in_place();
        assert_eq!(tree.root().expect("finalized"), root);

        // queries that work in any state
        assert!(!tree.is_position_empty(0).expect("position in range"));
        assert!(tree.is_position_empty(1).expect("position in range"));
        assert_eq!(tree.leaf_index(&felt(5)), Some(0));
    }

    #[test]
    fn empty_tree_root_is_empty_chain_ok() {
        let tree = SparseMerkleTree::<PoseidonMerkleHasher>::new(6).expect("valid height");
        let expected = empty_subtree_roots::<PoseidonMerkleHasher>(6)[6];
        assert_eq!(tree.finalize().root().expect("finalized"), expected);
    }
}
