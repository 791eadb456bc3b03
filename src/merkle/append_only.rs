//! Sequential Merkle tree with batched internal-node hashing.

use core::fmt;
use core::marker::PhantomData;

use super::hasher::{empty_subtree_roots, MerkleHasher, PoseidonMerkleHasher};
use super::path::MerklePath;
use super::types::{MerkleError, MAX_HEIGHT};
use crate::field::FieldElement;

/// Fixed-height binary Merkle tree filled left to right.
///
/// Leaves are appended sequentially; internal nodes are hashed in batches of
/// `processing_step` appends, so identical content produces identical roots
/// and paths regardless of the chosen step. Never-appended slots hold the
/// hasher's empty-leaf sentinel.
pub struct AppendOnlyMerkleTree<H: MerkleHasher = PoseidonMerkleHasher> {
    height: u8,
    processing_step: u64,
    empty_roots: Vec<FieldElement>,
    // levels[0] holds the appended leaves, levels[h] the level-h nodes
    levels: Vec<Vec<FieldElement>>,
    finalized: bool,
    _hasher: PhantomData<H>,
}

impl<H: MerkleHasher> AppendOnlyMerkleTree<H> {
    /// Creates an empty tree of the given height and batching step.
    ///
    /// The height must lie in `1..=MAX_HEIGHT` and the step in
    /// `1..=capacity` where `capacity = 2^height`.
    pub fn new(height: u8, processing_step: u64) -> Result<Self, MerkleError> {
        if height == 0 || height > MAX_HEIGHT {
            return Err(MerkleError::HeightOutOfRange {
                height,
                max: MAX_HEIGHT,
            });
        }
        let capacity = 1u64 << height;
        if processing_step == 0 || processing_step > capacity {
            return Err(MerkleError::ProcessingStepOutOfRange {
                step: processing_step,
                capacity,
            });
        }
        Ok(Self {
            height,
            processing_step,
            empty_roots: empty_subtree_roots::<H>(height),
            levels: vec![Vec::new(); height as usize + 1],
            finalized: false,
            _hasher: PhantomData,
        })
    }

    /// Tree height in levels above the leaves.
    pub fn height(&self) -> u8 {
        self.height
    }

    /// Number of leaf slots.
    pub fn capacity(&self) -> u64 {
        1u64 << self.height
    }

    /// Batching step configured at construction.
    pub fn processing_step(&self) -> u64 {
        self.processing_step
    }

    /// Whether the tree has been finalized.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Number of leaves appended so far.
    pub fn leaf_count(&self) -> u64 {
        self.levels[0].len() as u64
    }

    /// Appended leaves in insertion order.
    pub fn leaves(&self) -> &[FieldElement] {
        &self.levels[0]
    }

    /// Appends the next leaf, hashing a batch of internal nodes whenever the
    /// appended count crosses a step boundary.
    pub fn append(&mut self, leaf: FieldElement) -> Result<&mut Self, MerkleError> {
        if self.finalized {
            return Err(MerkleError::AlreadyFinalized);
        }
        let capacity = self.capacity();
        if self.leaf_count() == capacity {
            return Err(MerkleError::TreeFull { capacity });
        }
        self.levels[0].push(leaf);
        if self.leaf_count() % self.processing_step == 0 {
            self.process_complete_pairs();
        }
        Ok(self)
    }

    /// Compresses every not-yet-hashed complete sibling pair on each level.
    fn process_complete_pairs(&mut self) {
        for level in 0..self.height as usize {
            let (lower, upper) = self.levels.split_at_mut(level + 1);
            let children = &lower[level];
            let parents = &mut upper[0];
            let complete = children.len() / 2;
            for pair in parents.len()..complete {
                parents.push(H::compress(&children[2 * pair], &children[2 * pair + 1]));
            }
        }
    }

    /// Completes the tree in place, padding the frontier with empty-subtree
    /// digests. Idempotent on an already-finalized tree.
    pub fn finalize_in_place(&mut self) {
        if self.finalized {
            return;
        }
        for level in 0..self.height as usize {
            let empty = self.empty_roots[level];
            let (lower, upper) = self.levels.split_at_mut(level + 1);
            let children = &lower[level];
            let parents = &mut upper[0];
            let complete = children.len() / 2;
            for pair in parents.len()..complete {
                parents.push(H::compress(&children[2 * pair], &children[2 * pair + 1]));
            }
            if children.len() % 2 == 1 {
                let last = children[children.len() - 1];
                parents.push(H::compress(&last, &empty));
            }
        }
        self.finalized = true;
    }

    /// Returns an independent finalized copy, leaving `self` open for further
    /// appends.
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
        Ok(self.levels[top].first().copied().unwrap_or(self.empty_roots[top]))
    }

    /// Membership path for any slot below capacity, including never-appended
    /// slots which prove the empty sentinel.
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
            .get(index as usize)
            .copied()
            .unwrap_or(self.empty_roots[level])
    }

    /// Position of the first appended leaf equal to `leaf`, if any.
    pub fn leaf_index(&self, leaf: &FieldElement) -> Option<u64> {
        self.levels[0]
            .iter()
            .position(|stored| stored == leaf)
            .map(|index| index as u64)
    }

    /// Whether `leaf` was appended to the tree.
    pub fn contains_leaf(&self, leaf: &FieldElement) -> bool {
        self.leaf_index(leaf).is_some()
    }

    /// Drops all leaves and reopens the tree, keeping height and step.
    pub fn reset(&mut self) {
        for level in &mut self.levels {
            level.clear();
        }
        self.finalized = false;
    }
}

impl<H: MerkleHasher> Clone for AppendOnlyMerkleTree<H> {
    fn clone(&self) -> Self {
        Self {
            height: self.height,
            processing_step: self.processing_step,
            empty_roots: self.empty_roots.clone(),
            levels: self.levels.clone(),
            finalized: self.finalized,
            _hasher: PhantomData,
        }
    }
}

impl<H: MerkleHasher> fmt::Debug for AppendOnlyMerkleTree<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppendOnlyMerkleTree")
            .field("height", &self.height)
            .field("processing_step", &self.processing_step)
            .field("leaf_count", &self.leaf_count())
            .field("finalized", &self.finalized)
            .finish()
    }
}
