use core::fmt;

/// Highest supported tree height; keeps every position addressable as `u64`.
pub const MAX_HEIGHT: u8 = 32;

/// Errors emitted by the Merkle tree layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MerkleError {
    /// Requested height is zero or above [`MAX_HEIGHT`].
    HeightOutOfRange { height: u8, max: u8 },
    /// Processing step is zero or above the tree capacity.
    ProcessingStepOutOfRange { step: u64, capacity: u64 },
    /// Every leaf slot is already occupied.
    TreeFull { capacity: u64 },
    /// Mutation attempted on a finalized tree.
    AlreadyFinalized,
    /// Root or path requested before the tree was finalized.
    NotFinalized,
    /// Leaf position does not exist at this height.
    PositionOutOfRange { position: u64, capacity: u64 },
    /// Removal targeted a position that stores no leaf.
    PositionEmpty { position: u64 },
}

impl fmt::Display for MerkleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MerkleError::HeightOutOfRange { height, max } => {
                write!(f, "height {} out of range (supported 1..={})", height, max)
            }
            MerkleError::ProcessingStepOutOfRange { step, capacity } => {
                write!(f, "processing step {} out of range (capacity {})", step, capacity)
            }
            MerkleError::TreeFull { capacity } => write!(f, "tree full (capacity {})", capacity),
            MerkleError::AlreadyFinalized => write!(f, "tree already finalized"),
            MerkleError::NotFinalized => write!(f, "tree not finalized"),
            MerkleError::PositionOutOfRange { position, capacity } => {
                write!(f, "position {} out of range (capacity {})", position, capacity)
            }
            MerkleError::PositionEmpty { position } => {
                write!(f, "position {} is empty", position)
            }
        }
    }
}

impl std::error::Error for MerkleError {}

/// Errors emitted while verifying a Merkle path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathError {
    /// Path length differs from the height of the verifying tree.
    LengthMismatch { expected: usize, got: usize },
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::LengthMismatch { expected, got } => {
                write!(f, "path length mismatch: expected {}, got {}", expected, got)
            }
        }
    }
}

impl std::error::Error for PathError {}
