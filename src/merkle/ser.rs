//! Binary codecs for trees and paths.
//!
//! Tree blobs carry the construction parameters, the lifecycle flag and the
//! raw leaves; decoding replays the leaves through the normal mutation path,
//! so internal levels are rebuilt rather than trusted from the wire and a
//! decoded tree is bit-identical to the encoded one. All layouts are
//! little-endian and versioned, and every decoder rejects trailing bytes.

use super::append_only::AppendOnlyMerkleTree;
use super::hasher::MerkleHasher;
use super::path::MerklePath;
use super::sparse::SparseMerkleTree;
use super::types::MerkleError;
use crate::field::FIELD_SIZE;
use crate::ser::{
    ensure_consumed, ensure_u32, read_bool, read_felt, read_u16, read_u32, read_u64, read_u8,
    write_bool, write_felt, write_u16, write_u32, write_u64, write_u8, ByteReader, SerError,
    SerKind, SerResult,
};

const PATH_VERSION: u16 = 1;
const TREE_VERSION: u16 = 1;
const APPEND_ONLY_TAG: u8 = 1;
const SPARSE_TAG: u8 = 2;

/// Encodes a path as `version | length | (sibling, direction)*`.
pub fn encode_merkle_path<H: MerkleHasher>(path: &MerklePath<H>) -> SerResult<Vec<u8>> {
    let kind = SerKind::MerklePath;
    let mut out = Vec::with_capacity(2 + 4 + path.len() * (FIELD_SIZE + 1));
    write_u16(&mut out, PATH_VERSION);
    write_u32(&mut out, ensure_u32(path.len(), kind, "length")?);
    for (sibling, is_left) in path.elements() {
        write_felt(&mut out, sibling);
        write_bool(&mut out, *is_left);
    }
    Ok(out)
}

/// Decodes a path blob produced by [`encode_merkle_path`].
pub fn decode_merkle_path<H: MerkleHasher>(bytes: &[u8]) -> SerResult<MerklePath<H>> {
    let kind = SerKind::MerklePath;
    let mut cursor = ByteReader::new(bytes);
    let version = read_u16(&mut cursor, kind, "version")?;
    if version != PATH_VERSION {
        return Err(SerError::invalid_value(kind, "version"));
    }
    let length = read_u32(&mut cursor, kind, "length")? as usize;
    if length > cursor.remaining() / (FIELD_SIZE + 1) {
        return Err(SerError::invalid_length(kind, "length"));
    }
    let mut elements = Vec::with_capacity(length);
    for _ in 0..length {
        let sibling = read_felt(&mut cursor, kind, "sibling")?;
        let is_left = read_bool(&mut cursor, kind, "direction")?;
        elements.push((sibling, is_left));
    }
    ensure_consumed(&cursor, kind)?;
    Ok(MerklePath::new(elements))
}

/// Encodes an append-only tree as
/// `tag | version | height | step | finalized | count | leaves`.
pub fn encode_append_only_tree<H: MerkleHasher>(
    tree: &AppendOnlyMerkleTree<H>,
) -> SerResult<Vec<u8>> {
    let leaves = tree.leaves();
    let mut out = Vec::with_capacity(1 + 2 + 1 + 8 + 1 + 8 + leaves.len() * FIELD_SIZE);
    write_u8(&mut out, APPEND_ONLY_TAG);
    write_u16(&mut out, TREE_VERSION);
    write_u8(&mut out, tree.height());
    write_u64(&mut out, tree.processing_step());
    write_bool(&mut out, tree.is_finalized());
    write_u64(&mut out, tree.leaf_count());
    for leaf in leaves {
        write_felt(&mut out, leaf);
    }
    Ok(out)
}

/// Decodes an append-only tree blob, replaying every leaf.
pub fn decode_append_only_tree<H: MerkleHasher>(
    bytes: &[u8],
) -> SerResult<AppendOnlyMerkleTree<H>> {
    let kind = SerKind::AppendOnlyTree;
    let mut cursor = ByteReader::new(bytes);
    let tag = read_u8(&mut cursor, kind, "variant")?;
    if tag != APPEND_ONLY_TAG {
        return Err(SerError::invalid_value(kind, "variant"));
    }
    let version = read_u16(&mut cursor, kind, "version")?;
    if version != TREE_VERSION {
        return Err(SerError::invalid_value(kind, "version"));
    }
    let height = read_u8(&mut cursor, kind, "height")?;
    let step = read_u64(&mut cursor, kind, "processing step")?;
    let finalized = read_bool(&mut cursor, kind, "finalized")?;
    let count = read_u64(&mut cursor, kind, "count")?;

    let mut tree = AppendOnlyMerkleTree::<H>::new(height, step).map_err(|err| match err {
        MerkleError::ProcessingStepOutOfRange { .. } => {
            SerError::invalid_value(kind, "processing step")
        }
        _ => SerError::invalid_value(kind, "height"),
    })?;
    if count > tree.capacity() || count > (cursor.remaining() / FIELD_SIZE) as u64 {
        return Err(SerError::invalid_length(kind, "count"));
    }
    for _ in 0..count {
        let leaf = read_felt(&mut cursor, kind, "leaf")?;
        tree.append(leaf)
            .map_err(|_| SerError::invalid_value(kind, "leaf"))?;
    }
    if finalized {
        tree.finalize_in_place();
    }
    ensure_consumed(&cursor, kind)?;
    Ok(tree)
}

/// Encodes a sparse tree as
/// `tag | version | height | finalized | count | (position, leaf)*` with
/// positions in strictly increasing order.
pub fn encode_sparse_tree<H: MerkleHasher>(tree: &SparseMerkleTree<H>) -> SerResult<Vec<u8>> {
    let count = tree.leaf_count() as usize;
    let mut out = Vec::with_capacity(1 + 2 + 1 + 1 + 8 + count * (8 + FIELD_SIZE));
    write_u8(&mut out, SPARSE_TAG);
    write_u16(&mut out, TREE_VERSION);
    write_u8(&mut out, tree.height());
    write_bool(&mut out, tree.is_finalized());
    write_u64(&mut out, tree.leaf_count());
    for (position, leaf) in tree.leaves() {
        write_u64(&mut out, position);
        write_felt(&mut out, &leaf);
    }
    Ok(out)
}

/// Decodes a sparse tree blob, replaying every occupied position.
pub fn decode_sparse_tree<H: MerkleHasher>(bytes: &[u8]) -> SerResult<SparseMerkleTree<H>> {
    let kind = SerKind::SparseTree;
    let mut cursor = ByteReader::new(bytes);
    let tag = read_u8(&mut cursor, kind, "variant")?;
    if tag != SPARSE_TAG {
        return Err(SerError::invalid_value(kind, "variant"));
    }
    let version = read_u16(&mut cursor, kind, "version")?;
    if version != TREE_VERSION {
        return Err(SerError::invalid_value(kind, "version"));
    }
    let height = read_u8(&mut cursor, kind, "height")?;
    let finalized = read_bool(&mut cursor, kind, "finalized")?;
    let count = read_u64(&mut cursor, kind, "count")?;

    let mut tree = SparseMerkleTree::<H>::new(height)
        .map_err(|_| SerError::invalid_value(kind, "height"))?;
    let entry_size = 8 + FIELD_SIZE;
    if count > tree.capacity() || count > (cursor.remaining() / entry_size) as u64 {
        return Err(SerError::invalid_length(kind, "count"));
    }
    let mut batch = Vec::with_capacity(count as usize);
    let mut previous: Option<u64> = None;
    for _ in 0..count {
        let position = read_u64(&mut cursor, kind, "position")?;
        if previous.map_or(false, |last| position <= last) {
            return Err(SerError::invalid_value(kind, "position"));
        }
        previous = Some(position);
        let leaf = read_felt(&mut cursor, kind, "leaf")?;
        batch.push((position, leaf));
    }
    tree.add_leaves(batch)
        .map_err(|_| SerError::invalid_value(kind, "position"))?;
    if finalized {
        tree.finalize_in_place();
    }
    ensure_consumed(&cursor, kind)?;
    Ok(tree)
}
