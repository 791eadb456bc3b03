use field_mht::merkle::{
    decode_merkle_path, encode_merkle_path, AppendOnlyMerkleTree, SparseMerkleTree,
};
use field_mht::FieldElement;

type AppendOnly = AppendOnlyMerkleTree;
type Sparse = SparseMerkleTree;

const HEIGHT: u8 = 6;
const OCCUPIED: u64 = 32;

fn slot_leaf(position: u64) -> FieldElement {
    FieldElement::from(1000 + 37 * position)
}

fn hex(value: &FieldElement) -> String {
    value.to_bytes().iter().map(|b| format!("{:02x}", b)).collect()
}

/// Builds both tree shapes over the first 32 slots, leaving 32 slots empty.
fn half_filled_trees() -> (AppendOnly, Sparse) {
    let mut appended = AppendOnly::new(HEIGHT, 16).expect("valid parameters");
    for position in 0..OCCUPIED {
        appended.append(slot_leaf(position)).expect("capacity not reached");
    }
    appended.finalize_in_place();

    let mut sparse = Sparse::new(HEIGHT).expect("valid height");
    sparse
        .add_leaves((0..OCCUPIED).map(|position| (position, slot_leaf(position))))
        .expect("positions in range");
    sparse.finalize_in_place();

    (appended, sparse)
}

#[test]
fn half_filled_root_matches_golden() {
    let (appended, sparse) = half_filled_trees();
    let root = appended.root().expect("finalized");
    assert_eq!(root, sparse.root().expect("finalized"));
    assert_eq!(
        hex(&root),
        "17d383cc936ee96bd83a25b8d75cdabb9addeaca60f728dc5230ddc36375ed00"
    );
}

#[test]
fn paths_agree_and_verify_for_all_slots() {
    let (appended, sparse) = half_filled_trees();
    let root = appended.root().expect("finalized");

    for position in 0..appended.capacity() {
        let from_appended = appended.get_merkle_path(position).expect("position in range");
        let from_sparse = sparse.get_merkle_path(position).expect("position in range");
        assert_eq!(from_appended, from_sparse, "position {}", position);
        assert_eq!(from_appended.len(), HEIGHT as usize);
        assert_eq!(from_appended.leaf_index(), position);

        let leaf = if position < OCCUPIED {
            slot_leaf(position)
        } else {
            FieldElement::ZERO
        };
        assert!(from_appended
            .verify(HEIGHT, &leaf, &root)
            .expect("length matches height"));
    }
}

#[test]
fn boundary_slot_predicates() {
    let (appended, _) = half_filled_trees();

    let first = appended.get_merkle_path(0).expect("position in range");
    assert!(first.is_leftmost());
    assert!(!first.is_rightmost());

    let last_occupied = appended.get_merkle_path(31).expect("position in range");
    assert!(last_occupied.are_right_leaves_empty());
    assert!(!last_occupied.is_leftmost());

    let last = appended.get_merkle_path(63).expect("position in range");
    assert!(last.is_rightmost());
    assert!(last.are_right_leaves_empty());

    // the rightmost slot was never written, so it proves the empty sentinel
    let root = appended.root().expect("finalized");
    assert!(last
        .verify(HEIGHT, &FieldElement::ZERO, &root)
        .expect("length matches height"));
    assert!(!last
        .verify(HEIGHT, &slot_leaf(63), &root)
        .expect("length matches height"));
}

#[test]
fn wrong_leaf_and_wrong_root_fail_verification() {
    let (appended, _) = half_filled_trees();
    let root = appended.root().expect("finalized");
    let path = appended.get_merkle_path(7).expect("position in range");

    assert!(path
        .verify(HEIGHT, &slot_leaf(7), &root)
        .expect("length matches height"));
    assert!(!path
        .verify(HEIGHT, &slot_leaf(8), &root)
        .expect("length matches height"));
    assert!(!path
        .verify(HEIGHT, &slot_leaf(7), &FieldElement::ZERO)
        .expect("length matches height"));
}

#[test]
fn path_serialization_preserves_verification() {
    let (appended, _) = half_filled_trees();
    let root = appended.root().expect("finalized");
    let path = appended.get_merkle_path(31).expect("position in range");

    let blob = encode_merkle_path(&path).expect("path fits the layout");
    let decoded = decode_merkle_path(&blob).expect("encoded by this crate");
    assert_eq!(decoded, path);
    assert_eq!(decoded.leaf_index(), 31);
    assert!(decoded.are_right_leaves_empty());
    assert!(decoded
        .verify(HEIGHT, &slot_leaf(31), &root)
        .expect("length matches height"));

    let reencoded = encode_merkle_path(&decoded).expect("path fits the layout");
    assert_eq!(reencoded, blob);
}
