use field_mht::merkle::AppendOnlyMerkleTree;
use field_mht::{FieldElement, PoseidonSponge};

type AppendOnly = AppendOnlyMerkleTree;

fn felt(value: u64) -> FieldElement {
    FieldElement::from(value)
}

/// A five-element record payload for the digest-then-commit flow.
fn payload(record: u64) -> Vec<FieldElement> {
    (0..5u64).map(|j| felt(record * 31 + j)).collect()
}

fn digest(values: &[FieldElement]) -> FieldElement {
    let mut sponge = PoseidonSponge::variable_length(false, None);
    for value in values {
        sponge.update(*value);
    }
    sponge
        .finalize()
        .expect("padded variable-length sponge always finalizes")
}

#[test]
fn running_digests_match_fresh_sponges() {
    let values: Vec<FieldElement> = (0..9u64).map(|v| felt(400 + v)).collect();
    let mut streaming = PoseidonSponge::variable_length(false, None);
    for (i, value) in values.iter().enumerate() {
        streaming.update(*value);
        let probe = streaming
            .finalize()
            .expect("padded variable-length sponge always finalizes");
        assert_eq!(probe, digest(&values[..=i]));
    }
    assert_eq!(streaming.absorbed(), 9);
}

#[test]
fn digest_then_commit_is_deterministic() {
    let commit = || {
        let mut tree = AppendOnly::new(4, 3).expect("valid parameters");
        for record in 0..10u64 {
            tree.append(digest(&payload(record)))
                .expect("capacity not reached");
        }
        tree.finalize_in_place();
        tree.root().expect("finalized")
    };
    assert_eq!(commit(), commit());
}

#[test]
fn committed_digests_are_provable() {
    let mut tree = AppendOnly::new(4, 3).expect("valid parameters");
    for record in 0..10u64 {
        tree.append(digest(&payload(record)))
            .expect("capacity not reached");
    }
    tree.finalize_in_place();
    let root = tree.root().expect("finalized");
    for record in 0..10u64 {
        let path = tree.get_merkle_path(record).expect("position in range");
        assert!(path
            .verify(4, &digest(&payload(record)), &root)
            .expect("length matches height"));
    }
}

#[test]
fn personalization_separates_domains() {
    let data = payload(7);
    let digest_with = |personalization: Option<&[FieldElement]>| {
        let mut sponge = PoseidonSponge::variable_length(false, personalization);
        for value in &data {
            sponge.update(*value);
        }
        assert_eq!(sponge.absorbed(), data.len() as u64);
        sponge
            .finalize()
            .expect("padded variable-length sponge always finalizes")
    };

    let tag_a = [felt(1), felt(2)];
    let tag_b = [felt(3)];
    let plain = digest_with(None);
    let with_a = digest_with(Some(&tag_a));
    let with_b = digest_with(Some(&tag_b));

    assert_ne!(plain, with_a);
    assert_ne!(plain, with_b);
    assert_ne!(with_a, with_b);
    assert_eq!(with_a, digest_with(Some(&tag_a)));
}

#[test]
fn input_length_modes_separate_domains() {
    let values = [felt(5), felt(6), felt(7), felt(8)];
    let absorb_all = |sponge: &mut PoseidonSponge| {
        for value in values {
            sponge.update(value);
        }
    };

    let mut constant = PoseidonSponge::constant_length(4, None);
    absorb_all(&mut constant);
    let mut padded = PoseidonSponge::variable_length(false, None);
    absorb_all(&mut padded);
    let mut rate_aligned = PoseidonSponge::variable_length(true, None);
    absorb_all(&mut rate_aligned);

    let constant = constant.finalize().expect("count matches declaration");
    let padded = padded.finalize().expect("padding always applies");
    let rate_aligned = rate_aligned.finalize().expect("four inputs fill whole blocks");

    assert_ne!(constant, padded);
    assert_ne!(constant, rate_aligned);
    assert_ne!(padded, rate_aligned);
}
