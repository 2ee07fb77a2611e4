use proptest::prelude::*;
use std::collections::BTreeSet;
use wfc_rules::{CandidateSet, TileId};

fn to_set(ids: &BTreeSet<usize>) -> CandidateSet {
    ids.iter().copied().map(TileId).collect()
}

proptest! {
    #[test]
    fn intersection_matches_btreeset(
        a in prop::collection::btree_set(0usize..200, 0..40),
        b in prop::collection::btree_set(0usize..200, 0..40),
    ) {
        let expected: Vec<TileId> = a.intersection(&b).copied().map(TileId).collect();
        let actual = to_set(&a).intersection(&to_set(&b));
        prop_assert_eq!(actual.len(), expected.len());
        prop_assert_eq!(actual.to_vec(), expected);
    }

    #[test]
    fn len_is_member_count(ids in prop::collection::btree_set(0usize..500, 0..64)) {
        let set = to_set(&ids);
        prop_assert_eq!(set.len(), ids.len());
        prop_assert_eq!(set.is_empty(), ids.is_empty());
        for id in &ids {
            prop_assert!(set.contains(TileId(*id)));
        }
    }
}

#[test]
fn intersection_across_bitset_lengths() {
    let wide: CandidateSet = [0, 1, 150].into_iter().map(TileId).collect();
    let narrow: CandidateSet = [1].into_iter().map(TileId).collect();

    assert_eq!(wide.intersection(&narrow).to_vec(), vec![TileId(1)]);
    assert_eq!(narrow.intersection(&wide).to_vec(), vec![TileId(1)]);

    let mut grown = wide.intersection(&narrow);
    grown.insert(TileId(150));
    assert!(grown.contains(TileId(150)));
    assert_eq!(grown.intersection(&CandidateSet::empty(0)).len(), 0);
}
