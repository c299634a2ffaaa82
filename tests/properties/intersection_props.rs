use std::collections::BTreeSet;

use proptest::prelude::*;

use jobdex::query::intersect::{intersect, intersect_all, union};

fn sorted_list() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::btree_set(0u64..400, 0..120).prop_map(|set| set.into_iter().collect())
}

proptest! {
    #[test]
    fn test_intersect_matches_set_intersection(a in sorted_list(), b in sorted_list()) {
        let expected: Vec<u64> = a
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .intersection(&b.iter().copied().collect())
            .copied()
            .collect();
        prop_assert_eq!(intersect(&a, &b), expected);
    }

    #[test]
    fn test_intersect_is_commutative(a in sorted_list(), b in sorted_list()) {
        prop_assert_eq!(intersect(&a, &b), intersect(&b, &a));
    }

    #[test]
    fn test_ordering_never_changes_result(a in sorted_list(), b in sorted_list(), c in sorted_list()) {
        let base = intersect_all(&[a.as_slice(), b.as_slice(), c.as_slice()]);
        let permutations = [
            [a.as_slice(), c.as_slice(), b.as_slice()],
            [b.as_slice(), a.as_slice(), c.as_slice()],
            [b.as_slice(), c.as_slice(), a.as_slice()],
            [c.as_slice(), a.as_slice(), b.as_slice()],
            [c.as_slice(), b.as_slice(), a.as_slice()],
        ];
        for lists in permutations {
            prop_assert_eq!(&intersect_all(&lists), &base);
        }
        let naive = intersect(&intersect(&a, &b), &c);
        prop_assert_eq!(base, naive);
    }

    #[test]
    fn test_union_matches_set_union(a in sorted_list(), b in sorted_list()) {
        let expected: Vec<u64> = a.iter().chain(b.iter()).copied().collect::<BTreeSet<_>>().into_iter().collect();
        prop_assert_eq!(union([a.as_slice(), b.as_slice()]), expected);
    }

    #[test]
    fn test_results_sorted_and_unique(a in sorted_list(), b in sorted_list()) {
        let out = intersect_all(&[a.as_slice(), b.as_slice()]);
        prop_assert!(out.windows(2).all(|w| w[0] < w[1]));
    }
}
