//! Sorted posting list set operations.

use itertools::Itertools;

/// Two-pointer intersection of ascending lists. Output is ascending and
/// duplicate-free even if the inputs repeat values.
#[must_use]
pub fn intersect(left: &[u64], right: &[u64]) -> Vec<u64> {
    let mut out = Vec::with_capacity(left.len().min(right.len()));
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        let (a, b) = (left[i], right[j]);
        if a < b {
            i += 1;
        } else if b < a {
            j += 1;
        } else {
            if out.last() != Some(&a) {
                out.push(a);
            }
            i += 1;
            j += 1;
        }
    }
    out
}

/// Intersect every list, rarest first, stopping as soon as the running
/// result is empty. No lists means no matches.
#[must_use]
pub fn intersect_all(lists: &[&[u64]]) -> Vec<u64> {
    let mut ordered = lists.to_vec();
    ordered.sort_by_key(|list| list.len());

    let Some((first, rest)) = ordered.split_first() else {
        return Vec::new();
    };
    let mut acc: Vec<u64> = first.iter().copied().dedup().collect();
    for list in rest {
        if acc.is_empty() {
            break;
        }
        acc = intersect(&acc, list);
    }
    acc
}

/// Ascending, duplicate-free union of ascending lists.
#[must_use]
pub fn union<'a>(lists: impl IntoIterator<Item = &'a [u64]>) -> Vec<u64> {
    lists
        .into_iter()
        .map(|list| list.iter().copied())
        .kmerge()
        .dedup()
        .collect()
}
