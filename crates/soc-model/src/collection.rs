//! Index-scoped collection helpers
//!
//! Reconciliation passes rebuild collections with filter + reinsert so they can
//! be re-run safely. Duplicate ids are resolved by keeping the first
//! occurrence.

use std::collections::HashSet;
use std::hash::Hash;

/// Remove later entries whose key was already seen. Returns how many were pruned.
pub fn dedupe_by_key<T, K, F>(items: &mut Vec<T>, key: F) -> usize
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let before = items.len();
    let mut seen = HashSet::with_capacity(before);
    items.retain(|item| seen.insert(key(item)));
    before - items.len()
}

/// Insert at `index`, or append when the collection shrank in the meantime
pub fn insert_clamped<T>(items: &mut Vec<T>, index: usize, item: T) -> usize {
    let at = index.min(items.len());
    items.insert(at, item);
    at
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_occurrence() {
        let mut items = vec![(1, "a"), (2, "b"), (1, "c"), (3, "d"), (2, "e")];
        let pruned = dedupe_by_key(&mut items, |(id, _)| *id);
        assert_eq!(pruned, 2);
        assert_eq!(items, vec![(1, "a"), (2, "b"), (3, "d")]);
    }

    #[test]
    fn dedupe_is_idempotent() {
        let mut items = vec![1, 1, 2];
        dedupe_by_key(&mut items, |v| *v);
        assert_eq!(dedupe_by_key(&mut items, |v| *v), 0);
    }

    #[test]
    fn insert_clamps_to_len() {
        let mut items = vec![1, 2];
        assert_eq!(insert_clamped(&mut items, 1, 9), 1);
        assert_eq!(insert_clamped(&mut items, 10, 7), 3);
        assert_eq!(items, vec![1, 9, 2, 7]);
    }
}
