//! Candidate deduplication by identity key.
//!
//! Two records with the same key describe the same person. The first one
//! seen wins and later ones are dropped without error, so the surviving
//! pool keeps the source's relative order.

use std::{collections::HashSet, hash::Hash};

use crate::record::Candidate;

/// Records that survived deduplication, plus how many were dropped.
#[derive(Debug, Clone)]
pub struct Deduplicated<T> {
    pub kept: Vec<T>,
    pub dropped: usize,
}

/// Keep the first item for every distinct key, preserving order.
pub fn dedup_by_key<T, K, F>(items: Vec<T>, mut key: F) -> Deduplicated<T>
where
    K: Eq + Hash,
    F: FnMut(&T) -> K,
{
    let total = items.len();
    let mut seen = HashSet::with_capacity(total);
    let kept: Vec<T> = items
        .into_iter()
        .filter(|item| seen.insert(key(item)))
        .collect();

    Deduplicated {
        dropped: total - kept.len(),
        kept,
    }
}

/// Deduplicate a candidate pool on [`Candidate::identity_key`].
pub fn dedup_candidates(pool: Vec<Candidate>) -> Deduplicated<Candidate> {
    dedup_by_key(pool, Candidate::identity_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(id: &str, email: &str, phone: &str) -> Candidate {
        Candidate::new(id, id).with_contact(email, phone)
    }

    #[test]
    fn unique_keys_pass_through_in_order() {
        let pool = vec![
            person("a", "a@x.io", "1"),
            person("b", "b@x.io", "2"),
            person("c", "c@x.io", "3"),
        ];
        let out = dedup_candidates(pool);
        let ids: Vec<&str> = out.kept.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(out.dropped, 0);
    }

    #[test]
    fn first_seen_duplicate_survives() {
        let pool = vec![
            person("first", "dup@x.io", "555"),
            person("other", "o@x.io", "1"),
            person("second", "DUP@x.io", "5-5-5"),
        ];
        let out = dedup_candidates(pool);
        let ids: Vec<&str> = out.kept.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["first", "other"]);
        assert_eq!(out.dropped, 1);
    }

    #[test]
    fn same_email_different_phone_are_distinct() {
        let pool = vec![person("a", "x@x.io", "1"), person("b", "x@x.io", "2")];
        assert_eq!(dedup_candidates(pool).kept.len(), 2);
    }

    #[test]
    fn records_without_contact_are_kept_separately() {
        let pool = vec![Candidate::new("a", "A"), Candidate::new("b", "B")];
        assert_eq!(dedup_candidates(pool).kept.len(), 2);
    }

    #[test]
    fn generic_key_function() {
        let out = dedup_by_key(vec![3, 1, 4, 1, 5, 9, 2, 6, 5], |n| *n);
        assert_eq!(out.kept, [3, 1, 4, 5, 9, 2, 6]);
        assert_eq!(out.dropped, 2);
    }

    #[test]
    fn empty_pool() {
        let out = dedup_candidates(vec![]);
        assert!(out.kept.is_empty());
        assert_eq!(out.dropped, 0);
    }
}
