use std::collections::BTreeSet;

use crate::normalize::{fuzzy_match, normalize_keyword};

/// Keyword overlap between a query and one candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordScore {
    /// Share of query keywords satisfied, 0-100, rounded to 2 places.
    pub match_pct: f64,
    /// Normalized query keywords that found a match.
    pub matched: BTreeSet<String>,
}

/// Query keywords normalized once per ranking run.
///
/// Shards share a `&KeywordSet` instead of renormalizing the query for
/// every candidate.
#[derive(Debug, Clone)]
pub struct KeywordSet {
    keys: Vec<String>,
}

impl KeywordSet {
    pub fn new<S: AsRef<str>>(raw: &[S]) -> Self {
        Self {
            keys: raw.iter().map(|k| normalize_keyword(k.as_ref())).collect(),
        }
    }

    /// Score a candidate's raw keywords against this set.
    ///
    /// Each query keyword counts once, whether it matched exactly or
    /// through the fuzzy matcher. An empty query set scores 0.
    pub fn score<S: AsRef<str>>(
        &self,
        candidate: &[S],
        threshold: f64,
    ) -> KeywordScore {
        if self.keys.is_empty() {
            return KeywordScore {
                match_pct: 0.0,
                matched: BTreeSet::new(),
            };
        }

        let candidate_keys: BTreeSet<String> = candidate
            .iter()
            .map(|k| normalize_keyword(k.as_ref()))
            .filter(|k| !k.is_empty())
            .collect();

        let mut hits = 0usize;
        let mut matched = BTreeSet::new();
        for key in &self.keys {
            if key.is_empty() {
                continue;
            }
            let found = candidate_keys.contains(key)
                || candidate_keys
                    .iter()
                    .any(|c| fuzzy_match(key, c, threshold));
            if found {
                hits += 1;
                matched.insert(key.clone());
            }
        }

        let pct = 100.0 * hits as f64 / self.keys.len() as f64;
        KeywordScore {
            match_pct: crate::combine::round2(pct),
            matched,
        }
    }
}

/// Score candidate keywords against query keywords in one call.
pub fn score_keywords<Q: AsRef<str>, C: AsRef<str>>(
    query: &[Q],
    candidate: &[C],
    threshold: f64,
) -> KeywordScore {
    KeywordSet::new(query).score(candidate, threshold)
}
