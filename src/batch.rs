//! Sharded, parallel scoring of a deduplicated candidate pool.
//!
//! The pool is cut into contiguous shards by [`partition`], a pure
//! function of the pool length and the shard count. Each shard is scored
//! on a fixed-size rayon pool against shared, read-only inputs and yields
//! its own [`ShardOutput`]; nothing is accumulated across workers. The
//! caller blocks until every shard is done.

use std::{collections::BTreeMap, ops::Range};

use rayon::prelude::*;
use tracing::debug;

use crate::{
    combine::combine,
    config::{WeightPolicy, available_parallelism},
    error::{Error, Result},
    keyword::KeywordSet,
    ranking::MatchResult,
    record::{Candidate, IneligibleReason, Query},
    vector::score_vectors,
};

/// Split `len` items into at most `shards` contiguous ranges.
///
/// Every range holds `ceil(len / shards)` items except possibly the last.
/// Fewer ranges come back when there are fewer items than shards, and
/// none at all for an empty pool.
///
/// # Examples
///
/// ```
/// use talentrank::batch::partition;
///
/// assert_eq!(partition(10, 3), vec![0..4, 4..8, 8..10]);
/// assert_eq!(partition(2, 8), vec![0..1, 1..2]);
/// assert!(partition(0, 4).is_empty());
/// ```
pub fn partition(len: usize, shards: usize) -> Vec<Range<usize>> {
    if len == 0 {
        return Vec::new();
    }
    let size = len.div_ceil(shards.max(1));
    (0..len)
        .step_by(size)
        .map(|start| start..(start + size).min(len))
        .collect()
}

/// Read-only inputs shared by every shard of one ranking run.
#[derive(Debug)]
pub struct ScoringContext<'a> {
    pub query: &'a Query,
    keywords: KeywordSet,
    pub weights: WeightPolicy,
    pub fuzzy_threshold: f64,
}

impl<'a> ScoringContext<'a> {
    pub fn new(
        query: &'a Query,
        weights: WeightPolicy,
        fuzzy_threshold: f64,
    ) -> Self {
        Self {
            query,
            keywords: KeywordSet::new(&query.keywords),
            weights,
            fuzzy_threshold,
        }
    }

    /// Score one candidate, or say why it cannot be scored.
    pub fn score(
        &self,
        candidate: &Candidate,
    ) -> std::result::Result<MatchResult, IneligibleReason> {
        let (keywords, embedding) =
            candidate.scoring_inputs(self.query.dimension())?;

        let vector = score_vectors(&self.query.embedding, embedding)
            .map_err(|_| IneligibleReason::DimensionMismatch)?;
        let keyword = self.keywords.score(keywords, self.fuzzy_threshold);

        Ok(MatchResult {
            candidate_id: candidate.id.clone(),
            display_name: candidate.display_name.clone(),
            keyword_match_pct: keyword.match_pct,
            vector_match_pct: vector.match_pct,
            vector_similarity: vector.similarity,
            combined_score: combine(
                keyword.match_pct,
                vector.match_pct,
                &self.weights,
            ),
            matching_keywords: keyword.matched,
        })
    }
}

/// What one shard produced.
#[derive(Debug, Clone, Default)]
pub struct ShardOutput {
    pub results: Vec<MatchResult>,
    pub ineligible: BTreeMap<IneligibleReason, usize>,
}

/// Score every candidate of a shard, skipping ineligible ones.
pub fn score_shard(ctx: &ScoringContext<'_>, shard: &[Candidate]) -> ShardOutput {
    let mut out = ShardOutput {
        results: Vec::with_capacity(shard.len()),
        ineligible: BTreeMap::new(),
    };
    for candidate in shard {
        match ctx.score(candidate) {
            Ok(result) => out.results.push(result),
            Err(reason) => {
                debug!(candidate = %candidate.id, %reason, "skipping candidate");
                *out.ineligible.entry(reason).or_default() += 1;
            }
        }
    }
    out
}

/// Fixed-size worker pool that scores shards concurrently.
pub struct ShardScheduler {
    pool: rayon::ThreadPool,
}

impl ShardScheduler {
    /// Start a pool with `workers` threads.
    pub fn new(workers: usize) -> Result<Self> {
        if workers < 1 {
            return Err(Error::InvalidConfiguration(
                "worker count must be at least 1".into(),
            ));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("talentrank-worker-{i}"))
            .build()?;
        Ok(Self { pool })
    }

    /// Start a pool sized to the machine's available parallelism.
    pub fn with_available_parallelism() -> Result<Self> {
        Self::new(available_parallelism())
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Score `candidates` in `shards` contiguous shards.
    ///
    /// Returns one output per shard, in shard order, once all of them
    /// have finished.
    pub fn run(
        &self,
        ctx: &ScoringContext<'_>,
        candidates: &[Candidate],
        shards: usize,
    ) -> Vec<ShardOutput> {
        let ranges = partition(candidates.len(), shards);
        debug!(
            candidates = candidates.len(),
            shards = ranges.len(),
            workers = self.workers(),
            "dispatching shards"
        );

        self.pool.install(|| {
            ranges
                .into_par_iter()
                .enumerate()
                .map(|(index, range)| {
                    let out = score_shard(ctx, &candidates[range]);
                    debug!(
                        shard = index,
                        scored = out.results.len(),
                        "shard finished"
                    );
                    out
                })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights() -> WeightPolicy {
        WeightPolicy {
            keyword: 0.6,
            vector: 0.4,
        }
    }

    fn candidate(id: &str, keywords: &[&str], embedding: Vec<f32>) -> Candidate {
        Candidate::new(id, id)
            .with_keywords(keywords.iter().copied())
            .with_embedding(embedding)
    }

    #[test]
    fn partition_even_split() {
        assert_eq!(partition(8, 4), vec![0..2, 2..4, 4..6, 6..8]);
    }

    #[test]
    fn partition_last_shard_shorter() {
        assert_eq!(partition(7, 3), vec![0..3, 3..6, 6..7]);
    }

    #[test]
    fn partition_single_shard() {
        assert_eq!(partition(5, 1), vec![0..5]);
    }

    #[test]
    fn partition_covers_every_index_once() {
        for len in 0..40 {
            for shards in 1..10 {
                let ranges = partition(len, shards);
                assert!(ranges.len() <= shards);
                let flat: Vec<usize> = ranges.into_iter().flatten().collect();
                assert_eq!(flat, (0..len).collect::<Vec<_>>());
            }
        }
    }

    #[test]
    fn context_scores_eligible_candidate() {
        let query = Query::new("q", ["Python Developer"], vec![1.0, 0.0]);
        let ctx = ScoringContext::new(&query, weights(), 80.0);
        let r = ctx
            .score(&candidate("a", &["python developer"], vec![1.0, 0.0]))
            .unwrap();
        assert_eq!(r.keyword_match_pct, 100.0);
        assert_eq!(r.vector_match_pct, 100.0);
        assert_eq!(r.combined_score, 100.0);
    }

    #[test]
    fn context_reports_ineligible_candidate() {
        let query = Query::new("q", ["rust"], vec![1.0, 0.0]);
        let ctx = ScoringContext::new(&query, weights(), 80.0);
        let bad = candidate("a", &["rust"], vec![1.0, 0.0, 0.0]);
        assert_eq!(
            ctx.score(&bad).unwrap_err(),
            IneligibleReason::DimensionMismatch
        );
    }

    #[test]
    fn shard_skips_bad_candidates_without_aborting() {
        let query = Query::new("q", ["rust"], vec![1.0, 0.0]);
        let ctx = ScoringContext::new(&query, weights(), 80.0);
        let shard = vec![
            candidate("a", &["rust"], vec![1.0, 0.0]),
            Candidate::new("b", "b").with_keywords(["rust"]),
            candidate("c", &["rust"], vec![f32::NAN, 0.0]),
            candidate("d", &["go"], vec![0.0, 1.0]),
        ];
        let out = score_shard(&ctx, &shard);
        let ids: Vec<&str> =
            out.results.iter().map(|r| r.candidate_id.as_str()).collect();
        assert_eq!(ids, ["a", "d"]);
        assert_eq!(out.ineligible[&IneligibleReason::MissingEmbedding], 1);
        assert_eq!(out.ineligible[&IneligibleReason::NonFiniteEmbedding], 1);
    }

    #[test]
    fn scheduler_returns_one_output_per_shard() {
        let query = Query::new("q", ["rust"], vec![1.0, 0.0]);
        let ctx = ScoringContext::new(&query, weights(), 80.0);
        let pool: Vec<Candidate> = (0..10)
            .map(|i| candidate(&format!("c{i}"), &["rust"], vec![1.0, i as f32]))
            .collect();

        let scheduler = ShardScheduler::new(2).unwrap();
        assert_eq!(scheduler.workers(), 2);
        let outputs = scheduler.run(&ctx, &pool, 4);
        assert_eq!(outputs.len(), 4);

        let ids: Vec<String> = outputs
            .into_iter()
            .flat_map(|o| o.results)
            .map(|r| r.candidate_id)
            .collect();
        let expected: Vec<String> = (0..10).map(|i| format!("c{i}")).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn scheduler_handles_empty_pool() {
        let query = Query::new("q", ["rust"], vec![1.0]);
        let ctx = ScoringContext::new(&query, weights(), 80.0);
        let scheduler = ShardScheduler::new(1).unwrap();
        assert!(scheduler.run(&ctx, &[], 4).is_empty());
    }

    #[test]
    fn scheduler_rejects_zero_workers() {
        assert!(matches!(
            ShardScheduler::new(0),
            Err(Error::InvalidConfiguration(_))
        ));
    }
}
