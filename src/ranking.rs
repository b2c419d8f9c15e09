use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{info, warn};

use crate::{
    batch::{ScoringContext, ShardScheduler},
    combine::grade_relative,
    config::RankingParams,
    dedup::{Deduplicated, dedup_candidates},
    error::{Error, Result},
    provider::{CandidateSource, EmbeddingService, QuerySource},
    record::{Candidate, IneligibleReason, Query},
};

/// Score of one candidate against one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub candidate_id: String,
    pub display_name: String,
    pub keyword_match_pct: f64,
    pub vector_match_pct: f64,
    /// Raw cosine similarity before percentage scaling.
    pub vector_similarity: f64,
    pub combined_score: f64,
    pub matching_keywords: BTreeSet<String>,
}

/// Results ordered by combined score, best first.
pub type RankedList = Vec<MatchResult>;

/// Counters describing one ranking run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RankingStats {
    pub pool_size: usize,
    pub duplicates_dropped: usize,
    pub shards: usize,
    pub scored: usize,
    pub ineligible: BTreeMap<IneligibleReason, usize>,
}

impl RankingStats {
    pub fn ineligible_total(&self) -> usize {
        self.ineligible.values().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingOutcome {
    pub ranked: RankedList,
    pub stats: RankingStats,
}

/// Sort merged shard results and keep the best `k`.
///
/// Ordered by `combined_score` descending, ties broken by `candidate_id`
/// ascending. The sort runs over the full merge, so the outcome does not
/// depend on how the pool was sharded or which shard finished first.
pub fn select_top_k(mut results: Vec<MatchResult>, k: usize) -> RankedList {
    results.sort_by(|a, b| {
        b.combined_score
            .total_cmp(&a.combined_score)
            .then_with(|| a.candidate_id.cmp(&b.candidate_id))
    });
    results.truncate(k);
    results
}

/// Rank a candidate pool against a query.
///
/// 1. Validate the parameters and the query (nothing is scored on failure)
/// 2. Deduplicate the pool by identity key
/// 3. Score shards in parallel, skipping ineligible candidates
/// 4. Merge and select the top `k`
/// 5. Optionally grade scores relative to the best one
pub fn rank(
    scheduler: &ShardScheduler,
    query: &Query,
    pool: Vec<Candidate>,
    params: &RankingParams,
) -> Result<RankingOutcome> {
    params.validate()?;
    query.validate()?;

    let pool_size = pool.len();
    let Deduplicated { kept, dropped } = dedup_candidates(pool);

    let ctx =
        ScoringContext::new(query, params.weights, params.fuzzy_threshold);
    let outputs = scheduler.run(&ctx, &kept, params.shards);

    let mut stats = RankingStats {
        pool_size,
        duplicates_dropped: dropped,
        shards: outputs.len(),
        ..Default::default()
    };
    let mut merged = Vec::with_capacity(kept.len());
    for out in outputs {
        merged.extend(out.results);
        for (reason, count) in out.ineligible {
            *stats.ineligible.entry(reason).or_default() += count;
        }
    }
    stats.scored = merged.len();

    let mut ranked = select_top_k(merged, params.top_k);
    if params.relative_grading {
        grade_relative(&mut ranked);
    }

    info!(
        query = %query.id,
        pool = stats.pool_size,
        duplicates = stats.duplicates_dropped,
        scored = stats.scored,
        ineligible = stats.ineligible_total(),
        returned = ranked.len(),
        "ranking complete"
    );

    Ok(RankingOutcome { ranked, stats })
}

/// Ranking engine bound to a data provider and a worker pool.
pub struct Ranker<S> {
    source: S,
    scheduler: ShardScheduler,
}

impl<S> Ranker<S> {
    pub fn new(source: S, scheduler: ShardScheduler) -> Self {
        Self { source, scheduler }
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S: CandidateSource> Ranker<S> {
    /// Rank the source's candidates against an already-built query.
    pub fn rank(
        &self,
        query: &Query,
        params: &RankingParams,
    ) -> Result<RankingOutcome> {
        params.validate()?;
        query.validate()?;
        let pool = self.source.candidates(params.pool_limit)?;
        rank(&self.scheduler, query, pool, params)
    }

    /// Encode free text through the embedding service, then rank.
    ///
    /// Returns the query built from the encoding alongside the outcome so
    /// the caller can persist it. Service failures are returned as
    /// [`Error::Collaborator`]; nothing is ranked in that case.
    pub fn rank_text<E: EmbeddingService + ?Sized>(
        &self,
        service: &E,
        query_id: &str,
        text: &str,
        params: &RankingParams,
    ) -> Result<(Query, RankingOutcome)> {
        params.validate()?;
        let encoding = service.encode(query_id, text).inspect_err(|e| {
            warn!(query = query_id, error = %e, "embedding service failed");
        })?;

        let query = Query {
            id: query_id.to_string(),
            text: Some(text.to_string()),
            keywords: encoding.keywords,
            embedding: encoding.embedding,
        };
        let outcome = self.rank(&query, params)?;
        Ok((query, outcome))
    }
}

impl<S: CandidateSource + QuerySource> Ranker<S> {
    /// Look up a stored query by id and rank against it.
    pub fn rank_query(
        &self,
        query_id: &str,
        params: &RankingParams,
    ) -> Result<RankingOutcome> {
        params.validate()?;
        let query =
            self.source.query(query_id)?.ok_or_else(|| Error::NotFound {
                kind: "query",
                name: query_id.to_string(),
            })?;
        self.rank(&query, params)
    }
}

/// Format a ranking for human-readable terminal output.
pub fn format_human(outcome: &RankingOutcome) {
    if outcome.ranked.is_empty() {
        println!("No matching candidates found.");
    }

    for (i, r) in outcome.ranked.iter().enumerate() {
        println!(
            "{:>3}. [{:>6.2}] {} ({})  keywords {:.2}%  vector {:.2}%",
            i + 1,
            r.combined_score,
            r.display_name,
            r.candidate_id,
            r.keyword_match_pct,
            r.vector_match_pct,
        );
        if !r.matching_keywords.is_empty() {
            let matched: Vec<&str> =
                r.matching_keywords.iter().map(String::as_str).collect();
            println!("     matched: {}", matched.join(", "));
        }
    }

    let stats = &outcome.stats;
    println!(
        "\n{} result(s) from {} candidate(s): {} scored, {} duplicate(s), {} ineligible",
        outcome.ranked.len(),
        stats.pool_size,
        stats.scored,
        stats.duplicates_dropped,
        stats.ineligible_total(),
    );
}

/// Format a ranking as JSON output.
pub fn format_json(outcome: &RankingOutcome, query_id: &str) -> Result<()> {
    let value = serde_json::json!({
        "query": query_id,
        "result_count": outcome.ranked.len(),
        "results": outcome.ranked,
        "stats": outcome.stats,
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
