//! talentrank - rank candidate profiles against a query.
//!
//! Each candidate is scored on two axes: fuzzy overlap between its keywords
//! and the query's keywords, and cosine similarity between the two
//! embeddings. A weighting policy blends both into a combined score, the
//! pool is deduplicated by identity, scored in parallel shards on a
//! [rayon](https://github.com/rayon-rs/rayon) pool, and the best `k`
//! results come back in a deterministic order.
//!
//! Records live in a [redb](https://github.com/cberner/redb) store
//! ([`ProfileDb`]), and free-text queries can be encoded through an HTTP
//! embedding service ([`HttpEmbeddingService`]).
//!
//! # Quick start
//!
//! ```
//! use talentrank::{
//!     Candidate, Query, Ranker, RankingParams, ShardScheduler, WeightPolicy,
//! };
//! use talentrank::provider::MemorySource;
//!
//! let source = MemorySource {
//!     candidates: vec![
//!         Candidate::new("r1", "Ada")
//!             .with_keywords(["Python", "AWS"])
//!             .with_embedding(vec![1.0, 0.0]),
//!         Candidate::new("r2", "Grace")
//!             .with_keywords(["Java"])
//!             .with_embedding(vec![0.0, 1.0]),
//!     ],
//!     queries: vec![],
//! };
//! let query = Query::new("jd-1", ["python", "aws"], vec![1.0, 0.0]);
//!
//! let weights = WeightPolicy::new(0.5, 0.5).unwrap();
//! let params = RankingParams::new(weights).with_top_k(5).with_shards(2);
//! let ranker = Ranker::new(source, ShardScheduler::new(2).unwrap());
//!
//! let outcome = ranker.rank(&query, &params).unwrap();
//! assert_eq!(outcome.ranked[0].candidate_id, "r1");
//! assert_eq!(outcome.ranked[0].combined_score, 100.0);
//! ```

pub mod batch;
pub mod cli;
pub mod combine;
pub mod config;
pub mod data_dir;
pub mod dedup;
pub mod embedding_service;
pub mod error;
pub mod keyword;
pub mod normalize;
pub mod profile_db;
pub mod provider;
pub mod ranking;
pub mod record;
pub mod vector;

pub use batch::ShardScheduler;
pub use config::{RankingParams, WeightPolicy};
pub use data_dir::DataDir;
pub use embedding_service::HttpEmbeddingService;
pub use error::{Error, Result};
pub use profile_db::ProfileDb;
pub use ranking::{MatchResult, RankedList, Ranker, RankingOutcome};
pub use record::{Candidate, IneligibleReason, Query};
