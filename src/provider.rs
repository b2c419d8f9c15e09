//! Seams between the ranking engine and the systems around it.
//!
//! The engine never opens its own connections. Candidate and query
//! records come in through [`CandidateSource`] and [`QuerySource`], and
//! free-text queries are turned into keywords and an embedding by an
//! [`EmbeddingService`]. [`crate::profile_db::ProfileDb`] and
//! [`crate::embedding_service::HttpEmbeddingService`] are the bundled
//! implementations; tests plug in in-memory ones.

use crate::{
    error::Result,
    record::{Candidate, Query},
};

/// Enumerates candidate records in a stable order.
pub trait CandidateSource {
    /// Return candidates in store order, at most `limit` of them when set.
    fn candidates(&self, limit: Option<usize>) -> Result<Vec<Candidate>>;
}

/// Fetches a single query record by id.
pub trait QuerySource {
    fn query(&self, id: &str) -> Result<Option<Query>>;
}

/// Keywords and embedding produced for a free-text query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryEncoding {
    pub keywords: Vec<String>,
    pub embedding: Vec<f32>,
}

/// Failures reported by an [`EmbeddingService`].
///
/// These are surfaced to the caller as-is. The engine does not retry and
/// never substitutes a zero vector for a failed encoding.
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("embedding dimension mismatch: expected {expected}, got {found}")]
    DimensionMismatch { expected: usize, found: usize },
}

/// Turns raw query text into a [`QueryEncoding`].
pub trait EmbeddingService {
    fn encode(
        &self,
        query_id: &str,
        text: &str,
    ) -> std::result::Result<QueryEncoding, CollaboratorError>;
}

/// In-memory provider over a fixed slice of records.
///
/// Handy for callers that already hold their pool in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    pub candidates: Vec<Candidate>,
    pub queries: Vec<Query>,
}

impl CandidateSource for MemorySource {
    fn candidates(&self, limit: Option<usize>) -> Result<Vec<Candidate>> {
        let take = limit.unwrap_or(self.candidates.len());
        Ok(self.candidates.iter().take(take).cloned().collect())
    }
}

impl QuerySource for MemorySource {
    fn query(&self, id: &str) -> Result<Option<Query>> {
        Ok(self.queries.iter().find(|q| q.id == id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str) -> Candidate {
        Candidate::new(id, id).with_keywords(["rust"])
    }

    #[test]
    fn memory_source_respects_limit() {
        let source = MemorySource {
            candidates: vec![candidate("a"), candidate("b"), candidate("c")],
            queries: vec![],
        };
        let ids: Vec<String> = source
            .candidates(Some(2))
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(source.candidates(None).unwrap().len(), 3);
    }

    #[test]
    fn memory_source_finds_query() {
        let source = MemorySource {
            candidates: vec![],
            queries: vec![Query::new("jd-1", ["rust"], vec![1.0, 0.0])],
        };
        assert!(source.query("jd-1").unwrap().is_some());
        assert!(source.query("jd-2").unwrap().is_none());
    }

    #[test]
    fn collaborator_error_messages() {
        let err = CollaboratorError::Status {
            status: 502,
            body: "bad gateway".into(),
        };
        assert_eq!(err.to_string(), "unexpected status 502: bad gateway");
        let err = CollaboratorError::DimensionMismatch {
            expected: 384,
            found: 3,
        };
        assert_eq!(
            err.to_string(),
            "embedding dimension mismatch: expected 384, got 3"
        );
    }
}
