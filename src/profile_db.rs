use std::path::Path;

use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata,
    TableDefinition,
};
use tracing::warn;

use crate::{
    config::WeightPolicy,
    error::Result,
    provider::{CandidateSource, QuerySource},
    record::{Candidate, Query},
};

/// Candidate JSON keyed by insertion sequence, so iteration follows the
/// order records were first imported in.
const CANDIDATES: TableDefinition<u64, &[u8]> =
    TableDefinition::new("candidates");
/// Candidate id -> insertion sequence.
const CANDIDATE_INDEX: TableDefinition<&str, u64> =
    TableDefinition::new("candidate_index");
const QUERIES: TableDefinition<&str, &[u8]> = TableDefinition::new("queries");
const SETTINGS: TableDefinition<&str, &str> = TableDefinition::new("settings");

const KEYWORD_WEIGHT_KEY: &str = "keyword_weight";
const VECTOR_WEIGHT_KEY: &str = "vector_weight";

/// Embedded store for candidate profiles, queries and settings.
pub struct ProfileDb {
    db: Database,
}

impl ProfileDb {
    /// Open or create a profile database at the given path.
    ///
    /// # Examples
    ///
    /// ```
    /// # let tmp = tempfile::tempdir().unwrap();
    /// use talentrank::ProfileDb;
    ///
    /// let db = ProfileDb::open(&tmp.path().join("profiles.redb")).unwrap();
    /// assert_eq!(db.candidate_count().unwrap(), 0);
    /// ```
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::create(path)?;

        // Ensure all tables exist by opening them in a write transaction.
        let txn = db.begin_write()?;
        txn.open_table(CANDIDATES)?;
        txn.open_table(CANDIDATE_INDEX)?;
        txn.open_table(QUERIES)?;
        txn.open_table(SETTINGS)?;
        txn.commit()?;

        Ok(Self { db })
    }

    // -- Candidates --

    /// Insert or replace candidates in a single transaction.
    ///
    /// A replaced candidate keeps its original position in store order.
    pub fn put_candidates(&self, candidates: &[Candidate]) -> Result<usize> {
        let txn = self.db.begin_write()?;
        {
            let mut index = txn.open_table(CANDIDATE_INDEX)?;
            let mut rows = txn.open_table(CANDIDATES)?;
            let mut next =
                rows.last()?.map(|(k, _)| k.value() + 1).unwrap_or(0);

            for candidate in candidates {
                let bytes = serde_json::to_vec(candidate)?;
                let existing =
                    index.get(candidate.id.as_str())?.map(|v| v.value());
                let seq = match existing {
                    Some(seq) => seq,
                    None => {
                        let seq = next;
                        next += 1;
                        index.insert(candidate.id.as_str(), seq)?;
                        seq
                    }
                };
                rows.insert(seq, bytes.as_slice())?;
            }
        }
        txn.commit()?;
        Ok(candidates.len())
    }

    pub fn put_candidate(&self, candidate: &Candidate) -> Result<()> {
        self.put_candidates(std::slice::from_ref(candidate))?;
        Ok(())
    }

    pub fn get_candidate(&self, id: &str) -> Result<Option<Candidate>> {
        let txn = self.db.begin_read()?;
        let index = txn.open_table(CANDIDATE_INDEX)?;
        let Some(seq) = index.get(id)?.map(|v| v.value()) else {
            return Ok(None);
        };
        let rows = txn.open_table(CANDIDATES)?;
        let Some(bytes) = rows.get(seq)? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_slice(bytes.value())?))
    }

    /// Candidates in store order, at most `limit` of them.
    ///
    /// Rows that no longer decode are logged and skipped.
    pub fn list_candidates(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<Candidate>> {
        let limit = limit.unwrap_or(usize::MAX);
        let txn = self.db.begin_read()?;
        let rows = txn.open_table(CANDIDATES)?;
        let mut result = Vec::new();
        for entry in rows.iter()? {
            if result.len() >= limit {
                break;
            }
            let (seq, bytes) = entry?;
            match serde_json::from_slice::<Candidate>(bytes.value()) {
                Ok(candidate) => result.push(candidate),
                Err(e) => {
                    warn!(seq = seq.value(), error = %e, "skipping undecodable candidate");
                }
            }
        }
        Ok(result)
    }

    pub fn candidate_count(&self) -> Result<u64> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(CANDIDATES)?;
        Ok(table.len()?)
    }

    // -- Queries --

    pub fn put_queries(&self, queries: &[Query]) -> Result<usize> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(QUERIES)?;
            for query in queries {
                let bytes = serde_json::to_vec(query)?;
                table.insert(query.id.as_str(), bytes.as_slice())?;
            }
        }
        txn.commit()?;
        Ok(queries.len())
    }

    pub fn put_query(&self, query: &Query) -> Result<()> {
        self.put_queries(std::slice::from_ref(query))?;
        Ok(())
    }

    pub fn get_query(&self, id: &str) -> Result<Option<Query>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(QUERIES)?;
        let Some(bytes) = table.get(id)? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_slice(bytes.value())?))
    }

    /// All queries, ordered by id.
    pub fn list_queries(&self) -> Result<Vec<Query>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(QUERIES)?;
        let mut result = Vec::new();
        for entry in table.iter()? {
            let (id, bytes) = entry?;
            match serde_json::from_slice::<Query>(bytes.value()) {
                Ok(query) => result.push(query),
                Err(e) => {
                    warn!(id = id.value(), error = %e, "skipping undecodable query");
                }
            }
        }
        Ok(result)
    }

    pub fn query_count(&self) -> Result<u64> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(QUERIES)?;
        Ok(table.len()?)
    }

    // -- Settings --

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(SETTINGS)?;
            table.insert(key, value)?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(SETTINGS)?;
        Ok(table.get(key)?.map(|v| v.value().to_string()))
    }

    pub fn remove_setting(&self, key: &str) -> Result<bool> {
        let txn = self.db.begin_write()?;
        let removed = {
            let mut table = txn.open_table(SETTINGS)?;
            table.remove(key)?.is_some()
        };
        txn.commit()?;
        Ok(removed)
    }

    /// Persist a weighting policy for later `rank` runs.
    pub fn set_weights(&self, weights: &WeightPolicy) -> Result<()> {
        weights.validate()?;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(SETTINGS)?;
            let keyword = weights.keyword.to_string();
            let vector = weights.vector.to_string();
            table.insert(KEYWORD_WEIGHT_KEY, keyword.as_str())?;
            table.insert(VECTOR_WEIGHT_KEY, vector.as_str())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// The stored weighting policy, if one was saved and still parses.
    pub fn get_weights(&self) -> Result<Option<WeightPolicy>> {
        let keyword = self.get_setting(KEYWORD_WEIGHT_KEY)?;
        let vector = self.get_setting(VECTOR_WEIGHT_KEY)?;
        let (Some(keyword), Some(vector)) = (keyword, vector) else {
            return Ok(None);
        };
        let (Ok(keyword), Ok(vector)) = (keyword.parse(), vector.parse())
        else {
            warn!("stored weights do not parse; ignoring them");
            return Ok(None);
        };
        Ok(Some(WeightPolicy { keyword, vector }))
    }

    pub fn clear_weights(&self) -> Result<bool> {
        let keyword = self.remove_setting(KEYWORD_WEIGHT_KEY)?;
        let vector = self.remove_setting(VECTOR_WEIGHT_KEY)?;
        Ok(keyword || vector)
    }
}

impl CandidateSource for ProfileDb {
    fn candidates(&self, limit: Option<usize>) -> Result<Vec<Candidate>> {
        self.list_candidates(limit)
    }
}

impl QuerySource for ProfileDb {
    fn query(&self, id: &str) -> Result<Option<Query>> {
        self.get_query(id)
    }
}
