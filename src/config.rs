use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    normalize::DEFAULT_FUZZY_THRESHOLD,
};

pub const DEFAULT_TOP_K: usize = 10;

/// Tolerance when checking that the two weights sum to one.
const WEIGHT_SUM_EPSILON: f64 = 1e-6;

/// How keyword overlap and vector similarity are blended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightPolicy {
    pub keyword: f64,
    pub vector: f64,
}

impl WeightPolicy {
    pub fn new(keyword: f64, vector: f64) -> Result<Self> {
        let policy = Self { keyword, vector };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, w) in [("keyword", self.keyword), ("vector", self.vector)] {
            if !w.is_finite() || !(0.0..=1.0).contains(&w) {
                return Err(Error::InvalidConfiguration(format!(
                    "{name} weight must be within [0, 1], got {w}"
                )));
            }
        }
        let sum = self.keyword + self.vector;
        if (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(Error::InvalidConfiguration(format!(
                "weights must sum to 1, got {} + {} = {sum}",
                self.keyword, self.vector
            )));
        }
        Ok(())
    }
}

/// Number of parallel execution units, never less than one.
pub fn available_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Everything a single ranking run is configured with.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingParams {
    pub weights: WeightPolicy,
    /// Fuzzy keyword similarity threshold, 0-100.
    pub fuzzy_threshold: f64,
    /// Maximum number of results returned.
    pub top_k: usize,
    /// Number of shards the pool is split into.
    pub shards: usize,
    /// Rescale final scores relative to the best one.
    pub relative_grading: bool,
    /// Only consider the first `n` candidates the source yields.
    pub pool_limit: Option<usize>,
}

impl RankingParams {
    /// Parameters with the given weights and defaults for everything else.
    pub fn new(weights: WeightPolicy) -> Self {
        Self {
            weights,
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            top_k: DEFAULT_TOP_K,
            shards: available_parallelism(),
            relative_grading: false,
            pool_limit: None,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_shards(mut self, shards: usize) -> Self {
        self.shards = shards;
        self
    }

    pub fn with_fuzzy_threshold(mut self, threshold: f64) -> Self {
        self.fuzzy_threshold = threshold;
        self
    }

    /// Fail fast on any setting that would make scoring meaningless.
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;
        if !self.fuzzy_threshold.is_finite()
            || !(0.0..=100.0).contains(&self.fuzzy_threshold)
        {
            return Err(Error::InvalidConfiguration(format!(
                "fuzzy threshold must be within [0, 100], got {}",
                self.fuzzy_threshold
            )));
        }
        if self.top_k < 1 {
            return Err(Error::InvalidConfiguration(
                "top_k must be at least 1".into(),
            ));
        }
        if self.shards < 1 {
            return Err(Error::InvalidConfiguration(
                "shard count must be at least 1".into(),
            ));
        }
        if self.pool_limit == Some(0) {
            return Err(Error::InvalidConfiguration(
                "pool limit must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
