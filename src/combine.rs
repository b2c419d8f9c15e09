use crate::{config::WeightPolicy, ranking::MatchResult};

/// Round to two decimal places, the precision every reported score uses.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Blend keyword and vector percentages into one score in [0, 100].
///
/// `keyword_weight * keyword_pct + vector_weight * vector_pct`, rounded
/// to two places.
pub fn combine(keyword_pct: f64, vector_pct: f64, weights: &WeightPolicy) -> f64 {
    let blended =
        weights.keyword * keyword_pct + weights.vector * vector_pct;
    round2(blended).clamp(0.0, 100.0)
}

/// Rescale a ranked list so its best score reads 100.
///
/// Every combined score is divided by the first (highest) one. Order is
/// left untouched; a top score of 0 leaves the list as is.
pub fn grade_relative(results: &mut [MatchResult]) {
    let Some(top) = results.first().map(|r| r.combined_score) else {
        return;
    };
    if top <= 0.0 {
        return;
    }
    for r in results.iter_mut() {
        r.combined_score = round2(r.combined_score / top * 100.0).min(100.0);
    }
}
