use crate::combine::round2;

/// Cosine similarity of a query/candidate embedding pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorScore {
    /// Raw cosine similarity in [-1, 1], kept for diagnostics.
    pub similarity: f64,
    /// `100 * similarity`, floored at 0 and rounded to 2 places.
    pub match_pct: f64,
}

/// Returned when the two embeddings differ in length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionMismatch {
    pub expected: usize,
    pub found: usize,
}

/// Cosine similarity: `dot(a, b) / (|a| * |b|)`.
///
/// Accumulates in `f64`. If either magnitude is zero the similarity is 0.
/// The result is clamped to [-1, 1] to absorb rounding drift.
pub fn cosine_similarity(
    a: &[f32],
    b: &[f32],
) -> Result<f64, DimensionMismatch> {
    if a.len() != b.len() {
        return Err(DimensionMismatch {
            expected: a.len(),
            found: b.len(),
        });
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok((dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0))
}

/// Score a candidate embedding against the query embedding.
pub fn score_vectors(
    query: &[f32],
    candidate: &[f32],
) -> Result<VectorScore, DimensionMismatch> {
    let similarity = cosine_similarity(query, candidate)?;
    Ok(VectorScore {
        similarity,
        match_pct: round2((similarity * 100.0).clamp(0.0, 100.0)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_score_100() {
        let score = score_vectors(&[1.0, 0.0], &[1.0, 0.0]).unwrap();
        assert_eq!(score.similarity, 1.0);
        assert_eq!(score.match_pct, 100.0);
    }

    #[test]
    fn orthogonal_vectors_score_zero() {
        let score = score_vectors(&[1.0, 0.0], &[0.0, 1.0]).unwrap();
        assert_eq!(score.match_pct, 0.0);
    }

    #[test]
    fn magnitude_does_not_matter() {
        let a = score_vectors(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap();
        assert!((a.similarity - 1.0).abs() < 1e-12);
        assert_eq!(a.match_pct, 100.0);
    }

    #[test]
    fn opposite_vectors_floor_at_zero_pct() {
        let score = score_vectors(&[1.0, 0.0], &[-1.0, 0.0]).unwrap();
        assert_eq!(score.similarity, -1.0);
        assert_eq!(score.match_pct, 0.0);
    }

    #[test]
    fn zero_vector_is_zero_not_nan() {
        let score = score_vectors(&[0.0, 0.0], &[1.0, 1.0]).unwrap();
        assert_eq!(score.similarity, 0.0);
        assert_eq!(score.match_pct, 0.0);

        let score = score_vectors(&[0.3, 0.4], &[0.0, 0.0]).unwrap();
        assert_eq!(score.match_pct, 0.0);
    }

    #[test]
    fn forty_five_degrees() {
        let score = score_vectors(&[1.0, 0.0], &[1.0, 1.0]).unwrap();
        assert_eq!(score.match_pct, 70.71);
    }

    #[test]
    fn dimension_mismatch_is_reported() {
        let err = cosine_similarity(&[1.0, 0.0], &[1.0]).unwrap_err();
        assert_eq!(
            err,
            DimensionMismatch {
                expected: 2,
                found: 1
            }
        );
    }
}
