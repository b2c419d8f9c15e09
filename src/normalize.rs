/// Similarity threshold (0-100) used when none is configured.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 80.0;

/// Canonicalize a keyword or phrase into a comparison key.
///
/// Case is folded, every character that is neither alphanumeric nor
/// whitespace is dropped, and the remaining tokens are sorted and joined
/// with single spaces. Two keywords are equivalent iff their keys are
/// equal. An empty key never matches anything.
///
/// # Examples
///
/// ```
/// use talentrank::normalize::normalize_keyword;
///
/// assert_eq!(normalize_keyword("Developer, Python!"), "developer python");
/// assert_eq!(normalize_keyword("  ...  "), "");
/// ```
pub fn normalize_keyword(raw: &str) -> String {
    let stripped: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    let mut tokens: Vec<&str> = stripped.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Normalized edit similarity between two keys, scaled to 0-100.
///
/// `100 * (1 - levenshtein(a, b) / max(len(a), len(b)))`, counted in
/// characters. Two empty keys are identical (100).
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b) * 100.0
}

/// Approximate equality of two normalized keys.
///
/// True iff [`similarity_ratio`] reaches `threshold`. Empty keys never
/// match.
pub fn fuzzy_match(a: &str, b: &str, threshold: f64) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    similarity_ratio(a, b) >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_folds_case_and_sorts_tokens() {
        assert_eq!(normalize_keyword("Python Developer"), "developer python");
        assert_eq!(normalize_keyword("developer   PYTHON"), "developer python");
    }

    #[test]
    fn normalize_strips_punctuation() {
        assert_eq!(normalize_keyword("C++/C#"), "cc");
        assert_eq!(normalize_keyword("node.js"), "nodejs");
        assert_eq!(normalize_keyword("team-player"), "teamplayer");
    }

    #[test]
    fn normalize_keeps_unicode_letters() {
        assert_eq!(normalize_keyword("Café Müller"), "café müller");
    }

    #[test]
    fn normalize_empty_inputs() {
        assert_eq!(normalize_keyword(""), "");
        assert_eq!(normalize_keyword("!!! ---"), "");
    }

    #[test]
    fn ratio_of_identical_keys_is_100() {
        assert_eq!(similarity_ratio("rust", "rust"), 100.0);
    }

    #[test]
    fn ratio_is_symmetric() {
        let a = similarity_ratio("communication skills", "communications skill");
        let b = similarity_ratio("communications skill", "communication skills");
        assert_eq!(a, b);
    }

    #[test]
    fn near_miss_matches_at_default_threshold() {
        let a = normalize_keyword("communication skills");
        let b = normalize_keyword("communications skill");
        assert!(fuzzy_match(&a, &b, DEFAULT_FUZZY_THRESHOLD));
        assert!(!fuzzy_match(&a, &b, 99.0));
    }

    #[test]
    fn unrelated_keys_do_not_match() {
        assert!(!fuzzy_match("developer python", "developer java", 80.0));
    }

    #[test]
    fn empty_keys_never_match() {
        assert!(!fuzzy_match("", "", 0.0));
        assert!(!fuzzy_match("rust", "", 0.0));
    }

    #[test]
    fn threshold_zero_accepts_any_non_empty_pair() {
        assert!(fuzzy_match("abc", "xyz", 0.0));
    }
}
