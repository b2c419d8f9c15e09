use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Display name used when a stored candidate carries none.
pub const UNKNOWN_NAME: &str = "N/A";

fn unknown_name() -> String {
    UNKNOWN_NAME.to_string()
}

/// The record every candidate is ranked against.
///
/// Its embedding length fixes the dimension `D` for a ranking run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    #[serde(alias = "jobId", alias = "jobDescriptionId")]
    pub id: String,
    /// Raw text the keywords and embedding were derived from, if known.
    #[serde(
        default,
        alias = "jobDescription",
        alias = "query",
        skip_serializing_if = "Option::is_none"
    )]
    pub text: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub embedding: Vec<f32>,
}

impl Query {
    pub fn new<I, S>(id: &str, keywords: I, embedding: Vec<f32>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.to_string(),
            text: None,
            keywords: keywords.into_iter().map(Into::into).collect(),
            embedding,
        }
    }

    pub fn dimension(&self) -> usize {
        self.embedding.len()
    }

    /// Reject queries that cannot anchor a ranking run.
    pub fn validate(&self) -> Result<()> {
        if self.embedding.is_empty() {
            return Err(Error::InvalidQuery(format!(
                "query '{}' has no embedding",
                self.id
            )));
        }
        if self.embedding.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidQuery(format!(
                "query '{}' has a non-finite embedding value",
                self.id
            )));
        }
        Ok(())
    }
}

/// A profile record from the candidate pool.
///
/// `keywords` and `embedding` are optional at the type level: `None` means
/// the store had no such field, which makes the candidate ineligible.
/// Fields the engine does not use are kept in `extra` so a stored record
/// round-trips intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(alias = "resumeId")]
    pub id: String,
    #[serde(default = "unknown_name", alias = "name")]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(
        default,
        alias = "contactNo",
        skip_serializing_if = "Option::is_none"
    )]
    pub contact_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Why a candidate produced no match result.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum IneligibleReason {
    MissingEmbedding,
    DimensionMismatch,
    NonFiniteEmbedding,
    MissingKeywords,
}

impl IneligibleReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingEmbedding => "missing_embedding",
            Self::DimensionMismatch => "dimension_mismatch",
            Self::NonFiniteEmbedding => "non_finite_embedding",
            Self::MissingKeywords => "missing_keywords",
        }
    }
}

impl std::fmt::Display for IneligibleReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Candidate {
    pub fn new(id: &str, display_name: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            email: None,
            contact_no: None,
            keywords: None,
            embedding: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_contact(mut self, email: &str, contact_no: &str) -> Self {
        self.email = Some(email.to_string());
        self.contact_no = Some(contact_no.to_string());
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = Some(keywords.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Key identifying the real-world person behind this record.
    ///
    /// Built from the case-folded email and the digits of the contact
    /// number. Records with neither fall back to their own id so they are
    /// never merged with one another.
    pub fn identity_key(&self) -> String {
        let email = self
            .email
            .as_deref()
            .map(|e| e.trim().to_lowercase())
            .unwrap_or_default();
        let phone: String = self
            .contact_no
            .as_deref()
            .unwrap_or_default()
            .chars()
            .filter(char::is_ascii_digit)
            .collect();

        if email.is_empty() && phone.is_empty() {
            format!("id:{}", self.id)
        } else {
            format!("{email}|{phone}")
        }
    }

    /// Borrow the keyword list and embedding if this candidate can be
    /// scored against a query of the given dimension.
    pub fn scoring_inputs(
        &self,
        dimension: usize,
    ) -> std::result::Result<(&[String], &[f32]), IneligibleReason> {
        let embedding = match self.embedding.as_deref() {
            Some(embedding) if !embedding.is_empty() => embedding,
            _ => return Err(IneligibleReason::MissingEmbedding),
        };
        if embedding.len() != dimension {
            return Err(IneligibleReason::DimensionMismatch);
        }
        if embedding.iter().any(|v| !v.is_finite()) {
            return Err(IneligibleReason::NonFiniteEmbedding);
        }
        let keywords = self
            .keywords
            .as_deref()
            .ok_or(IneligibleReason::MissingKeywords)?;
        Ok((keywords, embedding))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn identity_key_folds_email_and_strips_phone() {
        let a = Candidate::new("1", "Ann")
            .with_contact(" Ann@Example.com ", "+1 (555) 010-2000");
        let b = Candidate::new("2", "Ann B")
            .with_contact("ann@example.com", "15550102000");
        assert_eq!(a.identity_key(), b.identity_key());
        assert_eq!(a.identity_key(), "ann@example.com|15550102000");
    }

    #[test]
    fn identity_key_without_contact_uses_id() {
        let a = Candidate::new("1", "Ann");
        let b = Candidate::new("2", "Ann");
        assert_eq!(a.identity_key(), "id:1");
        assert_ne!(a.identity_key(), b.identity_key());
    }

    #[test]
    fn scoring_inputs_reasons() {
        let base = Candidate::new("1", "Ann").with_keywords(["rust"]);
        assert_eq!(
            base.scoring_inputs(2).unwrap_err(),
            IneligibleReason::MissingEmbedding
        );

        let short = base.clone().with_embedding(vec![1.0]);
        assert_eq!(
            short.scoring_inputs(2).unwrap_err(),
            IneligibleReason::DimensionMismatch
        );

        let nan = base.clone().with_embedding(vec![1.0, f32::NAN]);
        assert_eq!(
            nan.scoring_inputs(2).unwrap_err(),
            IneligibleReason::NonFiniteEmbedding
        );

        let no_keywords =
            Candidate::new("2", "Bo").with_embedding(vec![1.0, 0.0]);
        assert_eq!(
            no_keywords.scoring_inputs(2).unwrap_err(),
            IneligibleReason::MissingKeywords
        );

        let ok = base.with_embedding(vec![1.0, 0.0]);
        let (keywords, embedding) = ok.scoring_inputs(2).unwrap();
        assert_eq!(keywords, ["rust"]);
        assert_eq!(embedding, [1.0, 0.0]);
    }

    #[test]
    fn empty_keyword_list_is_still_eligible() {
        let c = Candidate::new("1", "Ann")
            .with_keywords(Vec::<String>::new())
            .with_embedding(vec![0.5, 0.5]);
        assert!(c.scoring_inputs(2).is_ok());
    }

    #[test]
    fn stored_empty_embedding_counts_as_missing() {
        let c: Candidate = serde_json::from_value(json!({
            "id": "r-1",
            "keywords": ["python"],
            "embedding": []
        }))
        .unwrap();
        assert_eq!(
            c.scoring_inputs(2).unwrap_err(),
            IneligibleReason::MissingEmbedding
        );
    }

    #[test]
    fn candidate_accepts_store_field_names() {
        let value = json!({
            "resumeId": "r-7",
            "name": "Priya",
            "email": "priya@example.com",
            "contactNo": "98765",
            "keywords": ["Python Developer"],
            "embedding": [0.1, 0.2],
            "address": "Pune",
            "skills": [{"skillName": "Python"}]
        });
        let c: Candidate = serde_json::from_value(value).unwrap();
        assert_eq!(c.id, "r-7");
        assert_eq!(c.display_name, "Priya");
        assert_eq!(c.contact_no.as_deref(), Some("98765"));
        assert_eq!(c.keywords.as_deref().unwrap().len(), 1);
        assert_eq!(c.extra.get("address"), Some(&json!("Pune")));
    }

    #[test]
    fn candidate_defaults_for_absent_fields() {
        let c: Candidate = serde_json::from_value(json!({"id": "x"})).unwrap();
        assert_eq!(c.display_name, UNKNOWN_NAME);
        assert!(c.keywords.is_none());
        assert!(c.embedding.is_none());
        assert!(c.extra.is_empty());
    }

    #[test]
    fn query_accepts_store_field_names() {
        let q: Query = serde_json::from_value(json!({
            "jobId": "jd-1",
            "jobDescription": "Senior Python developer",
            "keywords": ["python"],
            "embedding": [1, 0]
        }))
        .unwrap();
        assert_eq!(q.id, "jd-1");
        assert_eq!(q.text.as_deref(), Some("Senior Python developer"));
        assert_eq!(q.dimension(), 2);
    }

    #[test]
    fn query_validation() {
        assert!(Query::new("q", ["a"], vec![1.0]).validate().is_ok());
        assert!(matches!(
            Query::new("q", ["a"], vec![]).validate(),
            Err(Error::InvalidQuery(_))
        ));
        assert!(matches!(
            Query::new("q", ["a"], vec![f32::INFINITY]).validate(),
            Err(Error::InvalidQuery(_))
        ));
    }
}
