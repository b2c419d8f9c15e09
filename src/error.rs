use std::path::PathBuf;

use crate::provider::CollaboratorError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Redb(#[from] redb::Error),

    #[error("database storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("database transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("database table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("database commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("database open error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("worker pool error: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("embedding service failure: {0}")]
    Collaborator(#[from] CollaboratorError),

    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("data directory does not exist and could not be created: {0}")]
    DataDir(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_configuration() {
        let err = Error::InvalidConfiguration("top_k must be >= 1".into());
        assert_eq!(err.to_string(), "invalid configuration: top_k must be >= 1");
    }

    #[test]
    fn display_not_found() {
        let err = Error::NotFound {
            kind: "query",
            name: "jd-1".into(),
        };
        assert_eq!(err.to_string(), "query not found: jd-1");
    }

    #[test]
    fn collaborator_failure_converts() {
        let err: Error = CollaboratorError::Timeout.into();
        assert!(matches!(err, Error::Collaborator(CollaboratorError::Timeout)));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
