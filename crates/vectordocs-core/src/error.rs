//! Error taxonomy shared by the ingest and search pipelines.
//!
//! The chunker never fails. Everything else reports one of these variants
//! with enough context (operation, path, chunk id, collection) to log or
//! display without further lookups.

use std::path::PathBuf;

/// Convenience alias used across the core crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The ingest root does not exist.
    #[error("Directory not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// A file listed by the walker could not be read.
    #[error("failed to read {}: {message}", path.display())]
    Read { path: PathBuf, message: String },

    /// The embedding backend failed or returned a vector of the wrong arity.
    #[error("embedding failed for {context}: {message}")]
    Embedding { context: String, message: String },

    /// A collection create, upsert, or query failed.
    #[error("store {operation} failed on collection '{collection}': {message}")]
    Store {
        operation: &'static str,
        collection: String,
        message: String,
    },

    /// A stored record could not be interpreted as a code chunk.
    #[error("record '{id}' in collection '{collection}' is not a code chunk: {reason}")]
    Mapping {
        collection: String,
        id: String,
        reason: String,
    },

    /// An ingest batch stopped on its first failure.
    #[error("ingest aborted after {persisted} of {total} chunks")]
    Aborted {
        persisted: usize,
        total: usize,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub(crate) fn store(
        operation: &'static str,
        collection: impl Into<String>,
        message: impl std::fmt::Display,
    ) -> Self {
        Error::Store {
            operation,
            collection: collection.into(),
            message: message.to_string(),
        }
    }

    /// Number of chunks that were persisted before an ingest aborted.
    ///
    /// `None` for every variant other than [`Error::Aborted`].
    pub fn persisted(&self) -> Option<usize> {
        match self {
            Error::Aborted { persisted, .. } => Some(*persisted),
            _ => None,
        }
    }

    /// The underlying failure, looking through [`Error::Aborted`].
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Aborted { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aborted_reports_partial_progress() {
        let err = Error::Aborted {
            persisted: 5,
            total: 20,
            source: Box::new(Error::Embedding {
                context: "chunk abc".to_string(),
                message: "backend unavailable".to_string(),
            }),
        };
        assert_eq!(err.persisted(), Some(5));
        assert!(matches!(err.root_cause(), Error::Embedding { .. }));
        let msg = err.to_string();
        assert!(msg.contains("5 of 20"), "{}", msg);
        assert!(!msg.contains("backend unavailable"), "{}", msg);

        let cause = std::error::Error::source(&err).unwrap();
        assert!(cause.to_string().contains("backend unavailable"));
        let chain = format!("{:#}", anyhow::Error::new(err));
        assert_eq!(chain.matches("backend unavailable").count(), 1, "{}", chain);
    }

    #[test]
    fn not_found_message_names_path() {
        let err = Error::NotFound {
            path: PathBuf::from("/no/such/dir"),
        };
        assert_eq!(err.to_string(), "Directory not found: /no/such/dir");
        assert_eq!(err.persisted(), None);
    }
}
