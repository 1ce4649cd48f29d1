use std::time::Duration;

use thiserror::Error;

/// Failure to obtain the raw text of a content source.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request for {source_id} failed: {source}")]
    Http {
        source_id: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{source_id} answered with status {status}")]
    Status { source_id: String, status: u16 },

    #[error("failed to read {source_id}: {source}")]
    Io {
        source_id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("refreshing {source_id} timed out after {timeout:?}")]
    TimedOut { source_id: String, timeout: Duration },
}

/// Why no session could be assembled. Nothing is mutated when this is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("there are no weak items to practise yet")]
    NoWeakItems,

    #[error("no items match the selected filters")]
    EmptySession,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("cannot {action} while the session is {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: &'static str,
    },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store lock was poisoned")]
    Poisoned,
}

#[derive(Error, Debug)]
pub enum QuizError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
