use thiserror::Error;

pub const SEARCH_FAILED_MESSAGE: &str = "Failed to search for movies";
pub const DETAILS_FAILED_MESSAGE: &str = "Failed to load movie details";

/// Failures of the remote metadata client. Both variants carry the
/// underlying cause for logs; the screen only ever shows
/// [`ClientError::user_message`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    #[error("{SEARCH_FAILED_MESSAGE}: {0}")]
    SearchFailed(String),
    #[error("{DETAILS_FAILED_MESSAGE}: {0}")]
    DetailsFailed(String),
}

impl ClientError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ClientError::SearchFailed(_) => SEARCH_FAILED_MESSAGE,
            ClientError::DetailsFailed(_) => DETAILS_FAILED_MESSAGE,
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize favorites: {0}")]
    Serialize(#[from] serde_json::Error),
    /// Stored favorites were not a list of movie records. Recovered to an
    /// empty list by the store, never returned to callers.
    #[error("stored favorites are malformed: {0}")]
    PersistenceParseFailed(String),
}
