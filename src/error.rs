use thiserror::Error;

/// Error taxonomy for the indexer core.
///
/// Variant names track the kinds from the component contracts rather than
/// the originating library, so callers can match on *why* something failed
/// without caring whether the failure came from `alloy`, `sqlx`, or a
/// hand-written check.
#[derive(Error, Debug)]
pub enum IndexerError {
    /// Invalid input: malformed address/hash, negative block, inverted
    /// window. Never retried.
    #[error("validation error: {0}")]
    Validation(String),

    /// RPC transport failure, timeout, or malformed decoded event. Aborts
    /// the current window; retryable at window granularity by the caller.
    #[error("blockchain error: {0}")]
    Blockchain(String),

    /// Storage unavailability or unexpected write failure. Aborts the
    /// current window for the affected chain.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Fatal at startup.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Reserved for the read path; not produced by the core.
    #[error("not found: {0}")]
    NotFound(String),

    /// Reserved for the read path; not produced by the core.
    #[error("api error: {0}")]
    Api(String),
}

pub type Result<T> = std::result::Result<T, IndexerError>;

impl IndexerError {
    /// True for the two kinds the Scanner re-raises out of a chain's loop.
    pub fn aborts_chain(&self) -> bool {
        matches!(self, IndexerError::Blockchain(_) | IndexerError::Database(_))
    }
}
