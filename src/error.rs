/// Domain-specific error types for the auction engine.
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("state conflict: {0}")]
    StateConflict(String),

    #[error("policy violation: {0}")]
    Policy(String),

    #[error("store operation failed: {0}")]
    Store(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MarketError {
    /// Whether retrying the whole operation is safe.
    ///
    /// Store failures commit nothing partial, so the caller may simply
    /// re-submit. Every other variant is a deterministic rejection.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

/// Convenience type alias.
pub type MarketResult<T> = Result<T, MarketError>;
