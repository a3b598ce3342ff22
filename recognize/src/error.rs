use thiserror::Error;

/// Failure of a gallery or ledger backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store: {0}")]
    Backend(String),
}

/// Errors returned by recognition operations.
#[derive(Debug, Error)]
pub enum RecognizeError {
    /// Caller error: the query embedding has the wrong dimension. Reported
    /// before any side effect.
    #[error("recognize: dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("recognize: gallery read failed: {0}")]
    Gallery(#[source] StoreError),

    /// The ledger append failed. When this happens the cooldown window for
    /// the matched identity has already started and is not rolled back.
    #[error("recognize: ledger append failed: {0}")]
    Ledger(#[source] StoreError),
}
