pub type StoreResult<T> = Result<T, StoreError>;

/// Errors produced by the document store.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("store: storage error: {0}")]
    Storage(String),

    #[error("store: serialization error: {0}")]
    Serialization(String),
}
