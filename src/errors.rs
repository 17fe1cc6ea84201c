use thiserror::Error;

/// Failures returned by booking operations. None of them is fatal: the caller
/// reports them to the user and no partial change has been applied.
#[derive(Error, Debug)]
pub enum BookingError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("{0}")]
    Duplicate(String),

    #[error("{0}")]
    Capacity(String),

    #[error("you have used all your interview requests")]
    Quota,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Auth(String),

    #[error("storage failure: {0}")]
    Store(#[from] StoreError),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("cannot encode or decode stored value: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("i/o error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type BookingResult<T> = Result<T, BookingError>;
pub type StoreResult<T> = Result<T, StoreError>;
