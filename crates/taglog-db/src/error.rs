use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Missing key, tag, or set member on read, update, or remove.
    #[error("not found")]
    NotFound,

    /// Creating a tag whose message id already exists.
    #[error("duplicate key: {0}")]
    DuplicateKey(i64),

    /// A value failed encode/decode round-trip verification at write time.
    #[error("value failed serialization round-trip: {0}")]
    RoundTrip(String),

    /// Rejected before any I/O (malformed time window, bad table name).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A second store instance tried to bind an already-claimed table.
    #[error("table already bound: {0}")]
    TableAlreadyBound(String),

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

impl StoreError {
    /// Map a constraint violation on insert to `DuplicateKey`.
    pub(crate) fn duplicate_on_conflict(err: rusqlite::Error, key: i64) -> StoreError {
        match err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StoreError::DuplicateKey(key)
            }
            other => StoreError::Sqlite(other),
        }
    }
}
