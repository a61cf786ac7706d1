use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Modeled outcomes of the relationship core. Everything here is an
/// expected result the request layer turns into a user-facing message;
/// `Sqlite` is the one unexpected case and propagates as a generic
/// failure after the active transaction is rolled back.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(&'static str),

    #[error("{0}")]
    InvalidArgument(&'static str),

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

impl StoreError {
    /// Uniqueness is enforced at the storage layer as well as by the
    /// pre-checks; a UNIQUE or PRIMARY KEY violation that slips past a
    /// pre-check is still the conflict it represents, not a generic
    /// storage failure.
    pub(crate) fn conflict_on_unique(err: rusqlite::Error, msg: &'static str) -> StoreError {
        match &err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                StoreError::Conflict(msg)
            }
            _ => StoreError::Sqlite(err),
        }
    }
}

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
