use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Domain errors. All variants are recoverable by the caller.
#[derive(Debug, Error)]
pub enum Error {
    /// Signup attempted without a password.
    #[error("password is required")]
    MissingPassword,

    /// A unique constraint (username, email) was violated when the record
    /// was persisted. Only surfaces at insert/update time, never earlier.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("password hash error: {0}")]
    PasswordHash(String),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return Error::DuplicateKey(db_err.message().to_string());
            }
        }
        Error::Database(e)
    }
}

impl Error {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }
}
