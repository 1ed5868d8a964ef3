use thiserror::Error;

/// Every way an operation on a download record can be refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// Unknown code, or a record that has already expired.
    #[error("file does not exist or has expired")]
    NotFound,
    #[error("a password is required to access this file")]
    PasswordRequired,
    #[error("incorrect password")]
    InvalidPassword,
    #[error("invalid request: {0}")]
    InvalidInput(String),
    #[error("internal failure: {0}")]
    InternalFailure(String),
}

pub type Result<T> = std::result::Result<T, AccessError>;
