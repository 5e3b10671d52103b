//! Error types for the session layer.

/// Errors from account management and login.
///
/// `DuplicateName`, `AuthFailed` and `InvalidName` are reported back to
/// the client; `Storage` means the account log could not be written.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// An account with this name already exists.
    #[error("account name {0:?} is already in use")]
    DuplicateName(String),

    /// Unknown name or wrong password. The string says which, for logs
    /// only; clients get the same reply either way.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The name or password can't be stored in the account log.
    #[error("invalid credential: {0}")]
    InvalidName(String),

    /// No account with this name exists.
    #[error("no account named {0:?}")]
    UnknownAccount(String),

    /// Reading or writing the account log failed.
    #[error("account storage failed: {0}")]
    Storage(#[from] std::io::Error),
}
