/// Vault failures. Every variant is fatal to the caller: the host terminates.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("authentication rejected")]
    Rejected,

    #[error("authentication cancelled")]
    Cancelled,

    #[error("secure storage unavailable: {0}")]
    Unavailable(String),

    #[error("secure storage io: {0}")]
    Io(#[from] std::io::Error),

    #[error("vault key does not match the stored entry")]
    WrongKey,

    #[error("stored secret is corrupt: {0}")]
    Corrupt(String),
}

pub type VaultResult<T> = Result<T, VaultError>;
