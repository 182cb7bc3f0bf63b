pub mod account;
pub mod inventory;

pub use account::{Account, AccountDirectory, CardTier};
pub use inventory::{InventorySource, StockEntry};

/// How a failure should be surfaced to a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad input; recoverable, reported with a human-readable reason.
    Validation,
    /// Referenced record does not exist.
    NotFound,
    /// Transition attempted on a completed or cancelled order.
    TerminalState,
    /// Storage or wiring fault.
    Internal,
}

/// Failure inside a persistence backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(String),
    #[error("Conflicting record: {0}")]
    Conflict(String),
    #[error("Stored value could not be decoded: {0}")]
    Corrupt(String),
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CoreError {
    pub fn class(&self) -> ErrorClass {
        match self {
            CoreError::ValidationError(_) => ErrorClass::Validation,
            CoreError::NotFound(_) => ErrorClass::NotFound,
            CoreError::Store(_) => ErrorClass::Internal,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
