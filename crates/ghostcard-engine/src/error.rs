use ghostcard_storage::StorageError;
use thiserror::Error;

/// Errors internal to the protocol engine.
///
/// None of these ever reach the terminal: the dispatcher downgrades every
/// internal failure to the `6F00` status word and logs it.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Storage operation failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The host bridge delivered an empty command frame
    #[error("Empty command frame")]
    EmptyFrame,
}

/// Specialized result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
