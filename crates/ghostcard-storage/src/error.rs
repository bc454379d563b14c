use thiserror::Error;

/// Storage-specific error types for the card emulation engine.
///
/// These errors represent failures in database operations and in decoding
/// persisted card records back into their validated in-memory form.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database connection or query execution failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration execution failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Entity not found in database
    #[error("Entity not found: {entity_type} with {field}={value}")]
    NotFound {
        entity_type: String,
        field: String,
        value: String,
    },

    /// A persisted row violates a model invariant
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    /// AID list (de)serialization failed
    #[error("AID encoding error: {0}")]
    AidEncoding(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Specialized result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
