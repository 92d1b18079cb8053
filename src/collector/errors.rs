use thiserror::Error;

/// Errors raised by the collector's storage layer and id handling.
///
/// Event handlers never surface these to the host; they are logged and the
/// failing step becomes a no-op.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Wrapper around IO errors (directory creation, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when fetching a record that is not present.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Returned when deserializing a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },

    /// A stored key or CLI argument did not contain a valid identifier.
    #[error("invalid id: {0}")]
    InvalidId(String),
}
