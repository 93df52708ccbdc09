// src/error.rs

use thiserror::Error;

/// Core error types for the forensicstore engine.
#[derive(Error, Debug)]
pub enum Error {
    /// An item is missing the discriminator field (by default `type`).
    #[error("item is missing the discriminator field")]
    MissingDiscriminator,

    /// No item exists for the given uid.
    #[error("item does not exist: {0}")]
    NotFound(String),

    /// An item failed JSON Schema validation in strict mode.
    #[error("item could not be validated: {0:?}")]
    ValidationError(Vec<String>),

    /// A stored path escapes the container root (contains `..`).
    #[error("path escapes the container root: {0}")]
    OutOfRoot(String),

    /// A schema lookup or registration failed.
    #[error("schema error: {0}")]
    SchemaError(String),

    /// Container is closed; no further operations are allowed.
    #[error("container is closed")]
    Closed,

    /// Underlying storage backend error.
    #[error("backend error: {0}")]
    Backend(#[from] std::io::Error),

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON (de)serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using the forensicstore engine's Error type.
pub type Result<T> = std::result::Result<T, Error>;
