use thiserror::Error;

/// Errors raised by the stores, the valuation engine and the ambient layers.
///
/// Input-validation variants (`Validation`, `InvalidAmount`, `InvalidEndpoint`,
/// `SelfTransfer`) are always returned before any write is attempted.
#[derive(Debug, Error)]
pub enum Error {
    /// Blank or duplicate bucket name, malformed money text, bad calendar input
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable reason, surfaced verbatim to the user
        message: String,
    },

    /// Flow amount (or entry value) outside the accepted range
    #[error("Invalid amount: {amount} cents")]
    InvalidAmount {
        /// The rejected amount in cents
        amount: i64,
    },

    /// Endpoint kind and bucket id do not agree, or cash moves to cash
    #[error("Invalid endpoint: {message}")]
    InvalidEndpoint {
        /// Which side of the flow is wrong and why
        message: String,
    },

    /// Both flow endpoints reference the same bucket
    #[error("Cannot transfer bucket {bucket_id} into itself")]
    SelfTransfer {
        /// The bucket on both ends
        bucket_id: i64,
    },

    /// Unknown bucket or flow id
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of record that was looked up (`"bucket"`, `"flow"`)
        entity: &'static str,
        /// The id that was not found
        id: i64,
    },

    /// Configuration file could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong while loading configuration
        message: String,
    },

    /// Non-database store failure (e.g. a poisoned in-memory lock)
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the failure
        message: String,
    },

    /// Error reported by `SeaORM`
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
