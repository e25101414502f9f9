//! Error types for storage operations

use thiserror::Error;

/// Errors that can occur while preparing or using blob storage.
///
/// Variants never carry the raw connection string or account key.
#[derive(Debug, Error)]
pub enum Error {
    /// A segment of the connection string is not a `Key=Value` pair
    #[error("Connection string is either blank or malformed")]
    MalformedConnectionString,

    /// A setting needed to reach the account is absent
    #[error("Connection string is missing required setting `{0}`")]
    MissingSetting(&'static str),

    /// The account key could not be decoded into signing material
    #[error("Storage account key is not valid base64")]
    InvalidAccountKey,

    /// The blob endpoint could not be turned into a URL
    #[error("Invalid blob endpoint: {0}")]
    InvalidEndpoint(String),

    /// Object store creation failed
    #[error("Failed to create object store: {0}")]
    ObjectStoreCreation(String),

    /// Object store error
    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),
}
