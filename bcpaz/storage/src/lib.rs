//! Azure Blob Storage staging helpers for bcpaz
//!
//! This crate provides the storage side of a blob staged load:
//!
//! - Parsing of storage connection strings into account settings
//! - Container scoped shared access signatures for the database server
//! - Construction of an `object_store` client for the staging container
//!
//! Nothing here talks to the database, see `bcpaz-core` for the loaders.

use std::sync::Arc;

use object_store::{azure::MicrosoftAzureBuilder, ObjectStore};
use tracing::debug;

pub mod account;
pub mod connection;
pub mod error;
pub mod sas;

pub use account::StorageAccount;
pub use connection::parse_connection_string;
pub use error::Error;
pub use sas::{generate_container_sas, ContainerSas, SasPermissions};
pub type Result<T> = core::result::Result<T, Error>;

/// Prelude module with commonly used types and functions
pub mod prelude;

/// Create an object store bound to `container` of the given account.
///
/// The store talks to the account's resolved blob endpoint, the same one
/// [`StorageAccount::blob_url`] builds URLs from.
pub fn azure_store(account: &StorageAccount, container: &str) -> Result<Arc<dyn ObjectStore>> {
    debug!(
        account = account.name(),
        endpoint = %account.blob_endpoint(),
        container,
        "Creating Azure object store"
    );

    azure_builder(account, container)
        .build()
        .map(|store| Arc::new(store) as Arc<dyn ObjectStore>)
        .map_err(|e| Error::ObjectStoreCreation(e.to_string()))
}

fn azure_builder(account: &StorageAccount, container: &str) -> MicrosoftAzureBuilder {
    let endpoint = account.blob_endpoint();

    MicrosoftAzureBuilder::new()
        .with_account(account.name())
        .with_access_key(account.key())
        .with_container_name(container)
        .with_endpoint(endpoint.as_str().trim_end_matches('/').to_string())
        .with_allow_http(endpoint.scheme() == "http")
}
