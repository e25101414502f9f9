//! Storage account settings resolved from a connection string.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use url::Url;

use crate::connection::parse_connection_string;
use crate::sas::{generate_container_sas, ContainerSas, SasPermissions};
use crate::{Error, Result};

const DEFAULT_PROTOCOL: &str = "https";
const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";

/// Name, key and blob endpoint of an Azure storage account.
///
/// Recognised connection string settings:
///
/// | Setting                    | Required | Default            |
/// |----------------------------|----------|--------------------|
/// | `AccountName`              | yes      |                    |
/// | `AccountKey`               | yes      |                    |
/// | `BlobEndpoint`             | no       | derived            |
/// | `DefaultEndpointsProtocol` | no       | `https`            |
/// | `EndpointSuffix`           | no       | `core.windows.net` |
#[derive(Clone)]
pub struct StorageAccount {
    name: String,
    key: String,
    blob_endpoint: Url,
}

impl StorageAccount {
    pub fn new(name: impl Into<String>, key: impl Into<String>, blob_endpoint: Url) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            blob_endpoint,
        }
    }

    /// Parse a connection string such as
    /// `DefaultEndpointsProtocol=https;AccountName=acc;AccountKey=...;EndpointSuffix=core.windows.net`
    pub fn from_connection_string(conn_str: &str) -> Result<Self> {
        Self::from_settings(&parse_connection_string(conn_str)?)
    }

    pub fn from_settings(settings: &HashMap<String, String>) -> Result<Self> {
        let name = settings
            .get("AccountName")
            .ok_or(Error::MissingSetting("AccountName"))?;
        let key = settings
            .get("AccountKey")
            .ok_or(Error::MissingSetting("AccountKey"))?;

        let blob_endpoint = match settings.get("BlobEndpoint") {
            Some(endpoint) => endpoint.clone(),
            None => {
                let protocol = settings
                    .get("DefaultEndpointsProtocol")
                    .map(String::as_str)
                    .unwrap_or(DEFAULT_PROTOCOL);
                let suffix = settings
                    .get("EndpointSuffix")
                    .map(String::as_str)
                    .unwrap_or(DEFAULT_ENDPOINT_SUFFIX);
                format!("{protocol}://{name}.blob.{suffix}")
            }
        };
        let blob_endpoint =
            Url::parse(&blob_endpoint).map_err(|e| Error::InvalidEndpoint(e.to_string()))?;

        Ok(Self::new(name.as_str(), key.as_str(), blob_endpoint))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn key(&self) -> &str {
        &self.key
    }

    pub fn blob_endpoint(&self) -> &Url {
        &self.blob_endpoint
    }

    /// URL of `blob_name` inside `container`, path segments percent-encoded
    pub fn blob_url(&self, container: &str, blob_name: &str) -> Result<Url> {
        let mut url = self.blob_endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidEndpoint(self.blob_endpoint.to_string()))?
            .pop_if_empty()
            .push(container)
            .push(blob_name);
        Ok(url)
    }

    /// Mint a shared access signature scoped to `container`
    pub fn container_sas(
        &self,
        container: &str,
        permissions: SasPermissions,
        expiry: DateTime<Utc>,
    ) -> Result<ContainerSas> {
        generate_container_sas(&self.name, &self.key, container, permissions, expiry)
    }
}

impl fmt::Debug for StorageAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageAccount")
            .field("name", &self.name)
            .field("key", &"<redacted>")
            .field("blob_endpoint", &self.blob_endpoint.as_str())
            .finish()
    }
}
