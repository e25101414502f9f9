//! Loads staged through Azure Blob Storage and `COPY INTO`.
//!
//! The flat file is uploaded to a container, the server is handed a container
//! scoped SAS inside a `COPY INTO` statement, and the staged blob is deleted
//! once the statement finished, whether it succeeded or not.

use std::fmt;
use std::path::Path as FsPath;
use std::sync::Arc;

use bcpaz_storage::{azure_store, ContainerSas, SasPermissions, StorageAccount};
use chrono::{Duration, Utc};
use object_store::{path::Path, ObjectStore, PutPayload};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::loader::BulkLoader;
use crate::model::{FlatFile, SqlTable};
use crate::redact::Redactor;

/// Lifetime of the SAS handed to the server
pub const SAS_VALIDITY_HOURS: i64 = 24;

/// Where flat files are staged before the server pulls them
#[derive(Debug, Clone)]
pub struct BlobStaging {
    store: Arc<dyn ObjectStore>,
    account: StorageAccount,
    container: String,
}

impl BlobStaging {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        account: StorageAccount,
        container: impl Into<String>,
    ) -> Self {
        Self {
            store,
            account,
            container: container.into(),
        }
    }

    /// Staging in `container` of the account described by `conn_str`
    pub fn from_connection_string(conn_str: &str, container: impl Into<String>) -> Result<Self> {
        let container = container.into();
        let account = StorageAccount::from_connection_string(conn_str)?;
        let store = azure_store(&account, &container)?;
        Ok(Self::new(store, account, container))
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn account(&self) -> &StorageAccount {
        &self.account
    }

    /// Upload `path` as `blob_name`
    async fn stage(&self, path: &FsPath, blob_name: &str) -> Result<StagedBlob> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| Error::io(path, e))?;
        // taken verbatim so the stored name matches `StorageAccount::blob_url`
        let location = Path::parse(blob_name).map_err(|e| {
            Error::Configuration(format!("{blob_name} is not a valid blob name: {e}"))
        })?;

        debug!(blob = %location, size = bytes.len(), "Uploading flat file");
        self.store
            .put(&location, PutPayload::from(bytes))
            .await?;

        Ok(StagedBlob {
            store: self.store.clone(),
            location,
            released: false,
        })
    }

    fn mint_sas(&self) -> Result<ContainerSas> {
        let expiry = Utc::now() + Duration::hours(SAS_VALIDITY_HOURS);
        Ok(self
            .account
            .container_sas(&self.container, SasPermissions::staging(), expiry)?)
    }
}

/// A blob uploaded for the duration of one load.
///
/// Call [`StagedBlob::release`] on every path; dropping it unreleased only logs.
#[derive(Debug)]
pub struct StagedBlob {
    store: Arc<dyn ObjectStore>,
    location: Path,
    released: bool,
}

impl StagedBlob {
    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Delete the blob
    pub async fn release(mut self) -> Result<()> {
        let deleted = self.store.delete(&self.location).await;
        self.released = true;
        deleted?;

        debug!(blob = %self.location, "Deleted staged blob");
        Ok(())
    }
}

impl Drop for StagedBlob {
    fn drop(&mut self) {
        if !self.released {
            warn!(blob = %self.location, "Staged blob dropped without being deleted");
        }
    }
}

/// `COPY INTO` statement loading a staged CSV blob
pub struct CopyIntoStatement<'a> {
    pub table: &'a SqlTable,
    pub blob_url: &'a Url,
    pub blob_name: &'a str,
    pub sas: &'a ContainerSas,
    pub field_terminator: char,
}

fn quote_identifier(identifier: &str) -> String {
    format!("[{}]", identifier.replace(']', "]]"))
}

fn quote_literal(literal: &str) -> String {
    literal.replace('\'', "''")
}

/// Control characters are written in hex notation, e.g. tab as `0x09`
fn field_terminator_literal(terminator: char) -> String {
    if terminator.is_ascii_control() {
        format!("0x{:02X}", terminator as u32)
    } else {
        quote_literal(&terminator.to_string())
    }
}

impl fmt::Display for CopyIntoStatement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "COPY INTO {}.{}",
            quote_identifier(&self.table.schema),
            quote_identifier(&self.table.table)
        )?;
        writeln!(f, "FROM '{}'", quote_literal(self.blob_url.as_str()))?;
        writeln!(f, "WITH (")?;
        writeln!(f, "    FILE_TYPE = 'CSV',")?;
        writeln!(
            f,
            "    CREDENTIAL=(IDENTITY= 'Shared Access Signature', SECRET='{}'),",
            quote_literal(self.sas.token())
        )?;
        writeln!(f, "    FIELDQUOTE = '\"',")?;
        writeln!(
            f,
            "    FIELDTERMINATOR='{}',",
            field_terminator_literal(self.field_terminator)
        )?;
        writeln!(f, "    FIRSTROW=2,")?;
        writeln!(f, "    ROWTERMINATOR='0X0A',")?;
        writeln!(f, "    ENCODING = 'UTF8',")?;
        writeln!(f, "    MAXERRORS = 0,")?;
        // relative to the container
        writeln!(
            f,
            "    ERRORFILE = '/errorsfolder_{}'",
            quote_literal(self.blob_name)
        )?;
        write!(f, ")")
    }
}

impl BulkLoader {
    /// Stage `file` in blob storage and load it into `table` with `COPY INTO`.
    ///
    /// The file is read as CSV with its own delimiter as field terminator and
    /// the first line skipped. The staged blob is deleted after the statement ran, also when it
    /// failed. If both the load and the delete fail the load error is returned
    /// and the delete failure is logged.
    #[instrument(
        skip_all,
        fields(table = %table.qualified_name(), container = staging.container()),
        err
    )]
    pub async fn copy_into(
        &self,
        table: &SqlTable,
        file: &FlatFile,
        staging: &BlobStaging,
    ) -> Result<()> {
        self.run_copy_into(table, file, staging)
            .await
            .map_err(|error| table.auth.redactor().redact_error(error))
    }

    async fn run_copy_into(
        &self,
        table: &SqlTable,
        file: &FlatFile,
        staging: &BlobStaging,
    ) -> Result<()> {
        let blob_name = file.base_name()?;
        let staged = staging.stage(&file.path, blob_name).await?;

        let loaded = self.load_staged(table, file, staging, blob_name).await;
        let released = staged.release().await;

        match (loaded, released) {
            (Ok(()), released) => released,
            (Err(error), Ok(())) => Err(error),
            (Err(error), Err(cleanup)) => {
                warn!(%cleanup, "Failed to delete staged blob after a failed load");
                Err(error)
            }
        }
    }

    async fn load_staged(
        &self,
        table: &SqlTable,
        file: &FlatFile,
        staging: &BlobStaging,
        blob_name: &str,
    ) -> Result<()> {
        let sas = staging.mint_sas()?;
        let blob_url = staging.account.blob_url(&staging.container, blob_name)?;
        let statement = CopyIntoStatement {
            table,
            blob_url: &blob_url,
            blob_name,
            sas: &sas,
            field_terminator: file.delimiter,
        }
        .to_string();

        info!(blob = %blob_url, sas_expiry = %sas.expiry(), "Loading staged blob");
        // the statement carries the SAS, keep it out of failure messages
        self.sqlcmd(&table.server, &table.database, &statement, &table.auth)
            .await
            .map_err(|error| Redactor::new(Some(sas.token())).redact_error(error))?;

        Ok(())
    }
}
