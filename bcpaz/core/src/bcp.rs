//! Direct loads through the `bcp` bulk copy utility

use std::num::NonZeroUsize;
use std::path::Path;

use tracing::{info, instrument};

use crate::error::{Error, Result};
use crate::format_file::FormatFile;
use crate::loader::BulkLoader;
use crate::model::{Auth, FlatFile, SqlTable};

pub const BCP_PROGRAM: &str = "bcp";

/// Arguments for `bcp <schema>.<table> IN <file> ...`
pub(crate) fn bcp_args(
    table: &SqlTable,
    file: &FlatFile,
    format_file: &Path,
    batch_size: NonZeroUsize,
) -> Vec<String> {
    let mut args = vec![
        table.qualified_name(),
        "IN".to_string(),
        file.path.display().to_string(),
        "-f".to_string(),
        format_file.display().to_string(),
        "-S".to_string(),
        table.server.clone(),
        "-d".to_string(),
        table.database.clone(),
        "-b".to_string(),
        batch_size.to_string(),
    ];

    match &table.auth {
        Auth::Integrated => args.push("-T".to_string()),
        Auth::Credentials { username, password } => {
            args.extend(["-U".to_string(), username.clone()]);
            args.extend(["-P".to_string(), password.clone()]);
        }
    }

    // start at row 2, keep quoted identifiers and nulls
    if file.file_has_header_line {
        args.extend(["-F", "2", "-q", "-k"].map(String::from));
    }

    args
}

impl BulkLoader {
    /// Bulk copy `file` into `table`, sending `batch_size` rows per batch.
    ///
    /// Errors have the table password replaced by its SHA-512 digest.
    #[instrument(
        skip_all,
        fields(table = %table.qualified_name(), file = %file.path.display()),
        err
    )]
    pub async fn bcp(
        &self,
        table: &SqlTable,
        file: &FlatFile,
        batch_size: NonZeroUsize,
    ) -> Result<()> {
        self.run_bcp(table, file, batch_size)
            .await
            .map_err(|error| table.auth.redactor().redact_error(error))
    }

    async fn run_bcp(
        &self,
        table: &SqlTable,
        file: &FlatFile,
        batch_size: NonZeroUsize,
    ) -> Result<()> {
        let format_file = FormatFile::for_flat_file(file).await?;
        let args = bcp_args(table, file, format_file.path(), batch_size);

        let output = self.run(BCP_PROGRAM, &args).await?;
        if !output.success() {
            return Err(Error::BulkCopy(output.to_string()));
        }

        info!(batch_size = batch_size.get(), "Bulk copy finished");
        Ok(())
    }
}
